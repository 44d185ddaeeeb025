//! SQLite persistence for players, matches, matchup tallies, and rating
//! history snapshots.

use anyhow::Result;
use rusqlite::Connection;

use crate::logging::{self, obj, v_str, Domain, Level};

pub struct RankStore {
    conn: Connection,
}

impl RankStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        logging::log(
            Level::Debug,
            Domain::Store,
            "store_opened",
            obj(&[("path", v_str(path))]),
        );
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS players (
                player_id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                mu REAL NOT NULL,
                sigma REAL NOT NULL,
                last_updated TEXT DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS matches (
                match_id INTEGER PRIMARY KEY,
                timestamp TEXT DEFAULT CURRENT_TIMESTAMP,
                player1_id INTEGER NOT NULL,
                player2_id INTEGER NOT NULL,
                player1_score INTEGER NOT NULL,
                player2_score INTEGER NOT NULL,
                FOREIGN KEY(player1_id) REFERENCES players(player_id) ON DELETE CASCADE,
                FOREIGN KEY(player2_id) REFERENCES players(player_id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS matchups (
                player_a_id INTEGER NOT NULL,
                player_b_id INTEGER NOT NULL,
                matches_played INTEGER DEFAULT 0,
                wins_a INTEGER DEFAULT 0,
                wins_b INTEGER DEFAULT 0,
                PRIMARY KEY (player_a_id, player_b_id),
                FOREIGN KEY(player_a_id) REFERENCES players(player_id) ON DELETE CASCADE,
                FOREIGN KEY(player_b_id) REFERENCES players(player_id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS ratings_history (
                history_id INTEGER PRIMARY KEY,
                player_id INTEGER NOT NULL,
                match_id INTEGER NOT NULL,
                mu REAL NOT NULL,
                sigma REAL NOT NULL,
                FOREIGN KEY(player_id) REFERENCES players(player_id),
                FOREIGN KEY(match_id) REFERENCES matches(match_id)
            );
            COMMIT;",
        )?;
        Ok(())
    }

    /// Drop every row from every table. Order matters for foreign keys.
    pub fn clear_all(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            DELETE FROM ratings_history;
            DELETE FROM matches;
            DELETE FROM matchups;
            DELETE FROM players;
            COMMIT;",
        )?;
        logging::log(Level::Warn, Domain::Store, "store_cleared", obj(&[]));
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let mut store = RankStore::open_in_memory().unwrap();
        store.init().unwrap();
        store.init().unwrap();
        let n: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM players", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let mut store = RankStore::open_in_memory().unwrap();
        store.init().unwrap();
        let fk: i64 = store
            .conn()
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_clear_all_on_empty() {
        let mut store = RankStore::open_in_memory().unwrap();
        store.init().unwrap();
        store.clear_all().unwrap();
    }
}
