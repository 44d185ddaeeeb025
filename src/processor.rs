//! Match lifecycle: recording, deletion with full replay, and the derived
//! league views (ladder, win/loss table, head-to-head, player stats).
//!
//! Every write path runs in one transaction. Deleting a match replays the
//! whole remaining ledger from default ratings, refreshing the stored
//! pre-match snapshots so the rating history stays consistent with what
//! the chart shows.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::logging::{log_match_recorded, log_rating_update, log_recalculation};
use crate::model::{
    ExtremeOpponent, HeadToHead, HistoryEntry, Match, MatchSummary, OpponentRecord, Player,
    PlayerStats, RatingSample, WinLossRow,
};
use crate::rating::{Rating, RatingConfig};
use crate::store::RankStore;

pub struct MatchProcessor {
    store: RankStore,
    rating: RatingConfig,
}

fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

impl MatchProcessor {
    pub fn new(store: RankStore, rating: RatingConfig) -> Self {
        Self { store, rating }
    }

    pub fn add_player(&mut self, name: &str) -> Result<Player> {
        let r = self.rating.default_rating();
        let now = now_ts();
        self.store
            .conn()
            .execute(
                "INSERT INTO players (name, mu, sigma, last_updated) VALUES (?1, ?2, ?3, ?4)",
                params![name, r.mu, r.sigma, now],
            )
            .with_context(|| format!("failed to create player {:?}", name))?;
        let id = self.store.conn().last_insert_rowid();
        Ok(Player {
            id,
            name: name.to_string(),
            mu: r.mu,
            sigma: r.sigma,
            last_updated: now,
        })
    }

    pub fn player(&self, id: i64) -> Result<Player> {
        fetch_player(self.store.conn(), id)
    }

    pub fn all_players(&self) -> Result<Vec<Player>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT player_id, name, mu, sigma, last_updated FROM players ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], player_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Record a decisive match: snapshot both pre-match ratings, apply the
    /// skill update, and bump the pairwise tally.
    pub fn record_match(&mut self, p1_id: i64, p2_id: i64, score1: i64, score2: i64) -> Result<Match> {
        if score1 == score2 {
            bail!("draws are not allowed");
        }
        if p1_id == p2_id {
            bail!("players must be different");
        }

        let cfg = self.rating.clone();
        let now = now_ts();
        let tx = self.store.conn_mut().transaction()?;

        let p1 = fetch_player(&tx, p1_id)?;
        let p2 = fetch_player(&tx, p2_id)?;

        tx.execute(
            "INSERT INTO matches (timestamp, player1_id, player2_id, player1_score, player2_score)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![now, p1_id, p2_id, score1, score2],
        )?;
        let match_id = tx.last_insert_rowid();

        snapshot_rating(&tx, p1_id, match_id, p1.rating())?;
        snapshot_rating(&tx, p2_id, match_id, p2.rating())?;

        let winner: u8 = if score1 > score2 { 1 } else { 2 };
        let (new1, new2) = apply_outcome(&cfg, p1.rating(), p2.rating(), winner);
        update_player_rating(&tx, p1_id, new1, &now)?;
        update_player_rating(&tx, p2_id, new2, &now)?;
        bump_matchup(&tx, p1_id, p2_id, winner)?;

        tx.commit()?;

        log_match_recorded(match_id, p1_id, p2_id, score1, score2);
        log_rating_update(p1_id, p1.mu, new1.mu, new1.sigma);
        log_rating_update(p2_id, p2.mu, new2.mu, new2.sigma);

        Ok(Match {
            id: match_id,
            player1_id: p1_id,
            player2_id: p2_id,
            score1,
            score2,
            timestamp: now,
        })
    }

    /// Delete a match and rebuild every rating by replaying the remaining
    /// ledger in order.
    pub fn delete_match(&mut self, match_id: i64) -> Result<()> {
        let cfg = self.rating.clone();
        let tx = self.store.conn_mut().transaction()?;

        let found: Option<(i64, i64, i64, i64)> = tx
            .query_row(
                "SELECT player1_id, player2_id, player1_score, player2_score
                 FROM matches WHERE match_id = ?1",
                params![match_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;
        let (p1_id, p2_id, s1, s2) = found.ok_or_else(|| anyhow!("match {} not found", match_id))?;

        let winner: u8 = if s1 > s2 { 1 } else { 2 };
        let (a, b) = ordered_pair(p1_id, p2_id);
        let reversed = p1_id != a;
        let dec_a = i64::from((winner == 1) != reversed);
        let dec_b = 1 - dec_a;
        tx.execute(
            "UPDATE matchups SET matches_played = matches_played - 1,
                 wins_a = wins_a - ?1, wins_b = wins_b - ?2
             WHERE player_a_id = ?3 AND player_b_id = ?4",
            params![dec_a, dec_b, a, b],
        )?;
        tx.execute(
            "DELETE FROM matchups WHERE player_a_id = ?1 AND player_b_id = ?2 AND matches_played <= 0",
            params![a, b],
        )?;

        tx.execute("DELETE FROM ratings_history WHERE match_id = ?1", params![match_id])?;
        tx.execute("DELETE FROM matches WHERE match_id = ?1", params![match_id])?;

        let replayed = recalculate_all(&tx, &cfg)?;
        tx.commit()?;

        log_recalculation(replayed);
        Ok(())
    }

    /// Remove a player along with their matches, then rebuild the ratings
    /// the removed matches had influenced.
    pub fn remove_player(&mut self, player_id: i64) -> Result<()> {
        let cfg = self.rating.clone();
        let tx = self.store.conn_mut().transaction()?;
        fetch_player(&tx, player_id)?;
        tx.execute(
            "DELETE FROM ratings_history WHERE player_id = ?1
                OR match_id IN (SELECT match_id FROM matches
                                WHERE player1_id = ?1 OR player2_id = ?1)",
            params![player_id],
        )?;
        tx.execute("DELETE FROM players WHERE player_id = ?1", params![player_id])?;
        let replayed = recalculate_all(&tx, &cfg)?;
        tx.commit()?;
        log_recalculation(replayed);
        Ok(())
    }

    pub fn clear_all_data(&mut self) -> Result<()> {
        self.store.clear_all()
    }

    /// Players ordered by conservative rating, best first.
    pub fn ladder(&self) -> Result<Vec<Player>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT player_id, name, mu, sigma, last_updated FROM players
             ORDER BY (mu - 3*sigma) DESC",
        )?;
        let rows = stmt.query_map([], player_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn win_loss_table(&self) -> Result<Vec<WinLossRow>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT p.player_id, p.name,
                    COUNT(m.match_id) AS played,
                    COALESCE(SUM(CASE
                        WHEN (m.player1_id = p.player_id AND m.player1_score > m.player2_score)
                          OR (m.player2_id = p.player_id AND m.player2_score > m.player1_score)
                        THEN 1 ELSE 0 END), 0) AS wins,
                    COALESCE(SUM(CASE
                        WHEN (m.player1_id = p.player_id AND m.player1_score < m.player2_score)
                          OR (m.player2_id = p.player_id AND m.player2_score < m.player1_score)
                        THEN 1 ELSE 0 END), 0) AS losses
             FROM players p
             LEFT JOIN matches m
                 ON p.player_id = m.player1_id OR p.player_id = m.player2_id
             GROUP BY p.player_id, p.name",
        )?;
        let rows = stmt.query_map([], |row| {
            let played: i64 = row.get(2)?;
            let wins: i64 = row.get(3)?;
            let win_pct = if played > 0 {
                ((wins as f64 / played as f64) * 1000.0).round() / 10.0
            } else {
                0.0
            };
            Ok(WinLossRow {
                id: row.get(0)?,
                name: row.get(1)?,
                played,
                wins,
                losses: row.get(4)?,
                win_pct,
            })
        })?;
        let mut table = Vec::new();
        for row in rows {
            table.push(row?);
        }
        table.sort_by(|x, y| {
            y.win_pct
                .partial_cmp(&x.win_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(y.wins.cmp(&x.wins))
                .then(y.played.cmp(&x.played))
        });
        Ok(table)
    }

    /// Pairwise tally, reported in the order the ids were passed.
    pub fn head_to_head(&self, p1_id: i64, p2_id: i64) -> Result<HeadToHead> {
        let (a, b) = ordered_pair(p1_id, p2_id);
        let row: Option<(i64, i64, i64)> = self
            .store
            .conn()
            .query_row(
                "SELECT matches_played, wins_a, wins_b FROM matchups
                 WHERE player_a_id = ?1 AND player_b_id = ?2",
                params![a, b],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (total, wins_a, wins_b) = row.unwrap_or((0, 0, 0));
        let (wins_p1, wins_p2) = if p1_id == a { (wins_a, wins_b) } else { (wins_b, wins_a) };
        Ok(HeadToHead { total_matches: total, wins_p1, wins_p2 })
    }

    pub fn recent_matches(&self, limit: usize) -> Result<Vec<MatchSummary>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT m.timestamp, p1.name, m.player1_score, p2.name, m.player2_score
             FROM matches m
             JOIN players p1 ON m.player1_id = p1.player_id
             JOIN players p2 ON m.player2_id = p2.player_id
             ORDER BY m.timestamp DESC, m.match_id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(MatchSummary {
                timestamp: row.get(0)?,
                player1: row.get(1)?,
                score1: row.get(2)?,
                player2: row.get(3)?,
                score2: row.get(4)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Full match log for one player, newest first, with the outcome seen
    /// from that player's side.
    pub fn match_history(&self, player_id: i64) -> Result<Vec<HistoryEntry>> {
        self.history_query(player_id, None)
    }

    /// Last `n` results for one player, newest first. True means a win.
    pub fn recent_form(&self, player_id: i64, n: usize) -> Result<Vec<bool>> {
        let entries = self.history_query(player_id, Some(n))?;
        Ok(entries.into_iter().map(|e| e.won).collect())
    }

    fn history_query(&self, player_id: i64, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        let sql = format!(
            "SELECT m.timestamp, p1.player_id, p1.name, m.player1_score,
                    p2.player_id, p2.name, m.player2_score
             FROM matches m
             JOIN players p1 ON m.player1_id = p1.player_id
             JOIN players p2 ON m.player2_id = p2.player_id
             WHERE m.player1_id = ?1 OR m.player2_id = ?1
             ORDER BY m.timestamp DESC, m.match_id DESC{}",
            match limit {
                Some(n) => format!(" LIMIT {}", n),
                None => String::new(),
            }
        );
        let mut stmt = self.store.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![player_id], |row| {
            let p1_id: i64 = row.get(1)?;
            let s1: i64 = row.get(3)?;
            let s2: i64 = row.get(6)?;
            Ok(HistoryEntry {
                timestamp: row.get(0)?,
                player1: row.get(2)?,
                score1: s1,
                player2: row.get(5)?,
                score2: s2,
                won: if p1_id == player_id { s1 > s2 } else { s2 > s1 },
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn player_stats(&self, player_id: i64) -> Result<PlayerStats> {
        let conn = self.store.conn();
        let player = fetch_player(conn, player_id)?;

        let peak: Option<f64> = conn.query_row(
            "SELECT MAX(mu) FROM ratings_history WHERE player_id = ?1",
            params![player_id],
            |row| row.get(0),
        )?;
        let peak_rating = peak.unwrap_or(player.mu);

        let (total, wins, losses) = self.win_loss_counts(player_id)?;

        let mut opponents = self.opponent_records(player_id)?;
        opponents.sort_by(|x, y| {
            y.win_rate
                .partial_cmp(&x.win_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(y.matches.cmp(&x.matches))
                .then(x.name.cmp(&y.name))
        });
        let victim = extreme_opponent(&opponents);
        opponents.sort_by(|x, y| {
            x.win_rate
                .partial_cmp(&y.win_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(y.matches.cmp(&x.matches))
                .then(x.name.cmp(&y.name))
        });
        let nemesis = extreme_opponent(&opponents);

        Ok(PlayerStats {
            player,
            peak_rating,
            total_matches: total,
            wins,
            losses,
            victim,
            nemesis,
        })
    }

    fn win_loss_counts(&self, player_id: i64) -> Result<(i64, i64, i64)> {
        let row = self.store.conn().query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE
                        WHEN (player1_id = ?1 AND player1_score > player2_score)
                          OR (player2_id = ?1 AND player2_score > player1_score)
                        THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE
                        WHEN (player1_id = ?1 AND player1_score < player2_score)
                          OR (player2_id = ?1 AND player2_score < player1_score)
                        THEN 1 ELSE 0 END), 0)
             FROM matches
             WHERE player1_id = ?1 OR player2_id = ?1",
            params![player_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(row)
    }

    fn opponent_records(&self, player_id: i64) -> Result<Vec<OpponentRecord>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT CASE WHEN m.player1_id = ?1 THEN m.player2_id ELSE m.player1_id END AS opponent_id,
                    p.name,
                    COUNT(*) AS matches,
                    SUM(CASE
                        WHEN (m.player1_id = ?1 AND m.player1_score > m.player2_score)
                          OR (m.player2_id = ?1 AND m.player2_score > m.player1_score)
                        THEN 1 ELSE 0 END) AS wins,
                    SUM(CASE
                        WHEN (m.player1_id = ?1 AND m.player1_score < m.player2_score)
                          OR (m.player2_id = ?1 AND m.player2_score < m.player1_score)
                        THEN 1 ELSE 0 END) AS losses
             FROM matches m
             JOIN players p ON p.player_id =
                 CASE WHEN m.player1_id = ?1 THEN m.player2_id ELSE m.player1_id END
             WHERE ?1 IN (m.player1_id, m.player2_id)
             GROUP BY opponent_id, p.name",
        )?;
        let rows = stmt.query_map(params![player_id], |row| {
            let matches: i64 = row.get(2)?;
            let wins: i64 = row.get(3)?;
            Ok(OpponentRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                matches,
                wins,
                losses: row.get(4)?,
                win_rate: if matches > 0 { wins as f64 / matches as f64 } else { 0.0 },
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// The chart feed: pre-match snapshots numbered in match order, then
    /// the current rating as the final point.
    pub fn rating_history(&self, player_id: i64) -> Result<Vec<RatingSample>> {
        let player = self.player(player_id)?;
        let mut stmt = self.store.conn().prepare(
            "SELECT mu, sigma FROM ratings_history WHERE player_id = ?1 ORDER BY match_id ASC",
        )?;
        let rows = stmt.query_map(params![player_id], |row| {
            Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?))
        })?;
        let mut samples = Vec::new();
        for row in rows {
            let (mu, sigma) = row?;
            samples.push(RatingSample {
                match_no: samples.len() as u32 + 1,
                mu,
                sigma,
            });
        }
        samples.push(RatingSample {
            match_no: samples.len() as u32 + 1,
            mu: player.mu,
            sigma: player.sigma,
        });
        Ok(samples)
    }

    // Prediction inputs -----------------------------------------------------

    /// Lifetime win rate; 0.0 with no matches on record.
    pub fn overall_win_rate(&self, player_id: i64) -> Result<f64> {
        let (total, wins, _) = self.win_loss_counts(player_id)?;
        Ok(if total > 0 { wins as f64 / total as f64 } else { 0.0 })
    }

    /// Wins in the last `n` matches over `n`, so sparse recent play reads
    /// as weak momentum.
    pub fn recent_win_rate(&self, player_id: i64, n: usize) -> Result<f64> {
        if n == 0 {
            return Ok(0.0);
        }
        let form = self.recent_form(player_id, n)?;
        let wins = form.iter().filter(|w| **w).count();
        Ok(wins as f64 / n as f64)
    }

    /// Head-to-head win rate for p1; 0.5 when the pair has never played.
    pub fn h2h_win_rate(&self, p1_id: i64, p2_id: i64) -> Result<f64> {
        let h2h = self.head_to_head(p1_id, p2_id)?;
        Ok(if h2h.total_matches > 0 {
            h2h.wins_p1 as f64 / h2h.total_matches as f64
        } else {
            0.5
        })
    }

    pub fn rating_config(&self) -> &RatingConfig {
        &self.rating
    }
}

// ---------------------------------------------------------------------------
// Row helpers shared by reads and transactional writes
// ---------------------------------------------------------------------------

fn player_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        mu: row.get(2)?,
        sigma: row.get(3)?,
        last_updated: row.get(4)?,
    })
}

fn fetch_player(conn: &Connection, id: i64) -> Result<Player> {
    conn.query_row(
        "SELECT player_id, name, mu, sigma, last_updated FROM players WHERE player_id = ?1",
        params![id],
        player_from_row,
    )
    .optional()?
    .ok_or_else(|| anyhow!("player {} not found", id))
}

fn snapshot_rating(conn: &Connection, player_id: i64, match_id: i64, r: Rating) -> Result<()> {
    conn.execute(
        "INSERT INTO ratings_history (player_id, match_id, mu, sigma) VALUES (?1, ?2, ?3, ?4)",
        params![player_id, match_id, r.mu, r.sigma],
    )?;
    Ok(())
}

fn update_player_rating(conn: &Connection, id: i64, r: Rating, now: &str) -> Result<()> {
    conn.execute(
        "UPDATE players SET mu = ?1, sigma = ?2, last_updated = ?3 WHERE player_id = ?4",
        params![r.mu, r.sigma, now, id],
    )?;
    Ok(())
}

fn ordered_pair(p1: i64, p2: i64) -> (i64, i64) {
    if p1 < p2 { (p1, p2) } else { (p2, p1) }
}

fn bump_matchup(conn: &Connection, p1: i64, p2: i64, winner: u8) -> Result<()> {
    let (a, b) = ordered_pair(p1, p2);
    let reversed = p1 != a;
    let win_a = i64::from((winner == 1) != reversed);
    let win_b = 1 - win_a;
    conn.execute(
        "INSERT INTO matchups (player_a_id, player_b_id, matches_played, wins_a, wins_b)
         VALUES (?1, ?2, 1, ?3, ?4)
         ON CONFLICT(player_a_id, player_b_id) DO UPDATE SET
             matches_played = matches_played + 1,
             wins_a = wins_a + excluded.wins_a,
             wins_b = wins_b + excluded.wins_b",
        params![a, b, win_a, win_b],
    )?;
    Ok(())
}

/// Apply a result given in (player1, player2) order; `winner` is 1 or 2.
fn apply_outcome(cfg: &RatingConfig, r1: Rating, r2: Rating, winner: u8) -> (Rating, Rating) {
    if winner == 1 {
        cfg.rate_1vs1(r1, r2)
    } else {
        let (w, l) = cfg.rate_1vs1(r2, r1);
        (l, w)
    }
}

/// Reset every player to the default rating and replay all matches in
/// order, rewriting the pre-match snapshots as it goes. Returns the number
/// of matches replayed.
fn recalculate_all(conn: &Connection, cfg: &RatingConfig) -> Result<usize> {
    let now = now_ts();
    conn.execute(
        "UPDATE players SET mu = ?1, sigma = ?2, last_updated = ?3",
        params![cfg.mu0, cfg.sigma0, now],
    )?;

    let mut stmt = conn.prepare(
        "SELECT match_id, player1_id, player2_id, player1_score, player2_score
         FROM matches ORDER BY timestamp ASC, match_id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, i64>(4)?,
        ))
    })?;
    let mut matches = Vec::new();
    for row in rows {
        matches.push(row?);
    }
    drop(stmt);

    for (match_id, p1_id, p2_id, s1, s2) in &matches {
        let p1 = fetch_player(conn, *p1_id)?;
        let p2 = fetch_player(conn, *p2_id)?;
        conn.execute(
            "UPDATE ratings_history SET mu = ?1, sigma = ?2 WHERE match_id = ?3 AND player_id = ?4",
            params![p1.mu, p1.sigma, match_id, p1_id],
        )?;
        conn.execute(
            "UPDATE ratings_history SET mu = ?1, sigma = ?2 WHERE match_id = ?3 AND player_id = ?4",
            params![p2.mu, p2.sigma, match_id, p2_id],
        )?;
        let winner: u8 = if s1 > s2 { 1 } else { 2 };
        let (n1, n2) = apply_outcome(cfg, p1.rating(), p2.rating(), winner);
        update_player_rating(conn, *p1_id, n1, &now)?;
        update_player_rating(conn, *p2_id, n2, &now)?;
    }
    Ok(matches.len())
}

fn extreme_opponent(sorted: &[OpponentRecord]) -> ExtremeOpponent {
    let Some(top) = sorted.first() else {
        return ExtremeOpponent { name: "N/A".to_string(), rate: 0.0 };
    };
    let tied: Vec<&OpponentRecord> = sorted
        .iter()
        .filter(|o| o.win_rate == top.win_rate && o.matches == top.matches)
        .collect();
    if tied.len() > 1 {
        let mut names = tied
            .iter()
            .take(3)
            .map(|o| o.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if tied.len() > 3 {
            names.push_str(&format!(" (+{} more)", tied.len() - 3));
        }
        ExtremeOpponent { name: format!("Tied between {}", names), rate: top.win_rate }
    } else {
        ExtremeOpponent { name: top.name.clone(), rate: top.win_rate }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{DEFAULT_MU, DEFAULT_SIGMA};

    fn processor() -> MatchProcessor {
        let mut store = RankStore::open_in_memory().unwrap();
        store.init().unwrap();
        MatchProcessor::new(store, RatingConfig::default())
    }

    #[test]
    fn test_new_player_defaults() {
        let mut proc = processor();
        let p = proc.add_player("Test Player").unwrap();
        assert_eq!(p.name, "Test Player");
        assert!((p.mu - DEFAULT_MU).abs() < 0.1);
        assert!((p.sigma - DEFAULT_SIGMA).abs() < 0.1);
        assert_eq!(proc.all_players().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut proc = processor();
        proc.add_player("Dup").unwrap();
        assert!(proc.add_player("Dup").is_err());
    }

    #[test]
    fn test_record_match_updates_ratings() {
        let mut proc = processor();
        let p1 = proc.add_player("Player 1").unwrap();
        let p2 = proc.add_player("Player 2").unwrap();

        let m = proc.record_match(p1.id, p2.id, 21, 19).unwrap();
        assert_eq!(m.score1, 21);
        assert_eq!(m.score2, 19);
        assert_eq!(m.winner(), 1);

        let w = proc.player(p1.id).unwrap();
        let l = proc.player(p2.id).unwrap();
        assert!(w.mu > DEFAULT_MU);
        assert!(l.mu < DEFAULT_MU);
        assert!(w.sigma < DEFAULT_SIGMA);
        assert!(l.sigma < DEFAULT_SIGMA);
    }

    #[test]
    fn test_record_match_snapshots_pre_match_ratings() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        proc.record_match(p1.id, p2.id, 11, 5).unwrap();

        let hist = proc.rating_history(p1.id).unwrap();
        // First point is the pre-match default, last is the current rating.
        assert_eq!(hist.len(), 2);
        assert!((hist[0].mu - DEFAULT_MU).abs() < 1e-9);
        assert!(hist[1].mu > DEFAULT_MU);
        assert_eq!(hist[0].match_no, 1);
        assert_eq!(hist[1].match_no, 2);
    }

    #[test]
    fn test_matchup_tally() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        proc.record_match(p1.id, p2.id, 11, 5).unwrap();
        proc.record_match(p2.id, p1.id, 11, 7).unwrap();

        let h2h = proc.head_to_head(p1.id, p2.id).unwrap();
        assert_eq!(h2h.total_matches, 2);
        assert_eq!(h2h.wins_p1, 1);
        assert_eq!(h2h.wins_p2, 1);

        // Argument order flips the report, not the data.
        let flipped = proc.head_to_head(p2.id, p1.id).unwrap();
        assert_eq!(flipped.wins_p1, 1);
        assert_eq!(flipped.wins_p2, 1);
    }

    #[test]
    fn test_draws_rejected() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        assert!(proc.record_match(p1.id, p2.id, 11, 11).is_err());
    }

    #[test]
    fn test_self_play_rejected() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        assert!(proc.record_match(p1.id, p1.id, 11, 5).is_err());
    }

    #[test]
    fn test_unknown_player_rejected() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        assert!(proc.record_match(p1.id, 999, 11, 5).is_err());
    }

    #[test]
    fn test_delete_match_restores_defaults() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        let m = proc.record_match(p1.id, p2.id, 11, 5).unwrap();

        proc.delete_match(m.id).unwrap();

        let a = proc.player(p1.id).unwrap();
        let b = proc.player(p2.id).unwrap();
        assert!((a.mu - DEFAULT_MU).abs() < 1e-9);
        assert!((b.mu - DEFAULT_MU).abs() < 1e-9);
        assert_eq!(proc.head_to_head(p1.id, p2.id).unwrap().total_matches, 0);
        // Only the current-rating point remains.
        assert_eq!(proc.rating_history(p1.id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_match_replays_remaining() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        let first = proc.record_match(p1.id, p2.id, 11, 5).unwrap();
        proc.record_match(p1.id, p2.id, 11, 7).unwrap();

        proc.delete_match(first.id).unwrap();

        // Equivalent to having played only the second match from scratch.
        let mut fresh = processor();
        let q1 = fresh.add_player("A").unwrap();
        let q2 = fresh.add_player("B").unwrap();
        fresh.record_match(q1.id, q2.id, 11, 7).unwrap();

        let got = proc.player(p1.id).unwrap();
        let want = fresh.player(q1.id).unwrap();
        assert!((got.mu - want.mu).abs() < 1e-9);
        assert!((got.sigma - want.sigma).abs() < 1e-9);

        // Snapshots were rewritten to match the replay.
        let hist = proc.rating_history(p1.id).unwrap();
        assert_eq!(hist.len(), 2);
        assert!((hist[0].mu - DEFAULT_MU).abs() < 1e-9);
    }

    #[test]
    fn test_delete_unknown_match() {
        let mut proc = processor();
        assert!(proc.delete_match(42).is_err());
    }

    #[test]
    fn test_ladder_orders_by_conservative_rating() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        let p3 = proc.add_player("C").unwrap();
        proc.record_match(p1.id, p2.id, 11, 3).unwrap();
        proc.record_match(p1.id, p3.id, 11, 4).unwrap();

        let ladder = proc.ladder().unwrap();
        assert_eq!(ladder[0].id, p1.id);
        for pair in ladder.windows(2) {
            assert!(pair[0].conservative() >= pair[1].conservative());
        }
    }

    #[test]
    fn test_win_loss_table() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        proc.add_player("C").unwrap();
        proc.record_match(p1.id, p2.id, 11, 5).unwrap();
        proc.record_match(p1.id, p2.id, 11, 9).unwrap();

        let table = proc.win_loss_table().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].name, "A");
        assert_eq!(table[0].wins, 2);
        assert_eq!(table[0].win_pct, 100.0);
        assert_eq!(table[1].name, "B");
        assert_eq!(table[1].losses, 2);
        // Idle player sorts last with zero percent.
        assert_eq!(table[2].name, "C");
        assert_eq!(table[2].played, 0);
        assert_eq!(table[2].win_pct, 0.0);
    }

    #[test]
    fn test_match_history_sides() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        proc.record_match(p1.id, p2.id, 11, 5).unwrap();
        proc.record_match(p2.id, p1.id, 11, 5).unwrap();

        let hist = proc.match_history(p1.id).unwrap();
        assert_eq!(hist.len(), 2);
        // Newest first: A lost the second match, won the first.
        assert!(!hist[0].won);
        assert!(hist[1].won);

        let form = proc.recent_form(p1.id, 5).unwrap();
        assert_eq!(form, vec![false, true]);
    }

    #[test]
    fn test_player_stats_victim_and_nemesis() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        let p3 = proc.add_player("C").unwrap();
        // A always beats B, always loses to C.
        proc.record_match(p1.id, p2.id, 11, 2).unwrap();
        proc.record_match(p1.id, p2.id, 11, 4).unwrap();
        proc.record_match(p3.id, p1.id, 11, 6).unwrap();

        let stats = proc.player_stats(p1.id).unwrap();
        assert_eq!(stats.total_matches, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.victim.name, "B");
        assert!((stats.victim.rate - 1.0).abs() < 1e-9);
        assert_eq!(stats.nemesis.name, "C");
        assert!((stats.nemesis.rate - 0.0).abs() < 1e-9);
        assert!(stats.peak_rating >= DEFAULT_MU);
    }

    #[test]
    fn test_player_stats_tied_opponents() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        let p3 = proc.add_player("C").unwrap();
        proc.record_match(p1.id, p2.id, 11, 2).unwrap();
        proc.record_match(p1.id, p3.id, 11, 2).unwrap();

        let stats = proc.player_stats(p1.id).unwrap();
        assert!(stats.victim.name.starts_with("Tied between"));
    }

    #[test]
    fn test_rating_history_order_preserved() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        for _ in 0..3 {
            proc.record_match(p1.id, p2.id, 11, 5).unwrap();
        }
        let hist = proc.rating_history(p1.id).unwrap();
        assert_eq!(hist.len(), 4);
        let numbers: Vec<u32> = hist.iter().map(|s| s.match_no).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        // Winner's trajectory is nondecreasing.
        for pair in hist.windows(2) {
            assert!(pair[1].mu >= pair[0].mu);
        }
    }

    #[test]
    fn test_remove_player_cleans_up() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        proc.record_match(p1.id, p2.id, 11, 5).unwrap();

        proc.remove_player(p2.id).unwrap();
        assert!(proc.player(p2.id).is_err());
        // A's matches against B are gone; rating back at default.
        let a = proc.player(p1.id).unwrap();
        assert!((a.mu - DEFAULT_MU).abs() < 1e-9);
        assert!(proc.match_history(p1.id).unwrap().is_empty());
    }

    #[test]
    fn test_clear_all_data() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        proc.record_match(p1.id, p2.id, 11, 5).unwrap();
        proc.clear_all_data().unwrap();
        assert!(proc.all_players().unwrap().is_empty());
        assert!(proc.recent_matches(10).unwrap().is_empty());
    }

    #[test]
    fn test_prediction_inputs() {
        let mut proc = processor();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        assert_eq!(proc.overall_win_rate(p1.id).unwrap(), 0.0);
        assert_eq!(proc.h2h_win_rate(p1.id, p2.id).unwrap(), 0.5);

        proc.record_match(p1.id, p2.id, 11, 5).unwrap();
        assert_eq!(proc.overall_win_rate(p1.id).unwrap(), 1.0);
        assert_eq!(proc.h2h_win_rate(p1.id, p2.id).unwrap(), 1.0);
        assert_eq!(proc.h2h_win_rate(p2.id, p1.id).unwrap(), 0.0);
        // Momentum divides by the lookback, not matches played.
        assert_eq!(proc.recent_win_rate(p1.id, 5).unwrap(), 0.2);
    }
}
