//! Domain records shared across the store, processor, and dashboard.

use serde::{Deserialize, Serialize};

use crate::rating::Rating;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub mu: f64,
    pub sigma: f64,
    pub last_updated: String,
}

impl Player {
    pub fn rating(&self) -> Rating {
        Rating { mu: self.mu, sigma: self.sigma }
    }

    /// Conservative skill estimate used for ladder ordering.
    pub fn conservative(&self) -> f64 {
        self.mu - 3.0 * self.sigma
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub player1_id: i64,
    pub player2_id: i64,
    pub score1: i64,
    pub score2: i64,
    pub timestamp: String,
}

impl Match {
    /// 1 if player1 won, 2 otherwise. Draws are rejected before a Match exists.
    pub fn winner(&self) -> u8 {
        if self.score1 > self.score2 { 1 } else { 2 }
    }
}

/// One point of a player's rating trajectory, in the wire shape the
/// dashboard embeds and the chart renderer parses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSample {
    #[serde(rename = "match")]
    pub match_no: u32,
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinLossRow {
    pub id: i64,
    pub name: String,
    pub played: i64,
    pub wins: i64,
    pub losses: i64,
    pub win_pct: f64,
}

/// Head-to-head tally, reported in the argument order of the query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeadToHead {
    pub total_matches: i64,
    pub wins_p1: i64,
    pub wins_p2: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub timestamp: String,
    pub player1: String,
    pub score1: i64,
    pub player2: String,
    pub score2: i64,
}

/// A match seen from one player's side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub player1: String,
    pub score1: i64,
    pub player2: String,
    pub score2: i64,
    pub won: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentRecord {
    pub id: i64,
    pub name: String,
    pub matches: i64,
    pub wins: i64,
    pub losses: i64,
    pub win_rate: f64,
}

/// Best-case or worst-case opponent, with ties collapsed into one label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtremeOpponent {
    pub name: String,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player: Player,
    pub peak_rating: f64,
    pub total_matches: i64,
    pub wins: i64,
    pub losses: i64,
    pub victim: ExtremeOpponent,
    pub nemesis: ExtremeOpponent,
}
