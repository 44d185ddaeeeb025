//! Blended win-probability model.
//!
//! Two independent estimators are mixed: a historical model built from win
//! rates (head-to-head, recent momentum, lifetime) and a skill model from
//! the current Gaussian ratings. Each component degrades to 0.5 when it
//! has no data, so predictions stay sane for new players.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::logging::{self, obj, v_num, Domain, Level};
use crate::processor::MatchProcessor;

const H2H_WEIGHT: f64 = 0.4;
const MOMENTUM_WEIGHT: f64 = 0.4;
const GROSS_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub player1_id: i64,
    pub player1_name: String,
    pub player2_id: i64,
    pub player2_name: String,
    /// Historical model: h2h + momentum + lifetime win rates.
    pub model_historical: f64,
    /// Skill model: win probability from current ratings.
    pub model_skill: f64,
    pub hist_weight: f64,
    pub skill_weight: f64,
    pub p1_win_probability: f64,
}

impl Prediction {
    pub fn p2_win_probability(&self) -> f64 {
        1.0 - self.p1_win_probability
    }
}

pub fn predict(proc: &MatchProcessor, cfg: &Config, p1_id: i64, p2_id: i64) -> Result<Prediction> {
    let p1 = proc.player(p1_id)?;
    let p2 = proc.player(p2_id)?;

    let gross = ratio(
        proc.overall_win_rate(p1_id)?,
        proc.overall_win_rate(p2_id)?,
    );
    let momentum = ratio(
        proc.recent_win_rate(p1_id, cfg.form_lookback)?,
        proc.recent_win_rate(p2_id, cfg.form_lookback)?,
    );
    let h2h = proc.h2h_win_rate(p1_id, p2_id)?;

    let historical = H2H_WEIGHT * h2h + MOMENTUM_WEIGHT * momentum + GROSS_WEIGHT * gross;
    let skill = proc
        .rating_config()
        .win_probability(p1.rating(), p2.rating());
    let blended = (cfg.hist_weight * historical + cfg.skill_weight * skill).clamp(0.0, 1.0);

    logging::log(
        Level::Debug,
        Domain::Predict,
        "prediction",
        obj(&[
            ("player1_id", json!(p1_id)),
            ("player2_id", json!(p2_id)),
            ("historical", v_num(historical)),
            ("skill", v_num(skill)),
            ("blended", v_num(blended)),
        ]),
    );

    Ok(Prediction {
        player1_id: p1_id,
        player1_name: p1.name,
        player2_id: p2_id,
        player2_name: p2.name,
        model_historical: historical,
        model_skill: skill,
        hist_weight: cfg.hist_weight,
        skill_weight: cfg.skill_weight,
        p1_win_probability: blended,
    })
}

/// Compare two rates as a share; 0.5 when both are zero.
fn ratio(x: f64, y: f64) -> f64 {
    if x + y == 0.0 { 0.5 } else { x / (x + y) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::RatingConfig;
    use crate::store::RankStore;

    fn setup() -> (MatchProcessor, Config) {
        let mut store = RankStore::open_in_memory().unwrap();
        store.init().unwrap();
        let proc = MatchProcessor::new(store, RatingConfig::default());
        let cfg = Config::from_env();
        (proc, cfg)
    }

    #[test]
    fn test_ratio_degrades_to_even() {
        assert_eq!(ratio(0.0, 0.0), 0.5);
        assert_eq!(ratio(1.0, 0.0), 1.0);
        assert_eq!(ratio(0.25, 0.75), 0.25);
    }

    #[test]
    fn test_fresh_players_are_even() {
        let (mut proc, cfg) = setup();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        let p = predict(&proc, &cfg, p1.id, p2.id).unwrap();
        assert!((p.model_historical - 0.5).abs() < 1e-9);
        assert!((p.model_skill - 0.5).abs() < 1e-9);
        assert!((p.p1_win_probability - 0.5).abs() < 1e-9);
        assert!((p.p2_win_probability() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_winner_is_favored() {
        let (mut proc, cfg) = setup();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        for _ in 0..4 {
            proc.record_match(p1.id, p2.id, 11, 5).unwrap();
        }
        let p = predict(&proc, &cfg, p1.id, p2.id).unwrap();
        assert!(p.p1_win_probability > 0.6, "was {}", p.p1_win_probability);
        let q = predict(&proc, &cfg, p2.id, p1.id).unwrap();
        assert!(q.p1_win_probability < 0.4, "was {}", q.p1_win_probability);
    }

    #[test]
    fn test_unknown_player_errors() {
        let (mut proc, cfg) = setup();
        let p1 = proc.add_player("A").unwrap();
        assert!(predict(&proc, &cfg, p1.id, 999).is_err());
    }

    #[test]
    fn test_probability_in_unit_interval() {
        let (mut proc, cfg) = setup();
        let p1 = proc.add_player("A").unwrap();
        let p2 = proc.add_player("B").unwrap();
        for _ in 0..10 {
            proc.record_match(p1.id, p2.id, 11, 1).unwrap();
        }
        let p = predict(&proc, &cfg, p1.id, p2.id).unwrap();
        assert!(p.p1_win_probability >= 0.0 && p.p1_win_probability <= 1.0);
    }
}
