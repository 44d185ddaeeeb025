//! Runtime configuration, resolved once from the environment.

use crate::rating::RatingConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub out_dir: String,
    /// Rows shown on the recent-matches views.
    pub recent_limit: usize,
    /// Matches considered by the momentum component of predictions.
    pub form_lookback: usize,
    pub hist_weight: f64,
    pub skill_weight: f64,
    pub rating: RatingConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("RANKINGS_DB").unwrap_or_else(|_| "./rankings.db".to_string()),
            out_dir: std::env::var("DASHBOARD_DIR").unwrap_or_else(|_| "./site".to_string()),
            recent_limit: std::env::var("RECENT_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            form_lookback: std::env::var("FORM_LOOKBACK").ok().and_then(|v| v.parse().ok()).unwrap_or(5),
            hist_weight: std::env::var("HIST_WEIGHT").ok().and_then(|v| v.parse().ok()).unwrap_or(0.5),
            skill_weight: std::env::var("SKILL_WEIGHT").ok().and_then(|v| v.parse().ok()).unwrap_or(0.5),
            rating: RatingConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_env();
        assert_eq!(cfg.form_lookback, 5);
        assert_eq!(cfg.hist_weight, 0.5);
        assert_eq!(cfg.skill_weight, 0.5);
    }
}
