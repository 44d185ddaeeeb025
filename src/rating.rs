//! Two-player Gaussian skill ratings.
//!
//! Each player carries a belief N(mu, sigma^2) about their skill. A match
//! outcome shifts both beliefs toward the observed result and shrinks the
//! uncertainty; the shift is larger when the ratings were uncertain or the
//! outcome was surprising. Draws do not occur in this league, so the update
//! has no draw margin.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MU: f64 = 25.0;
pub const DEFAULT_SIGMA: f64 = 25.0 / 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone)]
pub struct RatingConfig {
    pub mu0: f64,
    pub sigma0: f64,
    /// Performance variance per game: how much a single result can deviate
    /// from true skill.
    pub beta: f64,
    /// Dynamics noise added before each update, keeping ratings mobile.
    pub tau: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            mu0: DEFAULT_MU,
            sigma0: DEFAULT_SIGMA,
            beta: DEFAULT_SIGMA / 2.0,
            tau: DEFAULT_SIGMA / 100.0,
        }
    }
}

impl RatingConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            mu0: std::env::var("MU0").ok().and_then(|v| v.parse().ok()).unwrap_or(d.mu0),
            sigma0: std::env::var("SIGMA0").ok().and_then(|v| v.parse().ok()).unwrap_or(d.sigma0),
            beta: std::env::var("BETA").ok().and_then(|v| v.parse().ok()).unwrap_or(d.beta),
            tau: std::env::var("TAU").ok().and_then(|v| v.parse().ok()).unwrap_or(d.tau),
        }
    }

    pub fn default_rating(&self) -> Rating {
        Rating { mu: self.mu0, sigma: self.sigma0 }
    }

    /// Update both ratings after a decisive game. Returns (winner, loser).
    pub fn rate_1vs1(&self, winner: Rating, loser: Rating) -> (Rating, Rating) {
        let var_w = winner.sigma * winner.sigma + self.tau * self.tau;
        let var_l = loser.sigma * loser.sigma + self.tau * self.tau;
        let c2 = 2.0 * self.beta * self.beta + var_w + var_l;
        let c = c2.sqrt();

        let t = (winner.mu - loser.mu) / c;
        let v = mean_shift(t);
        let w = v * (v + t);

        let new_winner = Rating {
            mu: winner.mu + var_w / c * v,
            sigma: (var_w * (1.0 - var_w / c2 * w)).sqrt(),
        };
        let new_loser = Rating {
            mu: loser.mu - var_l / c * v,
            sigma: (var_l * (1.0 - var_l / c2 * w)).sqrt(),
        };
        (new_winner, new_loser)
    }

    /// Probability that `a` beats `b`, from current beliefs only.
    pub fn win_probability(&self, a: Rating, b: Rating) -> f64 {
        let delta = a.mu - b.mu;
        let denom = (2.0 * self.beta * self.beta + a.sigma * a.sigma + b.sigma * b.sigma).sqrt();
        if denom.abs() < 1e-9 {
            return 0.5;
        }
        1.0 / (1.0 + (-delta / denom).exp())
    }
}

/// v(t) = pdf(t) / cdf(t): expected shift of a truncated Gaussian.
/// Falls back to the asymptote -t when cdf(t) underflows.
fn mean_shift(t: f64) -> f64 {
    let denom = normal_cdf(t);
    if denom < 1e-12 {
        -t
    } else {
        normal_pdf(t) / denom
    }
}

fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

// Abramowitz & Stegun 7.1.26, |error| < 1.5e-7.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * z);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    let approx = poly * (-z * z).exp();
    if x >= 0.0 { approx } else { 2.0 - approx }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_cdf_anchors() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 1e-3);
    }

    #[test]
    fn test_first_match_update() {
        let cfg = RatingConfig::default();
        let (w, l) = cfg.rate_1vs1(cfg.default_rating(), cfg.default_rating());
        // Known values for the default environment with no draw margin.
        assert!((w.mu - 29.2).abs() < 0.1, "winner mu was {}", w.mu);
        assert!((l.mu - 20.8).abs() < 0.1, "loser mu was {}", l.mu);
        assert!((w.sigma - 7.19).abs() < 0.05, "winner sigma was {}", w.sigma);
        assert!((l.sigma - 7.19).abs() < 0.05);
    }

    #[test]
    fn test_update_is_symmetric_around_mean() {
        let cfg = RatingConfig::default();
        let a = Rating { mu: 30.0, sigma: 4.0 };
        let b = Rating { mu: 22.0, sigma: 4.0 };
        let (w1, l1) = cfg.rate_1vs1(a, b);
        // Equal sigmas move by the same amount in opposite directions.
        assert!(((w1.mu - a.mu) + (l1.mu - b.mu)).abs() < 1e-9);
    }

    #[test]
    fn test_sigma_shrinks() {
        let cfg = RatingConfig::default();
        let mut a = cfg.default_rating();
        let mut b = cfg.default_rating();
        for _ in 0..10 {
            let (w, l) = cfg.rate_1vs1(a, b);
            assert!(w.sigma < a.sigma);
            assert!(l.sigma < b.sigma);
            a = w;
            b = l;
        }
    }

    #[test]
    fn test_upset_moves_more_than_expected_win() {
        let cfg = RatingConfig::default();
        let strong = Rating { mu: 35.0, sigma: 3.0 };
        let weak = Rating { mu: 20.0, sigma: 3.0 };
        let (_, expected_loser) = cfg.rate_1vs1(strong, weak);
        let (upset_winner, _) = cfg.rate_1vs1(weak, strong);
        let expected_shift = (weak.mu - expected_loser.mu).abs();
        let upset_shift = (upset_winner.mu - weak.mu).abs();
        assert!(upset_shift > expected_shift);
    }

    #[test]
    fn test_win_probability_even() {
        let cfg = RatingConfig::default();
        let p = cfg.win_probability(cfg.default_rating(), cfg.default_rating());
        assert!((p - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_win_probability_favors_stronger() {
        let cfg = RatingConfig::default();
        let strong = Rating { mu: 32.0, sigma: 2.0 };
        let weak = Rating { mu: 24.0, sigma: 2.0 };
        let p = cfg.win_probability(strong, weak);
        assert!(p > 0.7, "probability was {}", p);
        assert!((cfg.win_probability(weak, strong) - (1.0 - p)).abs() < 1e-9);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("MU0", "1200");
        let cfg = RatingConfig::from_env();
        assert_eq!(cfg.mu0, 1200.0);
        assert_eq!(cfg.sigma0, DEFAULT_SIGMA);
        std::env::remove_var("MU0");
    }
}
