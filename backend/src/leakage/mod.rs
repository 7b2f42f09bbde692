//! Biological clearance of Pb212
//!
//! Pb212 that has come to rest outside the seed is removed by vascular
//! clearance with a single exponential process. The clearance half-life
//! defaults to 10.64 h, equal to the Pb212 physical half-life, which yields a
//! 50% leakage overall (Phys. Med. Biol. 65 (2020)).
//!
//! The survival probability after a local time `t` is
//! `p = exp(−ln2 / T½ · t)`. One uniform sample `u` is drawn per decision and
//! the ion leaks iff `p <= u`.

use crate::rng::UniformSource;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use thiserror::Error;

/// Default clearance half-life (hours)
pub const DEFAULT_HALF_LIFE_HOURS: f64 = 10.64;

/// Rejected model parameters
#[derive(Debug, Error, PartialEq)]
pub enum LeakageError {
    #[error("Clearance half-life must be positive and finite, got {0} s")]
    InvalidHalfLife(f64),
}

/// Outcome of one clearance decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeakageDecision {
    /// Cleared: kill the track and its secondaries
    Leak,
    /// Stays in place: keep tracking
    Retain,
}

/// Details of a decision, kept for the event log
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeakageDraw {
    pub decision: LeakageDecision,
    pub survival: f64,
    pub sample: f64,
}

/// Exponential clearance model
///
/// # Example
/// ```
/// use decay_chain_core_rs::leakage::{LeakageDecision, LeakageModel};
///
/// let model = LeakageModel::default();
/// assert_eq!(model.survival_probability(0.0), 1.0);
///
/// let one_half_life = model.half_life_s();
/// assert!((model.survival_probability(one_half_life) - 0.5).abs() < 1e-12);
///
/// assert_eq!(model.decide(one_half_life, 0.4), LeakageDecision::Retain);
/// assert_eq!(model.decide(one_half_life, 0.6), LeakageDecision::Leak);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeakageModel {
    half_life_s: f64,
}

impl LeakageModel {
    /// Model with the given clearance half-life (seconds)
    ///
    /// # Panics
    /// If `half_life_s` is not positive and finite; see [`LeakageModel::try_new`].
    pub fn new(half_life_s: f64) -> Self {
        assert!(
            half_life_s.is_finite() && half_life_s > 0.0,
            "half-life must be positive"
        );
        Self { half_life_s }
    }

    /// Model with the given clearance half-life (seconds)
    ///
    /// # Errors
    /// [`LeakageError::InvalidHalfLife`] unless `half_life_s` is positive and finite.
    pub fn try_new(half_life_s: f64) -> Result<Self, LeakageError> {
        if !(half_life_s.is_finite() && half_life_s > 0.0) {
            return Err(LeakageError::InvalidHalfLife(half_life_s));
        }
        Ok(Self { half_life_s })
    }

    /// # Panics
    /// If the half-life is not positive and finite.
    pub fn from_hours(half_life_hours: f64) -> Self {
        Self::new(half_life_hours * 3600.0)
    }

    pub fn try_from_hours(half_life_hours: f64) -> Result<Self, LeakageError> {
        Self::try_new(half_life_hours * 3600.0)
    }

    pub fn half_life_s(&self) -> f64 {
        self.half_life_s
    }

    /// Clearance rate λ = ln2 / T½ (1/s)
    pub fn rate_per_s(&self) -> f64 {
        LN_2 / self.half_life_s
    }

    /// Probability of still being in place after `elapsed_s`
    pub fn survival_probability(&self, elapsed_s: f64) -> f64 {
        (-self.rate_per_s() * elapsed_s).exp()
    }

    /// Decision for a given sample in `[0, 1)`
    pub fn decide(&self, elapsed_s: f64, sample: f64) -> LeakageDecision {
        if self.survival_probability(elapsed_s) <= sample {
            LeakageDecision::Leak
        } else {
            LeakageDecision::Retain
        }
    }

    /// Draw exactly one sample from `rng` and decide
    pub fn evaluate<R: UniformSource + ?Sized>(&self, elapsed_s: f64, rng: &mut R) -> LeakageDraw {
        let survival = self.survival_probability(elapsed_s);
        let sample = rng.uniform();
        LeakageDraw {
            decision: self.decide(elapsed_s, sample),
            survival,
            sample,
        }
    }
}

impl Default for LeakageModel {
    fn default() -> Self {
        Self::from_hours(DEFAULT_HALF_LIFE_HOURS)
    }
}
