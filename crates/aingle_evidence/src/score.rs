//! Scoring primitives
//!
//! Each firing rule yields two contributions for its consequent:
//!
//! ```text
//! certainty   = weight * fraction
//! probability = 1 - (1 - weight) ^ fraction
//! ```
//!
//! where `fraction` is the matched share of the antecedent. Contributions for
//! the same consequent are merged with a [`CertaintyMerge`] policy for
//! certainty and with noisy-OR for probability.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Certainty contribution of a rule with `weight` matched to `fraction`.
///
/// Always in `[0, weight]` for `fraction` in `[0, 1]`.
pub fn certainty_contribution(weight: f64, fraction: f64) -> f64 {
    weight * fraction
}

/// Probability contribution of a rule with `weight` matched to `fraction`.
///
/// Equals `weight` on a full match and grows concavely with the fraction.
pub fn probability_contribution(weight: f64, fraction: f64) -> f64 {
    1.0 - (1.0 - weight).powf(fraction)
}

/// Noisy-OR combination of two independent pieces of evidence.
///
/// Commutative and associative; never below `max(a, b)` for inputs in `[0, 1]`.
pub fn noisy_or(a: f64, b: f64) -> f64 {
    1.0 - (1.0 - a) * (1.0 - b)
}

/// How certainty contributions for the same consequent are combined within
/// one recompute pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertaintyMerge {
    /// Pairwise running average in rule order: each new contribution is
    /// averaged with the value accumulated so far. Order dependent once three
    /// or more rules fire for the same consequent.
    #[default]
    RunningAverage,
    /// Arithmetic mean over every contribution of the pass. Independent of
    /// rule order.
    Mean,
}

impl CertaintyMerge {
    /// Stable lowercase name, as accepted by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CertaintyMerge::RunningAverage => "running_average",
            CertaintyMerge::Mean => "mean",
        }
    }
}

impl fmt::Display for CertaintyMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertaintyMerge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "running_average" | "running" => Ok(CertaintyMerge::RunningAverage),
            "mean" => Ok(CertaintyMerge::Mean),
            other => Err(Error::Config(format!("unknown certainty merge policy '{}'", other))),
        }
    }
}

/// Per-consequent accumulator used during a single recompute pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoreAccumulator {
    certainty: f64,
    certainty_sum: f64,
    contributions: u32,
    probability: f64,
}

impl ScoreAccumulator {
    /// Starts an accumulator from the first contribution (first write).
    pub(crate) fn new(certainty: f64, probability: f64) -> Self {
        Self {
            certainty,
            certainty_sum: certainty,
            contributions: 1,
            probability,
        }
    }

    /// Folds in a further contribution for the same consequent.
    pub(crate) fn merge(&mut self, policy: CertaintyMerge, certainty: f64, probability: f64) {
        self.contributions += 1;
        self.certainty_sum += certainty;
        self.certainty = match policy {
            CertaintyMerge::RunningAverage => (self.certainty + certainty) / 2.0,
            CertaintyMerge::Mean => self.certainty_sum / f64::from(self.contributions),
        };
        self.probability = noisy_or(self.probability, probability);
    }

    pub(crate) fn certainty(&self) -> f64 {
        self.certainty
    }

    pub(crate) fn probability(&self) -> f64 {
        self.probability
    }
}
