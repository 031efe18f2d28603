//! Configuration for the evidence engine.

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::score::CertaintyMerge;

/// Environment variable selecting the certainty merge policy.
pub const ENV_CERTAINTY_MERGE: &str = "AINGLE_EVIDENCE_CERTAINTY_MERGE";
/// Environment variable setting the minimum probability reported in rankings.
pub const ENV_MIN_PROBABILITY: &str = "AINGLE_EVIDENCE_MIN_PROBABILITY";
/// Environment variable capping the number of ranked diagnoses.
pub const ENV_MAX_RESULTS: &str = "AINGLE_EVIDENCE_MAX_RESULTS";

/// Main configuration for the `InferenceEngine`.
///
/// The filters only shape ranked output; the score maps kept per context
/// always hold every consequent that received evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Policy combining certainty contributions for the same consequent.
    pub certainty_merge: CertaintyMerge,
    /// Diagnoses with a probability below this value are left out of rankings.
    pub min_probability: f64,
    /// Maximum number of ranked diagnoses returned; `None` returns all.
    pub max_results: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            certainty_merge: CertaintyMerge::RunningAverage,
            min_probability: 0.0,
            max_results: None,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration with environment overrides applied.
    ///
    /// Unparseable values are ignored and the default is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// # use aingle_evidence::EngineConfig;
    /// let config = EngineConfig::from_env();
    /// println!("certainty merge: {}", config.certainty_merge);
    /// ```
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup` (keyed by the `ENV_*` names) on top of
    /// the defaults. Values that do not parse are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(policy) = parse_var(&lookup, ENV_CERTAINTY_MERGE) {
            config.certainty_merge = policy;
        }
        if let Some(threshold) = parse_var(&lookup, ENV_MIN_PROBABILITY) {
            config.min_probability = threshold;
        }
        if let Some(max) = parse_var(&lookup, ENV_MAX_RESULTS) {
            config.max_results = Some(max);
        }

        config
    }

    /// Sets the certainty merge policy.
    pub fn with_certainty_merge(mut self, policy: CertaintyMerge) -> Self {
        self.certainty_merge = policy;
        self
    }

    /// Sets the minimum reported probability.
    pub fn with_min_probability(mut self, threshold: f64) -> Self {
        self.min_probability = threshold;
        self
    }

    /// Caps the number of ranked diagnoses.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_probability) {
            return Err(Error::Config(format!(
                "min_probability must be in [0, 1], got {}",
                self.min_probability
            )));
        }
        if self.max_results == Some(0) {
            return Err(Error::Config(
                "max_results must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
