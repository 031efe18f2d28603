//! Error types for the AIngle Evidence engine.

use thiserror::Error;

/// A specialized `Result` type for evidence engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur while building rules, loading catalogs
/// and configuring the engine.
///
/// Scoring itself never fails: once a `RuleSet` exists, every assertion and
/// query succeeds.
#[derive(Error, Debug)]
pub enum Error {
    /// A predicate was malformed (empty name, unbalanced parentheses, ...).
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// A rule was defined incorrectly (e.g. an empty antecedent).
    #[error("Invalid rule definition: {0}")]
    InvalidRule(String),

    /// A rule weight is not a finite value in `(0, 1]`.
    #[error("Invalid weight {weight} for rule '{rule}': must be in (0, 1]")]
    InvalidWeight { rule: String, weight: f64 },

    /// The engine configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A catalog file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during data serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
