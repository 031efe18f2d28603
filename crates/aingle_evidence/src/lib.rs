//! AIngle Evidence - Weighted Partial-Match Inference
//!
//! This crate scores hypotheses (diagnoses) from incrementally asserted facts
//! (symptoms) using a static catalog of weighted rules. A rule does not need
//! to match completely to contribute: matching a fraction of its antecedent
//! yields a proportionally scaled contribution.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Evidence Engine                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                   Catalog Loader                      │   │
//! │  │  Symptoms │ Diagnoses │ Weighted Rules │ Diagnostics  │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │  RuleSet (shared, immutable)     │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                 Inference Engine                      │   │
//! │  │  Partial Matching │ Running Average │ Noisy-OR        │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │               Reasoning Contexts                      │   │
//! │  │  Facts │ Certainty │ Probability │ Ranked Diagnoses   │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use aingle_evidence::{InferenceEngine, Predicate, Rule, RuleSet};
//!
//! let fever = Predicate::new("fever", ["Patient"])?;
//! let cough = Predicate::new("cough", ["Patient"])?;
//! let flu = Predicate::new("disease", ["Patient", "Flu"])?;
//!
//! let rules = RuleSet::from_rules(
//!     "demo",
//!     [Rule::builder("flu")
//!         .when(fever.clone())
//!         .when(cough)
//!         .then(flu.clone())
//!         .weight(0.8)
//!         .build()?],
//! );
//!
//! let engine = InferenceEngine::new(rules);
//! let ranked = engine.assert_fact("patient-1", fever);
//!
//! assert_eq!(ranked[0].predicate, flu);
//! assert!((ranked[0].certainty - 0.4).abs() < 1e-9);
//! # Ok::<(), aingle_evidence::Error>(())
//! ```

pub mod builtin;
pub mod catalog;
pub mod config;
pub mod context;
pub mod diagnosis;
pub mod engine;
pub mod error;
pub mod predicate;
pub mod rule;
pub mod score;

// Re-exports
pub use builtin::BuiltinRules;
pub use catalog::{Catalog, CatalogReport, LoadDiagnostic, LoadIssue};
pub use config::EngineConfig;
pub use context::{ContextId, ContextState, ReasoningContext};
pub use diagnosis::Diagnosis;
pub use engine::{EngineStats, InferenceEngine};
pub use error::{Error, Result};
pub use predicate::Predicate;
pub use rule::{FactLookup, Rule, RuleBuilder, RuleSet};
pub use score::CertaintyMerge;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
