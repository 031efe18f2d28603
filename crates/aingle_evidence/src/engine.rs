//! Inference engine with per-context partial-match scoring
//!
//! The engine holds one shared, immutable `RuleSet` and any number of
//! reasoning contexts. Asserting a fact into a context re-evaluates every
//! rule against that context's full fact set:
//!
//! ```text
//! for rule in ruleset (stored order):
//!     matched  = |antecedent ∩ facts|            (skip when 0)
//!     fraction = matched / |antecedent|
//!     certainty[consequent]   <- merge(weight * fraction)
//!     probability[consequent] <- noisy_or(1 - (1 - weight) ^ fraction)
//! ```
//!
//! Contexts are independent. Each sits behind its own lock, so assertions
//! into different contexts run in parallel while assertions into the same
//! context are serialized.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::config::EngineConfig;
use crate::context::{ContextId, ReasoningContext, RecomputeOutcome};
use crate::diagnosis::Diagnosis;
use crate::error::Result;
use crate::predicate::Predicate;
use crate::rule::RuleSet;

type SharedContext = Arc<RwLock<ReasoningContext>>;

/// The weighted evidence engine.
///
/// All operations take `&self`; the engine is `Send + Sync` and can be shared
/// across threads behind an `Arc`.
pub struct InferenceEngine {
    /// The rules every context is evaluated against.
    rules: Arc<RuleSet>,
    /// Scoring and reporting configuration.
    config: EngineConfig,
    /// Contexts by ID, created lazily on first assertion.
    contexts: RwLock<HashMap<ContextId, SharedContext>>,
    /// Statistics tracking engine operations.
    stats: Mutex<EngineStats>,
}

impl InferenceEngine {
    /// Creates an engine over `rules` with the default configuration.
    pub fn new(rules: impl Into<Arc<RuleSet>>) -> Self {
        Self {
            rules: rules.into(),
            config: EngineConfig::default(),
            contexts: RwLock::new(HashMap::new()),
            stats: Mutex::new(EngineStats::default()),
        }
    }

    /// Creates an engine with a specific configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration does not validate.
    pub fn with_config(rules: impl Into<Arc<RuleSet>>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = Self::new(rules);
        engine.config = config;
        Ok(engine)
    }

    /// The shared rule set.
    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Asserts a fact into a context and recomputes that context.
    ///
    /// The context is created if it does not exist yet. Asserting a fact that
    /// is already present leaves the fact set unchanged but still runs a full
    /// recompute. Returns the ranked diagnoses after the recompute.
    pub fn assert_fact(&self, context: impl Into<ContextId>, fact: Predicate) -> Vec<Diagnosis> {
        self.assert_facts(context, std::iter::once(fact))
    }

    /// Asserts several facts into a context with a single recompute.
    ///
    /// The resulting scores are the same as asserting the facts one by one.
    pub fn assert_facts(
        &self,
        context: impl Into<ContextId>,
        facts: impl IntoIterator<Item = Predicate>,
    ) -> Vec<Diagnosis> {
        let id = context.into();
        let handle = self.context_handle(&id);

        let (ranked, outcome, asserted) = {
            let mut ctx = handle.write();
            let mut asserted = 0;
            for fact in facts {
                if !ctx.insert_fact(fact) {
                    debug!("[{}] fact already asserted", id);
                }
                asserted += 1;
            }
            let outcome = ctx.recompute(&self.rules, self.config.certainty_merge);
            debug!(
                "[{}] recomputed over {} facts: {}/{} rules fired, {} consequents scored",
                id,
                ctx.len(),
                outcome.rules_fired,
                outcome.rules_evaluated,
                ctx.certainty_scores().len()
            );
            (ctx.ranked(), outcome, asserted)
        };

        self.record(asserted, outcome);
        self.report(ranked)
    }

    /// Ranked diagnoses of a context: probability descending, then certainty
    /// descending, filtered by the configured threshold and limit.
    ///
    /// An unknown context yields an empty list.
    pub fn ranked_diagnoses(&self, context: &str) -> Vec<Diagnosis> {
        self.get(context)
            .map(|handle| self.report(handle.read().ranked()))
            .unwrap_or_default()
    }

    /// Facts asserted into a context, in assertion order.
    ///
    /// An unknown context yields an empty set.
    pub fn facts(&self, context: &str) -> IndexSet<Predicate> {
        self.get(context)
            .map(|handle| handle.read().facts().clone())
            .unwrap_or_default()
    }

    /// Scores of a single consequent in a context.
    pub fn diagnosis(&self, context: &str, consequent: &Predicate) -> Option<Diagnosis> {
        self.get(context)?.read().diagnosis(consequent)
    }

    /// A copy of the context's current state.
    pub fn snapshot(&self, context: &str) -> Option<ReasoningContext> {
        self.get(context).map(|handle| handle.read().clone())
    }

    /// Returns `true` if facts have been asserted into this context.
    pub fn has_context(&self, context: &str) -> bool {
        self.contexts.read().contains_key(context)
    }

    /// IDs of all live contexts, sorted.
    pub fn context_ids(&self) -> Vec<ContextId> {
        let mut ids: Vec<_> = self.contexts.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of live contexts.
    pub fn context_count(&self) -> usize {
        self.contexts.read().len()
    }

    /// Drops a context with its facts and scores. Returns `false` if it did
    /// not exist.
    pub fn discard_context(&self, context: &str) -> bool {
        let removed = self.contexts.write().remove(context).is_some();
        if removed {
            debug!("[{}] context discarded", context);
        }
        removed
    }

    /// Retrieves the current `EngineStats`.
    pub fn stats(&self) -> EngineStats {
        self.stats.lock().clone()
    }

    /// Resets all collected `EngineStats`.
    pub fn clear_stats(&self) {
        *self.stats.lock() = EngineStats::default();
    }

    fn get<Q>(&self, context: &Q) -> Option<SharedContext>
    where
        ContextId: Borrow<Q>,
        Q: std::hash::Hash + Eq + ?Sized,
    {
        self.contexts.read().get(context).cloned()
    }

    fn context_handle(&self, id: &ContextId) -> SharedContext {
        if let Some(handle) = self.get(id) {
            return handle;
        }

        let mut contexts = self.contexts.write();
        contexts
            .entry(id.clone())
            .or_insert_with(|| {
                debug!("[{}] context created", id);
                self.stats.lock().contexts_created += 1;
                Arc::new(RwLock::new(ReasoningContext::new(id.clone())))
            })
            .clone()
    }

    fn record(&self, asserted: usize, outcome: RecomputeOutcome) {
        let mut stats = self.stats.lock();
        stats.assertions += asserted;
        stats.recomputes += 1;
        stats.rules_evaluated += outcome.rules_evaluated;
        stats.rules_fired += outcome.rules_fired;
    }

    fn report(&self, mut ranked: Vec<Diagnosis>) -> Vec<Diagnosis> {
        if self.config.min_probability > 0.0 {
            ranked.retain(|d| d.probability >= self.config.min_probability);
        }
        if let Some(max) = self.config.max_results {
            ranked.truncate(max);
        }
        ranked
    }
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("rules", &self.rules.name)
            .field("rule_count", &self.rules.len())
            .field("config", &self.config)
            .field("contexts", &self.context_count())
            .finish()
    }
}

/// Collects statistics about the operations performed by the `InferenceEngine`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Facts asserted, including repeats.
    pub assertions: usize,
    /// Recompute passes run.
    pub recomputes: usize,
    /// Rules visited across all passes.
    pub rules_evaluated: usize,
    /// Rules that matched at least one antecedent across all passes.
    pub rules_fired: usize,
    /// Contexts created.
    pub contexts_created: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use crate::score::CertaintyMerge;

    fn p(name: &str) -> Predicate {
        Predicate::new(name, ["Patient"]).unwrap()
    }

    fn rule(id: &str, antecedent: &[&str], consequent: &str, weight: f64) -> Rule {
        Rule::new(id, antecedent.iter().map(|a| p(a)), p(consequent), weight).unwrap()
    }

    fn engine() -> InferenceEngine {
        InferenceEngine::new(RuleSet::from_rules(
            "test",
            [
                rule("flu", &["fever", "cough", "sore_throat", "body_ache"], "flu", 0.8),
                rule("cold", &["cough", "runny_nose"], "cold", 0.5),
            ],
        ))
    }

    #[test]
    fn test_engine_creation() {
        let engine = engine();
        assert_eq!(engine.stats(), EngineStats::default());
        assert_eq!(engine.context_count(), 0);
        assert_eq!(engine.rules().len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::default().with_min_probability(-1.0);
        assert!(InferenceEngine::with_config(RuleSet::new("empty"), config).is_err());
    }

    #[test]
    fn test_context_created_lazily() {
        let engine = engine();
        assert!(!engine.has_context("p1"));
        assert!(engine.ranked_diagnoses("p1").is_empty());
        assert!(engine.facts("p1").is_empty());
        assert!(!engine.has_context("p1"));

        engine.assert_fact("p1", p("fever"));
        assert!(engine.has_context("p1"));
        assert_eq!(engine.context_ids(), [ContextId::from("p1")]);
    }

    #[test]
    fn test_assert_returns_ranked_snapshot() {
        let engine = engine();
        let ranked = engine.assert_fact("p1", p("cough"));
        assert_eq!(ranked.len(), 2);
        // cold: 1 - 0.5^0.5 = 0.293, flu: 1 - 0.2^0.25 = 0.331
        assert_eq!(ranked[0].predicate, p("flu"));
        assert_eq!(ranked[1].predicate, p("cold"));
        assert_eq!(ranked, engine.ranked_diagnoses("p1"));
    }

    #[test]
    fn test_assert_facts_matches_sequential() {
        let batch = engine();
        batch.assert_facts("p", [p("fever"), p("cough"), p("runny_nose")]);

        let sequential = engine();
        for fact in [p("fever"), p("cough"), p("runny_nose")] {
            sequential.assert_fact("p", fact);
        }

        assert_eq!(batch.ranked_diagnoses("p"), sequential.ranked_diagnoses("p"));
        assert_eq!(batch.facts("p"), sequential.facts("p"));
    }

    #[test]
    fn test_discard_context() {
        let engine = engine();
        engine.assert_fact("p1", p("fever"));
        assert!(engine.discard_context("p1"));
        assert!(!engine.discard_context("p1"));
        assert!(engine.ranked_diagnoses("p1").is_empty());
    }

    #[test]
    fn test_stats() {
        let engine = engine();
        engine.assert_fact("a", p("fever"));
        engine.assert_fact("a", p("fever"));
        engine.assert_fact("b", p("cough"));

        let stats = engine.stats();
        assert_eq!(stats.assertions, 3);
        assert_eq!(stats.recomputes, 3);
        assert_eq!(stats.rules_evaluated, 6);
        assert_eq!(stats.rules_fired, 4);
        assert_eq!(stats.contexts_created, 2);

        engine.clear_stats();
        assert_eq!(engine.stats(), EngineStats::default());
    }

    #[test]
    fn test_report_filters() {
        let config = EngineConfig::default()
            .with_min_probability(0.3)
            .with_max_results(5);
        let engine = InferenceEngine::with_config(engine().rules().clone(), config).unwrap();

        let ranked = engine.assert_fact("p", p("cough"));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].predicate, p("flu"));

        // the stored scores are not filtered
        assert!(engine.diagnosis("p", &p("cold")).is_some());
    }

    #[test]
    fn test_mean_policy_configurable() {
        let rules = RuleSet::from_rules(
            "three",
            [
                rule("a", &["x"], "d", 0.8),
                rule("b", &["y"], "d", 0.6),
                rule("c", &["z"], "d", 0.4),
            ],
        );
        let config = EngineConfig::default().with_certainty_merge(CertaintyMerge::Mean);
        let engine = InferenceEngine::with_config(rules, config).unwrap();
        engine.assert_facts("p", [p("x"), p("y"), p("z")]);

        let d = engine.diagnosis("p", &p("d")).unwrap();
        assert!((d.certainty - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InferenceEngine>();
    }
}
