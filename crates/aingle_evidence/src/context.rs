//! Reasoning contexts
//!
//! A context is one isolated unit of fact accumulation and scoring, for
//! instance a single patient. It owns its facts and both score maps; the
//! engine is the only writer.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::diagnosis::{rank, Diagnosis};
use crate::predicate::Predicate;
use crate::rule::{FactLookup, RuleSet};
use crate::score::{certainty_contribution, probability_contribution, CertaintyMerge, ScoreAccumulator};

/// Opaque identifier of a reasoning context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(String);

impl ContextId {
    /// Creates a context ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ContextId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ContextId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&ContextId> for ContextId {
    fn from(id: &ContextId) -> Self {
        id.clone()
    }
}

/// Lifecycle state of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextState {
    /// No facts asserted yet; both score maps are empty.
    Empty,
    /// At least one fact has been asserted.
    Populated,
}

/// What a single recompute pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeOutcome {
    /// Rules visited.
    pub rules_evaluated: usize,
    /// Rules with at least one matching antecedent.
    pub rules_fired: usize,
}

/// Facts and scores of one reasoning context.
#[derive(Debug, Clone)]
pub struct ReasoningContext {
    id: ContextId,
    facts: IndexSet<Predicate>,
    certainty: IndexMap<Predicate, f64>,
    probability: IndexMap<Predicate, f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    recomputes: u64,
}

impl ReasoningContext {
    /// Creates an empty context.
    pub fn new(id: impl Into<ContextId>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            facts: IndexSet::new(),
            certainty: IndexMap::new(),
            probability: IndexMap::new(),
            created_at: now,
            updated_at: now,
            recomputes: 0,
        }
    }

    /// The context ID.
    pub fn id(&self) -> &ContextId {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ContextState {
        if self.facts.is_empty() {
            ContextState::Empty
        } else {
            ContextState::Populated
        }
    }

    /// Asserted facts, in assertion order.
    pub fn facts(&self) -> &IndexSet<Predicate> {
        &self.facts
    }

    /// Returns `true` if the fact has been asserted in this context.
    pub fn contains_fact(&self, predicate: &Predicate) -> bool {
        self.facts.contains(predicate)
    }

    /// Number of asserted facts.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns `true` when no fact has been asserted.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Certainty map from the latest recompute.
    pub fn certainty_scores(&self) -> &IndexMap<Predicate, f64> {
        &self.certainty
    }

    /// Probability map from the latest recompute.
    pub fn probability_scores(&self) -> &IndexMap<Predicate, f64> {
        &self.probability
    }

    /// Certainty of a consequent, if any rule gave evidence for it.
    pub fn certainty(&self, predicate: &Predicate) -> Option<f64> {
        self.certainty.get(predicate).copied()
    }

    /// Probability of a consequent, if any rule gave evidence for it.
    pub fn probability(&self, predicate: &Predicate) -> Option<f64> {
        self.probability.get(predicate).copied()
    }

    /// Both scores of a consequent.
    pub fn diagnosis(&self, predicate: &Predicate) -> Option<Diagnosis> {
        let certainty = self.certainty(predicate)?;
        let probability = self.probability(predicate)?;
        Some(Diagnosis::new(predicate.clone(), certainty, probability))
    }

    /// Every scored consequent in ranking order.
    pub fn ranked(&self) -> Vec<Diagnosis> {
        let mut ranked: Vec<Diagnosis> = self
            .certainty
            .iter()
            .map(|(predicate, certainty)| {
                let probability = self.probability.get(predicate).copied().unwrap_or(0.0);
                Diagnosis::new(predicate.clone(), *certainty, probability)
            })
            .collect();
        rank(&mut ranked);
        ranked
    }

    /// When the context was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the context was last recomputed.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Number of recompute passes run so far.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// Adds a fact. Returns `false` if it was already present.
    pub(crate) fn insert_fact(&mut self, predicate: Predicate) -> bool {
        self.facts.insert(predicate)
    }

    /// Rebuilds both score maps from scratch over the whole fact set,
    /// visiting rules in stored order.
    pub(crate) fn recompute(&mut self, rules: &RuleSet, policy: CertaintyMerge) -> RecomputeOutcome {
        let mut outcome = RecomputeOutcome::default();
        let mut scores: IndexMap<&Predicate, ScoreAccumulator> = IndexMap::new();

        for rule in rules {
            outcome.rules_evaluated += 1;

            let matched = rule.match_count(&self.facts);
            if matched == 0 {
                continue;
            }
            outcome.rules_fired += 1;

            let fraction = matched as f64 / rule.antecedent().len() as f64;
            let certainty = certainty_contribution(rule.weight(), fraction);
            let probability = probability_contribution(rule.weight(), fraction);
            trace!(
                "[{}] rule {} matched {}/{} -> {} (c={:.4}, p={:.4})",
                self.id,
                rule.id(),
                matched,
                rule.antecedent().len(),
                rule.consequent(),
                certainty,
                probability
            );

            scores
                .entry(rule.consequent())
                .and_modify(|acc| acc.merge(policy, certainty, probability))
                .or_insert_with(|| ScoreAccumulator::new(certainty, probability));
        }

        self.certainty = scores
            .iter()
            .map(|(p, acc)| ((*p).clone(), acc.certainty()))
            .collect();
        self.probability = scores
            .into_iter()
            .map(|(p, acc)| (p.clone(), acc.probability()))
            .collect();
        self.recomputes += 1;
        self.updated_at = Utc::now();

        outcome
    }
}

impl FactLookup for ReasoningContext {
    fn contains_fact(&self, predicate: &Predicate) -> bool {
        self.facts.contains(predicate)
    }
}
