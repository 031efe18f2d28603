//! Rule definitions for the evidence engine
//!
//! A rule is a weighted implication: when some (or all) of its antecedent
//! predicates are asserted, it contributes evidence for its consequent,
//! scaled by the fraction of the antecedent that matched.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::predicate::Predicate;

/// A weighted rule `antecedent -> consequent`.
///
/// A `Rule` can only be obtained through validation, so every value of this
/// type has a non-empty antecedent and a weight in `(0, 1]`. The antecedent
/// is stored exactly as given; a repeated predicate occupies several
/// positions and is counted once per position when matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    id: String,
    antecedent: Vec<Predicate>,
    consequent: Predicate,
    weight: f64,
}

impl Rule {
    /// Creates a new rule.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidRule` if the antecedent is empty.
    /// * `Error::InvalidWeight` if `weight` is not finite or not in `(0, 1]`.
    pub fn new(
        id: impl Into<String>,
        antecedent: impl IntoIterator<Item = Predicate>,
        consequent: Predicate,
        weight: f64,
    ) -> Result<Self> {
        let id = id.into();
        let antecedent: Vec<Predicate> = antecedent.into_iter().collect();

        if antecedent.is_empty() {
            return Err(Error::InvalidRule(format!(
                "rule '{}' has an empty antecedent",
                id
            )));
        }
        if !weight.is_finite() || weight <= 0.0 || weight > 1.0 {
            return Err(Error::InvalidWeight { rule: id, weight });
        }

        Ok(Self {
            id,
            antecedent,
            consequent,
            weight,
        })
    }

    /// Starts a fluent builder for a rule with the given ID.
    pub fn builder(id: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    /// The rule identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The antecedent predicates, in declaration order.
    pub fn antecedent(&self) -> &[Predicate] {
        &self.antecedent
    }

    /// The predicate this rule provides evidence for.
    pub fn consequent(&self) -> &Predicate {
        &self.consequent
    }

    /// The rule weight, in `(0, 1]`.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Counts the antecedent positions whose predicate is contained in
    /// `facts`.
    pub fn match_count<F: FactLookup + ?Sized>(&self, facts: &F) -> usize {
        self.antecedent
            .iter()
            .filter(|p| facts.contains_fact(p))
            .count()
    }

    /// The matched fraction of the antecedent, in `[0, 1]`.
    pub fn match_fraction<F: FactLookup + ?Sized>(&self, facts: &F) -> f64 {
        self.match_count(facts) as f64 / self.antecedent.len() as f64
    }
}

/// Membership test over a fact collection.
pub trait FactLookup {
    /// Returns `true` if the predicate has been asserted.
    fn contains_fact(&self, predicate: &Predicate) -> bool;
}

impl FactLookup for HashSet<Predicate> {
    fn contains_fact(&self, predicate: &Predicate) -> bool {
        self.contains(predicate)
    }
}

impl FactLookup for IndexSet<Predicate> {
    fn contains_fact(&self, predicate: &Predicate) -> bool {
        self.contains(predicate)
    }
}

impl FactLookup for [Predicate] {
    fn contains_fact(&self, predicate: &Predicate) -> bool {
        self.contains(predicate)
    }
}

/// A builder for creating `Rule`s using a fluent API.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    id: String,
    antecedent: Vec<Predicate>,
    consequent: Option<Predicate>,
    weight: f64,
}

impl RuleBuilder {
    /// Creates a new `RuleBuilder` with a given ID and a weight of `1.0`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            antecedent: Vec::new(),
            consequent: None,
            weight: 1.0,
        }
    }

    /// Adds an antecedent predicate.
    pub fn when(mut self, predicate: Predicate) -> Self {
        self.antecedent.push(predicate);
        self
    }

    /// Adds several antecedent predicates.
    pub fn when_all(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.antecedent.extend(predicates);
        self
    }

    /// Sets the consequent predicate.
    pub fn then(mut self, predicate: Predicate) -> Self {
        self.consequent = Some(predicate);
        self
    }

    /// Sets the rule weight.
    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Validates and builds the `Rule`.
    pub fn build(self) -> Result<Rule> {
        let consequent = self.consequent.ok_or_else(|| {
            Error::InvalidRule(format!("rule '{}' has no consequent", self.id))
        })?;
        Rule::new(self.id, self.antecedent, consequent, self.weight)
    }
}

#[derive(Deserialize)]
struct RawRule {
    id: String,
    antecedent: Vec<Predicate>,
    consequent: Predicate,
    weight: f64,
}

impl TryFrom<RawRule> for Rule {
    type Error = Error;

    fn try_from(raw: RawRule) -> Result<Self> {
        Rule::new(raw.id, raw.antecedent, raw.consequent, raw.weight)
    }
}

/// An ordered collection of rules.
///
/// Insertion order is preserved exactly; the engine evaluates rules in this
/// order and certainty aggregation depends on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Name of this rule set
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a new empty rule set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            rules: Vec::new(),
        }
    }

    /// Create a rule set from already validated rules, keeping their order.
    pub fn from_rules(name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut set = Self::new(name);
        set.rules.extend(rules);
        set
    }

    /// Append a rule
    pub fn add(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Iterate rules in stored order
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// All rules as a slice
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Find a rule by ID
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Rules concluding the given predicate, in stored order
    pub fn concluding(&self, consequent: &Predicate) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| &r.consequent == consequent)
            .collect()
    }

    /// Distinct consequents in first-seen order
    pub fn consequents(&self) -> IndexSet<&Predicate> {
        self.rules.iter().map(|r| &r.consequent).collect()
    }

    /// Distinct antecedent predicates in first-seen order, with the number
    /// of rules referencing each.
    pub fn antecedent_atoms(&self) -> IndexMap<&Predicate, usize> {
        let mut atoms = IndexMap::new();
        for predicate in self.rules.iter().flat_map(|r| r.antecedent.iter()) {
            *atoms.entry(predicate).or_insert(0) += 1;
        }
        atoms
    }

    /// Count of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
