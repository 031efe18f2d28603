//! Built-in rule catalogs
//!
//! Catalogs shipped with the crate, embedded at compile time and loaded
//! through the regular catalog parser.

use log::warn;

use crate::catalog::Catalog;
use crate::rule::RuleSet;

const RESPIRATORY: &str = include_str!("../catalogs/respiratory.catalog");

/// A collection of pre-defined catalogs.
pub struct BuiltinRules;

impl BuiltinRules {
    /// Infectious and respiratory disease catalog: 33 symptoms, 30 diagnoses
    /// and 96 weighted rules over a single `Patient`.
    ///
    /// Symptoms are `symptom(Patient)`, diagnoses are
    /// `disease(Patient, Name)`.
    pub fn respiratory() -> Catalog {
        let report = Catalog::parse("respiratory", RESPIRATORY);
        for diagnostic in &report.diagnostics {
            warn!("Built-in catalog: {}", diagnostic);
        }
        report.catalog
    }

    /// The rules of [`BuiltinRules::respiratory`].
    pub fn respiratory_rules() -> RuleSet {
        Self::respiratory().into_rules()
    }

    /// Names of all bundled catalogs.
    pub fn names() -> &'static [&'static str] {
        &["respiratory"]
    }

    /// Looks up a bundled catalog by name.
    pub fn by_name(name: &str) -> Option<Catalog> {
        match name {
            "respiratory" => Some(Self::respiratory()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;

    #[test]
    fn test_respiratory_loads_cleanly() {
        let report = Catalog::parse("respiratory", RESPIRATORY);
        assert!(report.is_clean(), "{:?}", report.diagnostics);

        let catalog = report.catalog;
        assert_eq!(catalog.symptoms().len(), 33);
        assert_eq!(catalog.diagnoses().len(), 30);
        assert_eq!(catalog.rules().len(), 96);
    }

    #[test]
    fn test_respiratory_rule_order() {
        let rules = BuiltinRules::respiratory_rules();
        let first = &rules.rules()[0];
        assert_eq!(first.id(), "flu_1");
        assert_eq!(first.weight(), 0.8);
        assert_eq!(
            first.consequent(),
            &Predicate::new("disease", ["Patient", "Flu"]).unwrap()
        );
        assert_eq!(rules.rules()[rules.len() - 1].id(), "typhoid_3");
    }

    #[test]
    fn test_every_consequent_is_a_diagnosis() {
        let catalog = BuiltinRules::respiratory();
        for rule in catalog.rules() {
            assert!(catalog.diagnoses().values().any(|d| d == rule.consequent()));
        }
    }

    #[test]
    fn test_by_name() {
        assert!(BuiltinRules::by_name("respiratory").is_some());
        assert!(BuiltinRules::by_name("cardiology").is_none());
        assert_eq!(BuiltinRules::names(), ["respiratory"]);
    }
}
