//! Scored consequents and their ranking order.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::predicate::Predicate;

/// A consequent together with its two scores for one reasoning context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// The scored consequent.
    pub predicate: Predicate,
    /// Running-average certainty, in `[0, 1]`.
    pub certainty: f64,
    /// Noisy-OR accumulated probability, in `[0, 1]`.
    pub probability: f64,
}

impl Diagnosis {
    /// Creates a new diagnosis entry.
    pub fn new(predicate: Predicate, certainty: f64, probability: f64) -> Self {
        Self {
            predicate,
            certainty,
            probability,
        }
    }

    /// Ranking order: probability descending, then certainty descending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .probability
            .total_cmp(&self.probability)
            .then_with(|| other.certainty.total_cmp(&self.certainty))
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: certainty = {:.2}, probability = {:.2}",
            self.predicate, self.certainty, self.probability
        )
    }
}

/// Sorts diagnoses into ranking order. The sort is stable, so entries with
/// equal scores keep their incoming order.
pub fn rank(diagnoses: &mut [Diagnosis]) {
    diagnoses.sort_by(Diagnosis::rank_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(name: &str, certainty: f64, probability: f64) -> Diagnosis {
        Diagnosis::new(Predicate::atom(name).unwrap(), certainty, probability)
    }

    #[test]
    fn test_rank_by_probability_then_certainty() {
        let mut list = vec![
            d("cold", 0.5, 0.5),
            d("flu", 0.2, 0.9),
            d("covid", 0.7, 0.5),
            d("dengue", 0.1, 0.1),
        ];
        rank(&mut list);
        let names: Vec<_> = list.iter().map(|d| d.predicate.name()).collect();
        assert_eq!(names, ["flu", "covid", "cold", "dengue"]);
    }

    #[test]
    fn test_rank_is_stable_on_full_ties() {
        let mut list = vec![d("b", 0.5, 0.5), d("a", 0.5, 0.5)];
        rank(&mut list);
        assert_eq!(list[0].predicate.name(), "b");
    }

    #[test]
    fn test_display() {
        let diag = Diagnosis::new(
            Predicate::new("disease", ["Patient", "Flu"]).unwrap(),
            0.2,
            0.3313,
        );
        assert_eq!(
            diag.to_string(),
            "disease(Patient, Flu): certainty = 0.20, probability = 0.33"
        );
    }
}
