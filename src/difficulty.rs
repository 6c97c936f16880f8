//! Reasoning-step difficulty of a resolved query.
//!
//! The score walks a [`QueryPlan`] and sums per-predicate weights. A step with
//! a weight stands for its whole rule expansion, so the steps nested beneath
//! it are skipped. A step without a weight adds nothing and its expansion is
//! walked instead.

use std::collections::{BTreeMap, HashMap};

use crate::engine::QueryPlan;

/// Family relations are weighted by the number of hops they span in the
/// family graph; attribute lookups and aggregates cost one step each.
pub const DEFAULT_WEIGHTS: &[(&str, u32)] = &[
    ("parent", 1),
    ("child", 1),
    ("father", 1),
    ("mother", 1),
    ("husband", 1),
    ("wife", 1),
    ("married", 1),
    ("son", 2),
    ("daughter", 2),
    ("sibling", 2),
    ("brother", 2),
    ("sister", 2),
    ("grandparent", 2),
    ("grandfather", 2),
    ("grandmother", 2),
    ("grandchild", 2),
    ("grandson", 3),
    ("granddaughter", 3),
    ("great_grandparent", 3),
    ("great_grandfather", 3),
    ("great_grandmother", 3),
    ("great_grandchild", 3),
    ("aunt", 3),
    ("uncle", 3),
    ("niece", 3),
    ("nephew", 3),
    ("great_grandson", 4),
    ("great_granddaughter", 4),
    ("cousin", 4),
    // attributes
    ("job", 1),
    ("hobby", 1),
    ("dob", 1),
    // aggregates
    ("count", 1),
];

/// Predicate -> weight lookup. Predicates not in the table weigh 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DifficultyTable {
    weights: HashMap<String, u32>,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        DifficultyTable {
            weights: DEFAULT_WEIGHTS
                .iter()
                .map(|(p, w)| (p.to_string(), *w))
                .collect(),
        }
    }
}

impl DifficultyTable {
    /// The default table with `overrides` applied on top.
    pub fn with_overrides(overrides: &BTreeMap<String, u32>) -> Self {
        let mut table = DifficultyTable::default();
        for (predicate, weight) in overrides {
            table.weights.insert(predicate.clone(), *weight);
        }
        table
    }

    pub fn weight(&self, predicate: &str) -> Option<u32> {
        self.weights.get(predicate).copied()
    }

    pub fn score(&self, plan: &QueryPlan) -> u32 {
        let mut total = 0;
        let mut covered: Option<usize> = None;
        for step in plan.steps() {
            if covered.is_some_and(|depth| step.depth > depth) {
                continue;
            }
            covered = None;
            if let Some(w) = self.weight(&step.predicate) {
                total += w;
                covered = Some(step.depth);
            }
        }
        total
    }
}

/// Score with the default table.
pub fn score(plan: &QueryPlan) -> u32 {
    DifficultyTable::default().score(plan)
}
