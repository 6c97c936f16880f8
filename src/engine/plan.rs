use crate::datalog::Literal;

use super::database::Database;
use super::query::COUNT;

/// One predicate visited while unfolding a query, with its rule-expansion depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanStep {
    pub predicate: String,
    pub depth: usize,
}

/// The predicates a query resolves through, in resolution order, rule
/// expansions included. Depth 0 steps are the query's own goals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryPlan {
    steps: Vec<PlanStep>,
}

impl QueryPlan {
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn predicates(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.predicate.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Database {
    /// Unfold `goals` through the rule catalog, pre-order, in declared goal
    /// order. Rules of the same head are unfolded in load order; `count`
    /// contributes its own step followed by its inner goal at the same depth.
    pub fn plan(&self, goals: &[Literal]) -> QueryPlan {
        let mut steps = Vec::new();
        let mut pending: Vec<(Literal, usize)> =
            goals.iter().rev().map(|g| (g.clone(), 0)).collect();

        while let Some((goal, depth)) = pending.pop() {
            steps.push(PlanStep {
                predicate: goal.predicate.clone(),
                depth,
            });

            if goal.predicate == COUNT {
                if let Some(inner) = goal.terms.first().and_then(Literal::from_term) {
                    pending.push((inner, depth));
                }
                continue;
            }

            if depth < self.max_depth() {
                let body: Vec<Literal> = self
                    .rules_for(&goal.predicate)
                    .flat_map(|rule| rule.body.iter().cloned())
                    .collect();
                pending.extend(body.into_iter().rev().map(|l| (l, depth + 1)));
            }
        }

        QueryPlan { steps }
    }
}
