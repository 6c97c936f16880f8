use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::datalog::{Clause, Literal};

use super::query::COUNT;

/// Predicate dependency graph of a rule set: head -> predicates in its body.
/// A `count(Goal, N)` body literal depends on Goal's predicate.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
    predicates: BTreeSet<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph::default()
    }

    /// Build dependency graph from rules
    pub fn from_rules(rules: &[Clause]) -> Self {
        let mut graph = DependencyGraph::new();

        for clause in rules {
            let head_pred = clause.head.predicate.clone();
            graph.predicates.insert(head_pred.clone());
            let deps = graph.edges.entry(head_pred).or_default();

            for body_lit in &clause.body {
                let body_pred = if body_lit.predicate == COUNT {
                    match body_lit.terms.first().and_then(Literal::from_term) {
                        Some(inner) => inner.predicate,
                        None => continue,
                    }
                } else {
                    body_lit.predicate.clone()
                };
                deps.insert(body_pred.clone());
                graph.predicates.insert(body_pred);
            }
        }

        graph
    }

    fn dependencies<'a>(&'a self, predicate: &str) -> impl Iterator<Item = &'a str> {
        self.edges
            .get(predicate)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Predicates reachable from `start` through one or more rule expansions.
    fn reachable(&self, start: &str) -> BTreeSet<&str> {
        let mut seen = BTreeSet::new();
        let mut work: Vec<&str> = self.dependencies(start).collect();
        while let Some(next) = work.pop() {
            if seen.insert(next) {
                work.extend(self.dependencies(next));
            }
        }
        seen
    }

    /// Predicates that can reach themselves through rule bodies, sorted.
    pub fn recursive_predicates(&self) -> Vec<String> {
        self.predicates
            .iter()
            .filter(|p| self.reachable(p).contains(p.as_str()))
            .cloned()
            .collect()
    }

    /// Longest chain of rule expansions needed to reach base facts from
    /// `predicate`: 0 for a base predicate, `None` when the chain is unbounded.
    pub fn chain_depth(&self, predicate: &str) -> Option<usize> {
        self.depth_of(predicate, &mut HashSet::new(), &mut HashMap::new())
    }

    /// The deepest bounded chain over all rule heads.
    pub fn deepest_chain(&self) -> usize {
        let mut memo = HashMap::new();
        self.edges
            .keys()
            .filter_map(|head| self.depth_of(head, &mut HashSet::new(), &mut memo))
            .max()
            .unwrap_or(0)
    }

    // A predicate met again while still on the path closes a cycle, which
    // makes every predicate on that path unbounded.
    fn depth_of<'a>(
        &'a self,
        predicate: &'a str,
        path: &mut HashSet<&'a str>,
        memo: &mut HashMap<&'a str, Option<usize>>,
    ) -> Option<usize> {
        if let Some(known) = memo.get(predicate) {
            return *known;
        }
        if !path.insert(predicate) {
            return None;
        }
        let mut deepest = 0;
        let mut bounded = true;
        for dep in self.dependencies(predicate) {
            match self.depth_of(dep, path, memo) {
                Some(d) => deepest = deepest.max(d),
                None => bounded = false,
            }
        }
        path.remove(predicate);

        let depth = if !bounded {
            None
        } else if self.edges.contains_key(predicate) {
            Some(deepest + 1)
        } else {
            Some(0)
        };
        memo.insert(predicate, depth);
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::Statement;
    use crate::parser::parse_program;

    fn graph(input: &str) -> DependencyGraph {
        let rules: Vec<Clause> = parse_program(input)
            .unwrap()
            .into_iter()
            .filter_map(|s| match s {
                Statement::Assertion(c) => Some(c),
                Statement::Query(_) => None,
            })
            .collect();
        DependencyGraph::from_rules(&rules)
    }

    #[test]
    fn test_chain_depth() {
        let g = graph(
            r#"
            child(X, Y) :- parent(Y, X).
            daughter(X, Y) :- child(X, Y), female(Y).
            grandchild(X, Y) :- child(X, Z), child(Z, Y).
            granddaughter(X, Y) :- grandchild(X, Y), female(Y).
        "#,
        );
        assert_eq!(g.chain_depth("parent"), Some(0));
        assert_eq!(g.chain_depth("child"), Some(1));
        assert_eq!(g.chain_depth("daughter"), Some(2));
        assert_eq!(g.chain_depth("granddaughter"), Some(3));
        assert_eq!(g.deepest_chain(), 3);
        assert!(g.recursive_predicates().is_empty());
    }

    #[test]
    fn test_self_recursion_detected() {
        let g = graph(
            r#"
            ancestor(X, Y) :- parent(X, Y).
            ancestor(X, Y) :- parent(X, Z), ancestor(Z, Y).
            lineage(X, Y) :- ancestor(X, Y).
        "#,
        );
        assert_eq!(g.recursive_predicates(), vec!["ancestor"]);
        assert_eq!(g.chain_depth("ancestor"), None);
        assert_eq!(g.chain_depth("lineage"), None);
        assert_eq!(g.deepest_chain(), 0);
    }

    #[test]
    fn test_mutual_recursion_detected() {
        let g = graph(
            r#"
            even(X) :- succ(Y, X), odd(Y).
            odd(X) :- succ(Y, X), even(Y).
        "#,
        );
        assert_eq!(g.recursive_predicates(), vec!["even", "odd"]);
        assert_eq!(g.chain_depth("even"), None);
        assert_eq!(g.chain_depth("succ"), Some(0));
    }

    #[test]
    fn test_count_depends_on_inner_goal() {
        let g = graph("siblings(X, N) :- count(sibling(X, Y), N). sibling(X, Y) :- parent(X, A), parent(Y, A).");
        assert_eq!(g.chain_depth("siblings"), Some(2));
    }
}
