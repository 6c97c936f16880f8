//! Backward-chaining resolution.
//!
//! Goals are resolved left to right against facts (in assertion order) and
//! then rules (in load order). Choice points live on an explicit stack, so the
//! host call stack never grows with the proof and the depth bound is a plain
//! counter on each goal.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use crate::datalog::{format_goals, Constant, Literal, Term, Variable};
use crate::error::{Error, Result};
use crate::parser::parse_query;

use super::database::Database;
use super::substitution::{rename_clause, Substitution};
use super::unification::{match_fact, unify, unify_literals};

pub const DIF: &str = "dif";
pub const COUNT: &str = "count";

/// Predicates evaluated by the resolver instead of looked up in the store.
pub fn is_builtin(predicate: &str) -> bool {
    matches!(predicate, DIF | COUNT)
}

/// One satisfying assignment, listing the query's variables in order of first occurrence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Binding {
    values: Vec<(Variable, Term)>,
}

impl Binding {
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.values
            .iter()
            .find(|(v, _)| v.name == name)
            .map(|(_, t)| t)
    }

    pub fn constant(&self, name: &str) -> Option<&Constant> {
        self.get(name).and_then(Term::as_constant)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.values.iter().map(|(v, t)| (v, t))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(v, t)| format!("{v} = {t}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// How `query_all` treats a proof cut off by the depth bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryMode {
    /// Pruned branches simply contribute no bindings.
    #[default]
    Lenient,
    /// Any pruned branch turns the whole query into `Error::DepthExceeded`.
    Strict,
}

#[derive(Clone, Debug)]
struct Goal {
    literal: Literal,
    /// Number of rule expansions between the query and this goal.
    depth: usize,
}

#[derive(Clone, Debug)]
struct State {
    /// Pending goals, next goal last.
    goals: Vec<Goal>,
    subst: Substitution,
}

/// Query executor
pub struct QueryEngine<'a> {
    db: &'a Database,
}

impl<'a> QueryEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        QueryEngine { db }
    }

    /// Start resolving a goal conjunction. Nothing runs until the iterator is polled.
    pub fn solve(&self, goals: &[Literal]) -> Solutions<'a> {
        Solutions::new(self.db, goals, 0, 1)
    }
}

/// Lazy stream of bindings for one query. Each call to `next` resumes the
/// search where the previous one stopped; the stream cannot be restarted.
pub struct Solutions<'a> {
    db: &'a Database,
    variables: Vec<Variable>,
    stack: Vec<State>,
    next_scope: usize,
    depth_exceeded: bool,
}

impl<'a> Solutions<'a> {
    fn new(db: &'a Database, goals: &[Literal], depth: usize, first_scope: usize) -> Self {
        let mut variables = Vec::new();
        for goal in goals {
            for term in &goal.terms {
                term.collect_variables(&mut variables);
            }
        }
        let pending = goals
            .iter()
            .rev()
            .map(|literal| Goal {
                literal: literal.clone(),
                depth,
            })
            .collect();
        Solutions {
            db,
            variables,
            stack: vec![State {
                goals: pending,
                subst: Substitution::empty(),
            }],
            next_scope: first_scope,
            depth_exceeded: false,
        }
    }

    /// Whether some branch was cut off by the depth bound so far.
    pub fn depth_exceeded(&self) -> bool {
        self.depth_exceeded
    }

    fn project(&self, subst: &Substitution) -> Binding {
        Binding {
            values: self
                .variables
                .iter()
                .map(|v| (v.clone(), subst.apply_term(&Term::Variable(v.clone()))))
                .collect(),
        }
    }

    fn note_depth_exceeded(&mut self, goal: &Literal) {
        if !self.depth_exceeded {
            warn!(limit = self.db.max_depth(), goal = %goal, "resolution depth bound reached, pruning branch");
        }
        self.depth_exceeded = true;
    }

    /// Replace the next goal of `state` with every way of proving it, keeping
    /// the order facts-then-rules on the stack.
    fn expand(&mut self, state: State, goal: Goal) {
        let walked = state.subst.apply_literal(&goal.literal);
        let mut alternatives = Vec::new();

        for atom in self.db.candidates(&walked) {
            if let Some(subst) = match_fact(&walked, &atom.terms, &state.subst) {
                alternatives.push(State {
                    goals: state.goals.clone(),
                    subst,
                });
            }
        }

        if self.db.is_derived(&walked.predicate) {
            if goal.depth >= self.db.max_depth() {
                self.note_depth_exceeded(&walked);
            } else {
                for rule in self.db.rules_for(&walked.predicate) {
                    let scope = self.next_scope;
                    self.next_scope += 1;
                    let renamed = rename_clause(rule, scope);
                    if let Some(subst) = unify_literals(&renamed.head, &walked, &state.subst) {
                        let mut goals = state.goals.clone();
                        goals.extend(renamed.body.into_iter().rev().map(|literal| Goal {
                            literal,
                            depth: goal.depth + 1,
                        }));
                        alternatives.push(State { goals, subst });
                    }
                }
            }
        }

        self.stack.extend(alternatives.into_iter().rev());
    }

    /// `dif(A, B)`: the two terms are not identical after substitution.
    fn solve_dif(&mut self, state: State, walked: &Literal) {
        if let [a, b] = walked.terms.as_slice() {
            if a != b {
                self.stack.push(state);
            }
        }
    }

    /// `count(Goal, N)`: N is the number of distinct solutions of Goal.
    fn solve_count(&mut self, state: State, walked: &Literal, depth: usize) {
        let [inner, result] = walked.terms.as_slice() else {
            return;
        };
        let Some(inner) = Literal::from_term(inner) else {
            return;
        };

        let mut sub = Solutions::new(self.db, std::slice::from_ref(&inner), depth, self.next_scope);
        let mut distinct = HashSet::new();
        for binding in sub.by_ref() {
            distinct.insert(binding);
        }
        self.next_scope = sub.next_scope;
        self.depth_exceeded |= sub.depth_exceeded;

        let n = Term::Constant(Constant::Integer(distinct.len() as i64));
        if let Some(subst) = unify(result, &n, &state.subst) {
            self.stack.push(State {
                goals: state.goals,
                subst,
            });
        }
    }
}

impl<'a> Iterator for Solutions<'a> {
    type Item = Binding;

    fn next(&mut self) -> Option<Binding> {
        while let Some(mut state) = self.stack.pop() {
            let Some(goal) = state.goals.pop() else {
                return Some(self.project(&state.subst));
            };
            match goal.literal.predicate.as_str() {
                DIF => {
                    let walked = state.subst.apply_literal(&goal.literal);
                    self.solve_dif(state, &walked);
                }
                COUNT => {
                    let walked = state.subst.apply_literal(&goal.literal);
                    self.solve_count(state, &walked, goal.depth);
                }
                _ => self.expand(state, goal),
            }
        }
        None
    }
}

impl Database {
    /// Resolve a goal conjunction lazily.
    pub fn query(&self, goals: &[Literal]) -> Solutions<'_> {
        QueryEngine::new(self).solve(goals)
    }

    /// Parse and resolve a textual query such as `father(X, jan)`.
    pub fn query_str(&self, text: &str) -> Result<Solutions<'_>> {
        let goals = parse_query(text)?;
        Ok(Solutions::new(self, &goals, 0, 1))
    }

    /// Collect every binding. In strict mode a depth cut-off is an error.
    pub fn query_all(&self, goals: &[Literal], mode: QueryMode) -> Result<Vec<Binding>> {
        let mut solutions = self.query(goals);
        let bindings: Vec<Binding> = solutions.by_ref().collect();
        if mode == QueryMode::Strict && solutions.depth_exceeded() {
            return Err(Error::DepthExceeded {
                limit: self.max_depth(),
            });
        }
        Ok(bindings)
    }

    /// Whether the conjunction has at least one solution.
    pub fn holds(&self, goals: &[Literal]) -> bool {
        self.query(goals).next().is_some()
    }

    /// Distinct entities `X` with `predicate(X)`, in first-seen order.
    pub fn names_matching(&self, predicate: &str) -> Vec<String> {
        let goal = Literal::new(predicate, vec![Term::var("X")]);
        let mut seen = HashSet::new();
        self.query(std::slice::from_ref(&goal))
            .filter_map(|b| b.constant("X").map(Constant::surface))
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }
}

/// Format query results for display
pub fn format_query_result(goals: &[Literal], answers: &[Binding]) -> String {
    if answers.is_empty() {
        return "No.".to_string();
    }
    if answers.iter().all(Binding::is_empty) {
        return "Yes.".to_string();
    }
    let mut output = format!("% {}\n", format_goals(goals));
    let lines: Vec<String> = answers.iter().map(|b| b.to_string()).collect();
    output.push_str(&lines.join("\n"));
    output
}
