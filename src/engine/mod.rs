pub mod database;
pub mod dependency;
pub mod invariants;
pub mod plan;
pub mod query;
pub mod substitution;
pub mod unification;

// Re-export commonly used types
pub use database::{Database, GroundAtom, DEFAULT_MAX_DEPTH};
pub use dependency::DependencyGraph;
pub use plan::{PlanStep, QueryPlan};
pub use query::{format_query_result, Binding, QueryEngine, QueryMode, Solutions};
pub use substitution::Substitution;
pub use unification::{unify, unify_literals};
