//! Template-driven question synthesis.

mod catalog;
mod synthesis;
mod template;

pub use catalog::catalog;
pub use synthesis::{resolve_answers, synthesize, synthesize_with, Question};
pub use template::{Parameter, Slot, Template, ValueKind};
