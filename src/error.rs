//! Error types for the knowledge base, generator and question synthesizer.

use thiserror::Error;

/// Error type shared by every layer of the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed fact, rule or query text. Nothing is loaded.
    #[error("parse error in `{input}`: {message}")]
    Parse { input: String, message: String },

    /// An assertion would break a store invariant. The store is unchanged.
    #[error("contradiction asserting {fact}: {reason}")]
    Contradiction { fact: String, reason: String },

    /// Retraction of a fact that is not in the store.
    #[error("fact not found: {0}")]
    MissingFact(String),

    /// Resolution went deeper than the configured bound.
    #[error("resolution depth exceeded (limit {limit})")]
    DepthExceeded { limit: usize },

    /// A template names an answer variable its query never mentions.
    #[error("template `{template}`: answer variable {variable} does not occur in its query")]
    UnboundAnswerVariable { template: String, variable: String },

    /// A template whose placeholders, slots or parameters do not line up.
    #[error("template `{template}`: {message}")]
    InvalidTemplate { template: String, message: String },

    /// An instantiation with no answers on a template that requires one.
    #[error("template `{template}`: no answers for `{query}`")]
    EmptyAnswerOnRequiredTemplate { template: String, query: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn contradiction(fact: impl ToString, reason: impl Into<String>) -> Self {
        Error::Contradiction {
            fact: fact.to_string(),
            reason: reason.into(),
        }
    }
}
