//! Error types for the orrery-rag crate.
//!
//! Each variant is one failure kind of the question-answering pipeline and
//! maps to exactly one branch of the orchestrator; nothing here is swallowed
//! into a log line.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    /// The store could not be introspected and no cached snapshot exists.
    /// Fatal for the request, recoverable for the process on the next call.
    #[error("Graph schema unavailable: {0}")]
    SchemaUnavailable(String),

    /// The model produced no usable Cypher. Reported, not retried: at
    /// temperature zero a repeat call reproduces the same empty output.
    #[error("Query generation produced no Cypher statement")]
    GenerationEmpty,

    /// The generation provider failed (auth, rate limit, timeout, transport).
    #[error("Query generation failed: {0}")]
    GenerationFailed(String),

    /// The store rejected or failed the generated query. Carries the
    /// offending Cypher for operator diagnosis; never auto-repaired.
    #[error("Query execution failed: {message}")]
    Execution { cypher: String, message: String },

    /// The synthesis provider failed after retrieval succeeded. Callers
    /// degrade to returning the raw records instead of failing the request.
    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),
}

pub type Result<T> = std::result::Result<T, RagError>;
