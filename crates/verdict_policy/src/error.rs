//! Error types for the decision engine.
//!
//! Expected evaluation failures (missing attributes, type mismatches, bad
//! arity) are carried as [`Status`](verdict_core::Status) values inside
//! results. The types here cover configuration mistakes and the faults that
//! abort an evaluation.

use crate::context::PipError;
use verdict_core::{CoreError, Identifier};

/// Result of an evaluation step that may hit an unrecoverable fault
pub type EvaluationOutcome<T> = Result<T, EvaluationError>;

/// Errors raised while assembling registries, policies or configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// A function with this id is already registered
    #[error("Function already registered: {0}")]
    DuplicateFunction(Identifier),

    /// A combining algorithm with this id is already registered
    #[error("Combining algorithm already registered: {0}")]
    DuplicateAlgorithm(Identifier),

    /// No function with this id
    #[error("Unknown function: {0}")]
    UnknownFunction(Identifier),

    /// No combining algorithm with this id
    #[error("Unknown combining algorithm: {0}")]
    UnknownAlgorithm(Identifier),

    /// Malformed engine configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Value model error
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Faults that abort evaluation instead of producing a status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    /// A node passed validation but has no combining algorithm
    #[error("No combining algorithm on {node}")]
    MissingCombiningAlgorithm {
        /// Id of the node
        node: String,
    },

    /// The attribute source failed outright
    #[error("Attribute lookup failed: {0}")]
    Pip(#[from] PipError),

    /// Broken engine invariant
    #[error("Internal error: {0}")]
    Internal(String),
}
