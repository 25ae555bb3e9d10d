//! Error types for quern-core

use compact_str::{CompactString, ToCompactString};
use thiserror::Error;

/// Core error type for query building, compilation and execution.
#[derive(Debug, Error)]
pub enum QuernError {
    /// The builder was used incorrectly (bad operator, bad direction, ...).
    /// Surfaced by `to_sql` before compilation is attempted.
    #[error("usage error: {0}")]
    Usage(CompactString),

    /// The AST is in a state the grammar cannot render.
    #[error("compile error: {0}")]
    Compile(CompactString),

    /// Propagated verbatim from the executor.
    #[error("execute error: {0}")]
    Execute(CompactString),

    /// The executor reported cancellation; remaining batch work is skipped.
    #[error("execution cancelled: {0}")]
    Cancelled(CompactString),

    /// A table or column was missing during schema introspection.
    #[error("introspection error: {0}")]
    Introspection(CompactString),

    /// No rows returned when at least one was expected.
    #[error("no rows found")]
    NotFound,

    /// No grammar registered under the requested driver name.
    #[error("unknown driver: {0}")]
    UnknownDriver(CompactString),

    /// Model registry failure.
    #[error("model error: {0}")]
    Model(CompactString),

    /// Model schema JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuernError {
    /// Builds a [`QuernError::Usage`] from any displayable message.
    pub fn usage(msg: impl core::fmt::Display) -> Self {
        Self::Usage(msg.to_compact_string())
    }

    /// Builds a [`QuernError::Compile`] from any displayable message.
    pub fn compile(msg: impl core::fmt::Display) -> Self {
        Self::Compile(msg.to_compact_string())
    }

    /// Builds a [`QuernError::Execute`] from any displayable message.
    pub fn execute(msg: impl core::fmt::Display) -> Self {
        Self::Execute(msg.to_compact_string())
    }

    /// Builds a [`QuernError::Introspection`] from any displayable message.
    pub fn introspection(msg: impl core::fmt::Display) -> Self {
        Self::Introspection(msg.to_compact_string())
    }

    /// Builds a [`QuernError::Model`] from any displayable message.
    pub fn model(msg: impl core::fmt::Display) -> Self {
        Self::Model(msg.to_compact_string())
    }

    /// Whether this error carries the executor's cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Result type for quern operations.
pub type Result<T> = core::result::Result<T, QuernError>;
