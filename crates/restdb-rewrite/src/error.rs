//! Error types for the rewrite crate.

use thiserror::Error;

/// Errors that can occur while rewriting a statement.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// SQL parsing failed.
    #[error("failed to parse SQL: {0}")]
    ParseError(String),

    /// The input contained no statement.
    #[error("no SQL statement found")]
    EmptyStatement,
}
