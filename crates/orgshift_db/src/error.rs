//! Error types for the document store layer.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for document store operations.
pub type DbResult<T> = Result<T, DbError>;

/// Document store error types.
#[derive(Debug, Error, Diagnostic)]
pub enum DbError {
    /// SQLite/sqlx error
    #[error("Database error: {0}")]
    #[diagnostic(code(orgshift_db::database))]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(orgshift_db::migration))]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored field payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    #[diagnostic(code(orgshift_db::serde))]
    Serialization(#[from] serde_json::Error),

    /// IO error (creating the store directory)
    #[error("IO error: {0}")]
    #[diagnostic(code(orgshift_db::io))]
    Io(#[from] std::io::Error),

    /// A path or identifier that cannot address a document or collection
    #[error("Invalid path '{path}': {reason}")]
    #[diagnostic(
        code(orgshift_db::invalid_path),
        help("Paths alternate collection and document ids separated by '/', ids may not be empty")
    )]
    InvalidPath { path: String, reason: String },

    /// A batch exceeding the provider's per-commit ceiling
    #[error("Batch of {ops} operations exceeds the store limit of {max}")]
    #[diagnostic(code(orgshift_db::batch_too_large))]
    BatchTooLarge { ops: usize, max: usize },

    /// The store refused a commit
    #[error("Commit rejected: {reason}")]
    #[diagnostic(code(orgshift_db::commit_rejected))]
    CommitRejected { reason: String },
}

impl DbError {
    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a commit rejected error.
    pub fn commit_rejected(reason: impl Into<String>) -> Self {
        Self::CommitRejected {
            reason: reason.into(),
        }
    }
}
