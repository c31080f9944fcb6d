use miette::Diagnostic;
use orgshift_db::DbError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration-specific errors
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Invalid argument '{argument}': {reason}")]
    #[diagnostic(
        code(orgshift::invalid_argument),
        help("Identifiers must be non-empty and may not contain '/'")
    )]
    InvalidArgument { argument: String, reason: String },

    #[error("Organization '{tenant_id}' not found")]
    #[diagnostic(
        code(orgshift::tenant_not_found),
        help("Tenants are created by the application; check organizations/{tenant_id} exists")
    )]
    TenantNotFound { tenant_id: String },

    #[error("User document {path} does not exist")]
    #[diagnostic(code(orgshift::user_not_found))]
    UserNotFound { path: String },

    #[error("Batch commit #{group_index} failed after {committed_ops} operations were committed")]
    #[diagnostic(
        code(orgshift::commit_failed),
        help(
            "Earlier groups stay committed. Writes merge, so re-running the same command converges"
        )
    )]
    CommitFailed {
        group_index: usize,
        committed_ops: usize,
        #[source]
        cause: DbError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] DbError),

    #[error("Configuration error for field '{field}'")]
    #[diagnostic(
        code(orgshift::configuration_error),
        help("Check configuration file at {config_path}\nExpected: {expected}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },
}

impl CoreError {
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub fn tenant_not_found(tenant_id: impl Into<String>) -> Self {
        Self::TenantNotFound {
            tenant_id: tenant_id.into(),
        }
    }

    /// Whether the error was raised before touching the store.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
