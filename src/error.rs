//! Error types for `vocab_store`.
//!
//! Library code returns [`VocabError`] through the crate-wide [`Result`] alias.
//! Each variant maps to a stable [`ErrorCode`] so the CLI can report
//! machine-readable failures and pick an exit status.

use crate::model::ListId;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, VocabError>;

/// Errors raised by the store, the ordered entry tables and the command layer.
#[derive(Debug, Error)]
pub enum VocabError {
    /// The database was written by a newer build than this one.
    #[error(
        "database schema version {stored} is newer than the supported version {supported}; \
         refusing to open it"
    )]
    VersionConflict { stored: i64, supported: i64 },

    /// A caller passed something unusable. Raised before the database is touched.
    #[error("invalid argument for {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// Persisted data does not satisfy the column contract (e.g. NULL in a required field).
    #[error("data integrity violation in {field}: {detail}")]
    DataIntegrity { field: String, detail: String },

    #[error("list not found: {id}")]
    ListNotFound { id: ListId },

    #[error("list {id} has been deleted")]
    ListDeleted { id: ListId },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl VocabError {
    /// Shorthand for an [`VocabError::InvalidArgument`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`VocabError::DataIntegrity`].
    pub fn integrity(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::DataIntegrity {
            field: field.into(),
            detail: detail.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::VersionConflict { .. } => ErrorCode::VersionConflict,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::DataIntegrity { .. } => ErrorCode::DataIntegrity,
            Self::ListNotFound { .. } => ErrorCode::ListNotFound,
            Self::ListDeleted { .. } => ErrorCode::ListDeleted,
            Self::Storage(_) => ErrorCode::Storage,
            Self::Config(_) | Self::Yaml(_) => ErrorCode::Config,
            Self::Io(_) | Self::Json(_) => ErrorCode::Internal,
        }
    }
}

/// Machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    VersionConflict,
    InvalidArgument,
    DataIntegrity,
    ListNotFound,
    ListDeleted,
    Storage,
    Config,
    Internal,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VersionConflict => "VERSION_CONFLICT",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DataIntegrity => "DATA_INTEGRITY",
            Self::ListNotFound => "LIST_NOT_FOUND",
            Self::ListDeleted => "LIST_DELETED",
            Self::Storage => "STORAGE_FAILURE",
            Self::Config => "CONFIG_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Process exit status used by the `vocab` binary.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InvalidArgument | Self::ListNotFound | Self::ListDeleted => 2,
            Self::VersionConflict => 3,
            Self::DataIntegrity => 4,
            Self::Storage => 5,
            Self::Config => 6,
            Self::Internal => 1,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
