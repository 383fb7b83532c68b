//! Error taxonomy for catalog operations.

use thiserror::Error;

use super::scope::EntityKind;

/// Result alias used throughout the catalog engine
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while reading or mutating the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed input: bad filters, invalid field values, reorder mismatch
    #[error("{0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// Unique-key violation or a scope that changed underneath a write
    #[error("{0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    /// Storage or task failure whose detail must not reach callers
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Task(_))
    }
}

/// Map a SQLite unique-constraint failure to a `Conflict` with the given message.
///
/// Any other storage error passes through unchanged.
pub(crate) fn unique_violation(err: rusqlite::Error, message: impl Into<String>) -> CatalogError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            CatalogError::Conflict(message.into())
        }
        _ => CatalogError::Storage(err),
    }
}
