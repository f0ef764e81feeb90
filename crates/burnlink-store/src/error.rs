//! Error types for the store module.

use burnlink_core::LookupHash;
use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Absence of a record is never an error: `take_and_delete` returns
/// `Ok(None)`. Every variant here means the store could not answer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A live record already exists under this lookup hash.
    #[error("duplicate lookup hash {0}")]
    Duplicate(LookupHash),

    /// The backend could not be reached (poisoned lock, failed worker).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Invalid data in storage or in a request to store.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Database(_) | StoreError::Unavailable(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
