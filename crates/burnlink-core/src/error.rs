//! Error types for Burnlink Core.

use thiserror::Error;

/// Core errors: token issuance and request validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The operating system random source failed. Never retried with a
    /// weaker source.
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    /// A request failed validation before any cryptographic work began.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A decrypted or submitted secret payload is not well formed.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
