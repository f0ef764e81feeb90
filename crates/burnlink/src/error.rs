//! Error types for the vault.

use burnlink_core::CoreError;
use burnlink_envelope::EnvelopeError;
use burnlink_store::StoreError;
use thiserror::Error;

/// Errors that can occur during vault operations.
///
/// Messages never contain plaintext, tokens, passwords or key material.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The master key is missing, mis-sized or not base64. Fatal at startup.
    #[error("key configuration error: {0}")]
    KeyConfiguration(String),

    /// Any other invalid setting.
    #[error("configuration error: {0}")]
    Config(String),

    /// The envelope would not open. Wrong password, wrong key and corrupted
    /// ciphertext are indistinguishable.
    #[error("authentication failed")]
    Authentication,

    /// No retrievable secret for this token: never issued, already read,
    /// expired, or not a well-formed token.
    #[error("secret is gone or never existed")]
    Gone,

    /// A freshly issued token collided with a live record.
    #[error("duplicate token")]
    DuplicateToken,

    /// The store could not answer. Distinct from `Gone`.
    #[error("storage error: {0}")]
    Storage(#[source] StoreError),

    /// Rejected before any cryptographic work.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The operating system random source failed.
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    /// A blocking worker failed or the cipher refused its input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            VaultError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<StoreError> for VaultError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => VaultError::DuplicateToken,
            other => VaultError::Storage(other),
        }
    }
}

impl From<CoreError> for VaultError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RandomSource(msg) => VaultError::RandomSource(msg),
            CoreError::InvalidRequest(msg) | CoreError::InvalidPayload(msg) => {
                VaultError::InvalidRequest(msg)
            }
        }
    }
}

impl From<EnvelopeError> for VaultError {
    /// Mapping for envelopes supplied by a caller. Envelopes read back from
    /// the store go through [`VaultError::from_stored_envelope`] instead.
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::KeyConfiguration(msg) => VaultError::KeyConfiguration(msg),
            EnvelopeError::Authentication => VaultError::Authentication,
            EnvelopeError::Malformed(msg) => VaultError::InvalidRequest(msg),
            EnvelopeError::RandomSource(msg) => VaultError::RandomSource(msg),
            other @ (EnvelopeError::WeakIterations(_) | EnvelopeError::Encryption) => {
                VaultError::Internal(other.to_string())
            }
        }
    }
}

impl VaultError {
    /// Mapping for envelopes that were stored earlier: a malformed blob is
    /// reported exactly like a wrong password.
    pub(crate) fn from_stored_envelope(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Malformed(_) => VaultError::Authentication,
            other => other.into(),
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
