//! Error types for the envelope codec.

use thiserror::Error;

/// Errors that can occur while sealing or opening envelopes.
///
/// No variant ever carries plaintext or key material.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// A key has the wrong length or encoding. Fatal at startup.
    #[error("key configuration error: {0}")]
    KeyConfiguration(String),

    /// The envelope could not be opened: wrong key, wrong password,
    /// tampered bytes or a corrupted blob. Deliberately says nothing more.
    #[error("authentication failed")]
    Authentication,

    /// The blob does not have the shape of the named envelope variant.
    /// Only returned by structural decoding, never by decryption.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// A KDF iteration count below the protocol floor was requested.
    #[error("kdf iteration count {0} is below the minimum of {min}", min = crate::crypto::MIN_PBKDF2_ITERATIONS)]
    WeakIterations(u32),

    /// The AEAD refused to encrypt (plaintext beyond the cipher's limit).
    #[error("encryption failed")]
    Encryption,

    /// The operating system random source failed.
    #[error("random source unavailable: {0}")]
    RandomSource(String),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
