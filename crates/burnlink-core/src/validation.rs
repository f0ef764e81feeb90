//! Request validation.
//!
//! Every request is checked against [`Limits`] before any cryptographic
//! work begins, so oversized or malformed input never reaches the KDF.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Size and lifetime bounds applied to incoming requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest plaintext accepted by `create_secret`, in bytes.
    pub max_plaintext_bytes: usize,
    /// Largest sealed envelope blob accepted by `deposit_sealed`, in characters.
    pub max_sealed_bytes: usize,
    /// Most image attachments in a [`crate::SecretPayload`].
    pub max_attachments: usize,
    /// Largest decoded attachment, in bytes.
    pub max_attachment_bytes: usize,
    /// Shortest permitted time-to-live, in seconds.
    pub min_ttl_seconds: u64,
    /// Longest permitted time-to-live, in seconds.
    pub max_ttl_seconds: u64,
    /// Time-to-live used when a request does not specify one.
    pub default_ttl_seconds: u64,
    /// Longest accepted password, in bytes.
    pub max_password_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_plaintext_bytes: 16 * 1024 * 1024,
            max_sealed_bytes: 32 * 1024 * 1024,
            max_attachments: 20,
            max_attachment_bytes: 10 * 1024 * 1024,
            min_ttl_seconds: 1,
            max_ttl_seconds: 7 * 24 * 60 * 60,
            default_ttl_seconds: 3600,
            max_password_bytes: 1024,
        }
    }
}

impl Limits {
    /// Resolve an optional TTL against the configured bounds.
    pub fn resolve_ttl(&self, ttl_seconds: Option<u64>) -> Result<Duration> {
        let ttl = ttl_seconds.unwrap_or(self.default_ttl_seconds);
        if ttl < self.min_ttl_seconds || ttl > self.max_ttl_seconds {
            return Err(CoreError::InvalidRequest(format!(
                "ttl_seconds must be between {} and {}, got {}",
                self.min_ttl_seconds, self.max_ttl_seconds, ttl
            )));
        }
        Ok(Duration::from_secs(ttl))
    }
}

/// A request to create a secret from plaintext.
#[derive(Clone, Default)]
pub struct CreateSecretRequest {
    /// The bytes to protect.
    pub plaintext: Vec<u8>,
    /// Optional recipient password. When present the secret is sealed
    /// under a password-derived key instead of the master key.
    pub password: Option<String>,
    /// Requested lifetime; `None` uses [`Limits::default_ttl_seconds`].
    pub ttl_seconds: Option<u64>,
}

impl std::fmt::Debug for CreateSecretRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSecretRequest")
            .field("plaintext_len", &self.plaintext.len())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl CreateSecretRequest {
    /// Start a request for the given plaintext.
    pub fn new(plaintext: impl Into<Vec<u8>>) -> Self {
        Self {
            plaintext: plaintext.into(),
            password: None,
            ttl_seconds: None,
        }
    }

    /// Protect the secret with a password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the time-to-live in seconds.
    pub fn ttl_seconds(mut self, ttl: u64) -> Self {
        self.ttl_seconds = Some(ttl);
        self
    }

    /// Check the request against `limits`.
    pub fn validate(&self, limits: &Limits) -> Result<Duration> {
        if self.plaintext.len() > limits.max_plaintext_bytes {
            return Err(CoreError::InvalidRequest(format!(
                "plaintext exceeds {} bytes",
                limits.max_plaintext_bytes
            )));
        }
        if let Some(password) = &self.password {
            validate_password(password, limits)?;
        }
        limits.resolve_ttl(self.ttl_seconds)
    }
}

/// A request to store an envelope that the client already sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    /// The base64 envelope blob.
    pub secret: String,
    /// Whether the blob is a password envelope.
    #[serde(default)]
    pub password_protected: bool,
    /// Requested lifetime; `None` uses [`Limits::default_ttl_seconds`].
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl DepositRequest {
    /// Check size and lifetime bounds. Envelope structure is checked by the
    /// caller, which knows the wire format.
    pub fn validate(&self, limits: &Limits) -> Result<Duration> {
        if self.secret.trim().is_empty() {
            return Err(CoreError::InvalidRequest("missing encrypted secret".into()));
        }
        if self.secret.len() > limits.max_sealed_bytes {
            return Err(CoreError::InvalidRequest(format!(
                "sealed secret exceeds {} bytes",
                limits.max_sealed_bytes
            )));
        }
        limits.resolve_ttl(self.ttl_seconds)
    }
}

/// Reject blank or oversized passwords.
pub fn validate_password(password: &str, limits: &Limits) -> Result<()> {
    if password.trim().is_empty() {
        return Err(CoreError::InvalidRequest("password must not be blank".into()));
    }
    if password.len() > limits.max_password_bytes {
        return Err(CoreError::InvalidRequest(format!(
            "password exceeds {} bytes",
            limits.max_password_bytes
        )));
    }
    Ok(())
}
