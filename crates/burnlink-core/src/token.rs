//! Capability tokens: the bearer values that grant one read of a secret.
//!
//! A token is 32 bytes from the operating system CSPRNG, encoded as
//! unpadded base64url so it can travel as a URL path segment. The token is
//! handed to the creator exactly once; the server keeps only
//! [`LookupHash`] of its text form.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::LookupHash;
use crate::error::{CoreError, Result};

/// Number of random bytes in a token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Length of the encoded token text (base64url, no padding).
pub const TOKEN_TEXT_LEN: usize = 43;

/// An unguessable bearer token.
///
/// `Debug` is redacted: the token is a credential and must not reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct CapabilityToken(String);

impl CapabilityToken {
    /// Draw a fresh token from the OS random source.
    ///
    /// Fails if the random source is unavailable. There is no fallback.
    pub fn issue() -> Result<Self> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CoreError::RandomSource(e.to_string()))?;
        Ok(Self::from_random_bytes(&bytes))
    }

    /// Encode raw random bytes as a token.
    pub fn from_random_bytes(bytes: &[u8; TOKEN_BYTES]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Parse a token supplied by a caller (typically a URL path segment).
    ///
    /// Only well-formed 43-character base64url strings are accepted.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != TOKEN_TEXT_LEN {
            return None;
        }
        let decoded = URL_SAFE_NO_PAD.decode(text).ok()?;
        if decoded.len() != TOKEN_BYTES {
            return None;
        }
        Some(Self(text.to_owned()))
    }

    /// The token text, suitable for embedding in a link.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to the underlying random bytes.
    pub fn to_bytes(&self) -> [u8; TOKEN_BYTES] {
        let mut out = [0u8; TOKEN_BYTES];
        // Construction guarantees a valid 32-byte encoding.
        if let Ok(decoded) = URL_SAFE_NO_PAD.decode(&self.0) {
            out.copy_from_slice(&decoded);
        }
        out
    }

    /// Compute the lookup hash under which the secret is stored.
    pub fn lookup_hash(&self) -> LookupHash {
        LookupHash::digest(self.0.as_bytes())
    }

    /// Consume the token, yielding its text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for CapabilityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CapabilityToken(<redacted>)")
    }
}

/// Issue a new capability token.
pub fn issue_token() -> Result<CapabilityToken> {
    CapabilityToken::issue()
}

/// Hash a token into its storage key.
pub fn hash_token(token: &CapabilityToken) -> LookupHash {
    token.lookup_hash()
}
