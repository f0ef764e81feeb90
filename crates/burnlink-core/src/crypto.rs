//! Hashing primitives for Burnlink.
//!
//! The store never sees a capability token, only its SHA-256 digest.
//! SHA-256 is deliberately fast: lookups happen on every read, and the
//! token already carries 256 bits of entropy, so a slow KDF buys nothing.

use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 digest of a capability token.
///
/// This is the primary key of a stored secret. It is deterministic for a
/// given token and cannot be turned back into one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupHash(pub [u8; 32]);

impl LookupHash {
    /// Compute the SHA-256 digest of the given data.
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lower-case hex (the storage key form).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for LookupHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LookupHash({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for LookupHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..8])
    }
}

impl AsRef<[u8]> for LookupHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for LookupHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_value() {
        // SHA-256("abc")
        let h = LookupHash::digest(b"abc");
        assert_eq!(
            h.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_deterministic() {
        let h1 = LookupHash::digest(b"token");
        let h2 = LookupHash::digest(b"token");
        assert_eq!(h1, h2);
        assert_ne!(h1, LookupHash::digest(b"token2"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let h = LookupHash::digest(b"roundtrip");
        assert_eq!(LookupHash::from_hex(&h.to_hex()).unwrap(), h);
        assert!(LookupHash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_debug_is_truncated() {
        let h = LookupHash::from_bytes([0xab; 32]);
        assert_eq!(format!("{:?}", h), "LookupHash(abababab...)");
    }
}
