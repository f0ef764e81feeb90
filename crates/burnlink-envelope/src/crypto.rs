//! Cryptographic primitives for the envelope codec.
//!
//! Provides AES-256-GCM authenticated encryption and PBKDF2-HMAC-SHA256
//! password key derivation, with the exact parameters a WebCrypto client
//! uses so that either side can seal and the other can open.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{EnvelopeError, Result};

/// Symmetric key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// PBKDF2 salt length in bytes.
pub const SALT_LEN: usize = 16;

/// PBKDF2 iteration count shared by every sealer and opener.
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Lowest iteration count [`derive_key_from_password`] will accept.
pub const MIN_PBKDF2_ITERATIONS: u32 = 200_000;

/// Fill `buf` from the OS random source.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| EnvelopeError::RandomSource(e.to_string()))
}

/// A 256-bit AES-GCM key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly [`KEY_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            EnvelopeError::KeyConfiguration(format!(
                "key must be {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }

    /// Encrypt `buffer` in place, returning the detached tag.
    pub fn seal_in_place(&self, nonce: &EnvelopeNonce, buffer: &mut [u8]) -> Result<[u8; TAG_LEN]> {
        let tag = self
            .cipher()
            .encrypt_in_place_detached(Nonce::from_slice(&nonce.0), b"", buffer)
            .map_err(|_| EnvelopeError::Encryption)?;
        let mut out = [0u8; TAG_LEN];
        out.copy_from_slice(&tag);
        Ok(out)
    }

    /// Verify `tag` and decrypt `buffer` in place.
    ///
    /// On failure the buffer contents are unspecified and must be discarded.
    pub fn open_in_place(
        &self,
        nonce: &EnvelopeNonce,
        buffer: &mut [u8],
        tag: &[u8; TAG_LEN],
    ) -> Result<()> {
        self.cipher()
            .decrypt_in_place_detached(Nonce::from_slice(&nonce.0), b"", buffer, Tag::from_slice(tag))
            .map_err(|_| EnvelopeError::Authentication)
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// The server-held key for secrets created without a password.
#[derive(Clone)]
pub struct MasterKey(SymmetricKey);

impl MasterKey {
    /// Generate a new random master key.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        fill_random(&mut bytes)?;
        let key = Self(SymmetricKey::from_bytes(bytes));
        bytes.zeroize();
        Ok(key)
    }

    /// Create from raw bytes; anything other than 32 bytes is a
    /// configuration error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        SymmetricKey::from_slice(bytes).map(Self)
    }

    /// Decode a standard base64 key, as stored in deployment configuration.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut bytes = STANDARD.decode(encoded.trim()).map_err(|_| {
            EnvelopeError::KeyConfiguration("master key is not valid base64".into())
        })?;
        let key = Self::from_slice(&bytes).map_err(|_| {
            EnvelopeError::KeyConfiguration(format!(
                "master key must decode to {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            ))
        });
        bytes.zeroize();
        key
    }

    /// Encode as standard base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0.as_bytes())
    }

    /// The underlying AEAD key.
    pub fn key(&self) -> &SymmetricKey {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// A 96-bit AES-GCM nonce. Must never repeat under one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeNonce(pub [u8; NONCE_LEN]);

impl EnvelopeNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; NONCE_LEN];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// A 128-bit PBKDF2 salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt(pub [u8; SALT_LEN]);

impl Salt {
    /// Generate a new random salt.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SALT_LEN];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

/// Derive a 256-bit key from a password with PBKDF2-HMAC-SHA256.
///
/// Deterministic for identical inputs. This is intentionally slow; run it
/// off the async executor.
pub fn derive_key_from_password(password: &str, salt: &Salt, iterations: u32) -> Result<SymmetricKey> {
    if iterations < MIN_PBKDF2_ITERATIONS {
        return Err(EnvelopeError::WeakIterations(iterations));
    }
    let mut out = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt.0, iterations, &mut out);
    let key = SymmetricKey::from_bytes(out);
    out.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_in_place() {
        let key = SymmetricKey::from_bytes([0x42; KEY_LEN]);
        let nonce = EnvelopeNonce::generate().unwrap();
        let mut buffer = b"hello, world!".to_vec();

        let tag = key.seal_in_place(&nonce, &mut buffer).unwrap();
        assert_ne!(buffer, b"hello, world!");

        key.open_in_place(&nonce, &mut buffer, &tag).unwrap();
        assert_eq!(buffer, b"hello, world!");
    }

    #[test]
    fn test_open_wrong_key_fails() {
        let key1 = SymmetricKey::from_bytes([0x01; KEY_LEN]);
        let key2 = SymmetricKey::from_bytes([0x02; KEY_LEN]);
        let nonce = EnvelopeNonce::generate().unwrap();
        let mut buffer = b"secret".to_vec();
        let tag = key1.seal_in_place(&nonce, &mut buffer).unwrap();

        let err = key2.open_in_place(&nonce, &mut buffer, &tag).unwrap_err();
        assert!(matches!(err, EnvelopeError::Authentication));
    }

    #[test]
    fn test_master_key_length_enforced() {
        assert!(matches!(
            MasterKey::from_slice(&[0u8; 16]),
            Err(EnvelopeError::KeyConfiguration(_))
        ));
        assert!(MasterKey::from_slice(&[0u8; 32]).is_ok());
        assert!(matches!(
            MasterKey::from_slice(&[0u8; 33]),
            Err(EnvelopeError::KeyConfiguration(_))
        ));
    }

    #[test]
    fn test_master_key_base64() {
        let key = MasterKey::generate().unwrap();
        let encoded = key.to_base64();
        let decoded = MasterKey::from_base64(&encoded).unwrap();
        assert_eq!(key.key().as_bytes(), decoded.key().as_bytes());

        // 16 bytes of zeros
        let short = STANDARD.encode([0u8; 16]);
        assert!(matches!(
            MasterKey::from_base64(&short),
            Err(EnvelopeError::KeyConfiguration(_))
        ));
        assert!(matches!(
            MasterKey::from_base64("not base64 at all!"),
            Err(EnvelopeError::KeyConfiguration(_))
        ));
    }

    #[test]
    fn test_key_debug_redacted() {
        let key = MasterKey::from_slice(&[0xaa; 32]).unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains("aa"));
        assert!(!debug.contains("170"));
    }

    #[test]
    fn test_derivation_deterministic() {
        let salt = Salt::from_bytes([0x07; SALT_LEN]);
        let k1 = derive_key_from_password("pw123", &salt, MIN_PBKDF2_ITERATIONS).unwrap();
        let k2 = derive_key_from_password("pw123", &salt, MIN_PBKDF2_ITERATIONS).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());

        let k3 = derive_key_from_password("pw124", &salt, MIN_PBKDF2_ITERATIONS).unwrap();
        assert_ne!(k1.as_bytes(), k3.as_bytes());

        let other_salt = Salt::from_bytes([0x08; SALT_LEN]);
        let k4 = derive_key_from_password("pw123", &other_salt, MIN_PBKDF2_ITERATIONS).unwrap();
        assert_ne!(k1.as_bytes(), k4.as_bytes());
    }

    #[test]
    fn test_weak_iterations_rejected() {
        let salt = Salt::from_bytes([0u8; SALT_LEN]);
        assert!(matches!(
            derive_key_from_password("pw", &salt, 10_000),
            Err(EnvelopeError::WeakIterations(10_000))
        ));
    }

    #[test]
    fn test_nonces_do_not_repeat() {
        let nonces: std::collections::HashSet<[u8; NONCE_LEN]> = (0..1000)
            .map(|_| EnvelopeNonce::generate().unwrap().0)
            .collect();
        assert_eq!(nonces.len(), 1000);
    }
}
