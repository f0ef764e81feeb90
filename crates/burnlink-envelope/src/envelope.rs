//! Envelope formats.
//!
//! Two envelopes exist, and their byte layouts are a wire contract shared
//! with browser clients:
//!
//! ```text
//! master:   base64( iv[12] || ciphertext || tag[16] )
//! password: base64( salt[16] || iv[12] || ciphertext || tag[16] )
//! ```
//!
//! Both use the standard base64 alphabet with padding. The layout carries
//! no version byte and is frozen: a new format gets a new [`Envelope`]
//! variant instead.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto::{
    derive_key_from_password, EnvelopeNonce, MasterKey, Salt, SymmetricKey, NONCE_LEN,
    PBKDF2_ITERATIONS, SALT_LEN, TAG_LEN,
};
use crate::error::{EnvelopeError, Result};

/// Smallest decoded master blob: nonce plus tag, empty ciphertext.
pub const MIN_MASTER_BLOB_LEN: usize = NONCE_LEN + TAG_LEN;

/// Smallest decoded password blob: salt, nonce and tag, empty ciphertext.
pub const MIN_PASSWORD_BLOB_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Algorithm label used in the detached JSON form.
pub const ALGORITHM: &str = "AES-256-GCM";

/// A secret sealed under the server's master key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterKeyEnvelope {
    /// Nonce used for encryption.
    pub nonce: EnvelopeNonce,
    /// Encrypted bytes, without the tag.
    pub ciphertext: Vec<u8>,
    /// AES-GCM authentication tag.
    pub tag: [u8; TAG_LEN],
}

impl MasterKeyEnvelope {
    /// Seal `plaintext` with a caller-chosen nonce.
    ///
    /// The nonce must be unique for this key. Production code goes through
    /// [`encrypt_master`], which draws a fresh one.
    pub fn seal_with_nonce(plaintext: &[u8], key: &MasterKey, nonce: EnvelopeNonce) -> Result<Self> {
        let mut ciphertext = plaintext.to_vec();
        let tag = key.key().seal_in_place(&nonce, &mut ciphertext)?;
        Ok(Self {
            nonce,
            ciphertext,
            tag,
        })
    }

    /// Verify and decrypt.
    pub fn open(&self, key: &MasterKey) -> Result<Vec<u8>> {
        let mut buffer = self.ciphertext.clone();
        key.key().open_in_place(&self.nonce, &mut buffer, &self.tag)?;
        Ok(buffer)
    }

    /// Pack into `iv || ciphertext || tag`.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.ciphertext.len() + TAG_LEN);
        out.extend_from_slice(&self.nonce.0);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    /// Unpack from `iv || ciphertext || tag`.
    pub fn from_packed_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_MASTER_BLOB_LEN {
            return Err(EnvelopeError::Malformed(format!(
                "master envelope needs at least {} bytes, got {}",
                MIN_MASTER_BLOB_LEN,
                bytes.len()
            )));
        }
        let (nonce, rest) = bytes.split_at(NONCE_LEN);
        let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LEN);
        Ok(Self {
            nonce: EnvelopeNonce::from_bytes(to_array(nonce)),
            ciphertext: ciphertext.to_vec(),
            tag: to_array(tag),
        })
    }

    /// Encode as base64 text.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_packed_bytes())
    }

    /// Decode from base64 text.
    pub fn decode(text: &str) -> Result<Self> {
        let bytes = decode_base64(text)?;
        Self::from_packed_bytes(&bytes)
    }

    /// Split into the detached JSON form.
    pub fn to_detached(&self) -> DetachedEnvelope {
        DetachedEnvelope {
            ciphertext: STANDARD.encode(&self.ciphertext),
            iv: STANDARD.encode(self.nonce.0),
            tag: STANDARD.encode(self.tag),
            algorithm: ALGORITHM.to_string(),
        }
    }

    /// Rebuild from the detached JSON form.
    pub fn from_detached(detached: &DetachedEnvelope) -> Result<Self> {
        if detached.algorithm != ALGORITHM {
            return Err(EnvelopeError::Malformed(format!(
                "unsupported algorithm {}",
                detached.algorithm
            )));
        }
        let nonce = decode_base64(&detached.iv)?;
        let tag = decode_base64(&detached.tag)?;
        if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
            return Err(EnvelopeError::Malformed("bad iv or tag length".into()));
        }
        Ok(Self {
            nonce: EnvelopeNonce::from_bytes(to_array(&nonce)),
            ciphertext: decode_base64(&detached.ciphertext)?,
            tag: to_array(&tag),
        })
    }
}

/// The master envelope with each field base64-encoded separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachedEnvelope {
    /// Encrypted bytes, without the tag.
    pub ciphertext: String,
    /// The 12-byte nonce.
    pub iv: String,
    /// The 16-byte tag.
    pub tag: String,
    /// Always `"AES-256-GCM"`.
    pub algorithm: String,
}

/// A secret sealed under a key derived from a recipient password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordEnvelope {
    /// PBKDF2 salt.
    pub salt: Salt,
    /// Nonce used for encryption.
    pub nonce: EnvelopeNonce,
    /// Encrypted bytes, without the tag.
    pub ciphertext: Vec<u8>,
    /// AES-GCM authentication tag.
    pub tag: [u8; TAG_LEN],
}

impl PasswordEnvelope {
    /// Seal with a caller-chosen salt and nonce.
    pub fn seal_with(
        plaintext: &[u8],
        password: &str,
        salt: Salt,
        nonce: EnvelopeNonce,
    ) -> Result<Self> {
        let key = derive_key_from_password(password, &salt, PBKDF2_ITERATIONS)?;
        Self::seal_with_key(plaintext, &key, salt, nonce)
    }

    /// Seal with an already-derived key.
    pub fn seal_with_key(
        plaintext: &[u8],
        key: &SymmetricKey,
        salt: Salt,
        nonce: EnvelopeNonce,
    ) -> Result<Self> {
        let mut ciphertext = plaintext.to_vec();
        let tag = key.seal_in_place(&nonce, &mut ciphertext)?;
        Ok(Self {
            salt,
            nonce,
            ciphertext,
            tag,
        })
    }

    /// Re-derive the key from the embedded salt, verify and decrypt.
    pub fn open(&self, password: &str) -> Result<Vec<u8>> {
        let key = derive_key_from_password(password, &self.salt, PBKDF2_ITERATIONS)?;
        self.open_with_key(&key)
    }

    /// Verify and decrypt with an already-derived key.
    pub fn open_with_key(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        let mut buffer = self.ciphertext.clone();
        key.open_in_place(&self.nonce, &mut buffer, &self.tag)?;
        Ok(buffer)
    }

    /// Pack into `salt || iv || ciphertext || tag`.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(SALT_LEN + NONCE_LEN + self.ciphertext.len() + TAG_LEN);
        out.extend_from_slice(&self.salt.0);
        out.extend_from_slice(&self.nonce.0);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    /// Unpack from `salt || iv || ciphertext || tag`.
    pub fn from_packed_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_PASSWORD_BLOB_LEN {
            return Err(EnvelopeError::Malformed(format!(
                "password envelope needs at least {} bytes, got {}",
                MIN_PASSWORD_BLOB_LEN,
                bytes.len()
            )));
        }
        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (nonce, rest) = rest.split_at(NONCE_LEN);
        let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LEN);
        Ok(Self {
            salt: Salt::from_bytes(to_array(salt)),
            nonce: EnvelopeNonce::from_bytes(to_array(nonce)),
            ciphertext: ciphertext.to_vec(),
            tag: to_array(tag),
        })
    }

    /// Encode as base64 text.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_packed_bytes())
    }

    /// Decode from base64 text.
    pub fn decode(text: &str) -> Result<Self> {
        let bytes = decode_base64(text)?;
        Self::from_packed_bytes(&bytes)
    }
}

/// Either envelope variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Sealed under the server master key.
    Master(MasterKeyEnvelope),
    /// Sealed under a password-derived key.
    Password(PasswordEnvelope),
}

impl Envelope {
    /// Whether opening requires a password.
    pub fn is_password_protected(&self) -> bool {
        matches!(self, Self::Password(_))
    }

    /// Encode as base64 text.
    pub fn encode(&self) -> String {
        match self {
            Self::Master(e) => e.encode(),
            Self::Password(e) => e.encode(),
        }
    }

    /// Decode base64 text. The variant is not recoverable from the bytes,
    /// so the caller supplies it.
    pub fn decode(text: &str, password_protected: bool) -> Result<Self> {
        if password_protected {
            PasswordEnvelope::decode(text).map(Self::Password)
        } else {
            MasterKeyEnvelope::decode(text).map(Self::Master)
        }
    }
}

/// Seal under the master key with a fresh random nonce.
pub fn encrypt_master(plaintext: &[u8], key: &MasterKey) -> Result<MasterKeyEnvelope> {
    MasterKeyEnvelope::seal_with_nonce(plaintext, key, EnvelopeNonce::generate()?)
}

/// Open a master envelope.
pub fn decrypt_master(envelope: &MasterKeyEnvelope, key: &MasterKey) -> Result<Vec<u8>> {
    envelope.open(key)
}

/// Seal under a password with a fresh random salt and nonce.
pub fn encrypt_with_password(plaintext: &[u8], password: &str) -> Result<PasswordEnvelope> {
    PasswordEnvelope::seal_with(plaintext, password, Salt::generate()?, EnvelopeNonce::generate()?)
}

/// Open a packed password blob.
///
/// A blob that is not base64, is too short, or fails authentication all
/// produce the same [`EnvelopeError::Authentication`].
pub fn decrypt_with_password(password: &str, packed: &str) -> Result<Vec<u8>> {
    let envelope = PasswordEnvelope::decode(packed).map_err(|_| EnvelopeError::Authentication)?;
    envelope.open(password)
}

fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|_| EnvelopeError::Malformed("not valid base64".into()))
}

fn to_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}
