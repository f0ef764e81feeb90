//! # Burnlink Envelope
//!
//! The envelope codec: how a secret is sealed before it reaches the store
//! and opened after it leaves.
//!
//! ## Envelopes
//!
//! - [`MasterKeyEnvelope`] - AES-256-GCM under a 32-byte key held by the
//!   server operator. Protects against outside observers only.
//! - [`PasswordEnvelope`] - AES-256-GCM under a key derived from a
//!   recipient password with PBKDF2-HMAC-SHA256 (600 000 iterations).
//!   Neither the password nor the derived key is ever stored.
//!
//! ## Wire Format
//!
//! ```text
//! master:   base64( iv[12] || ciphertext || tag[16] )
//! password: base64( salt[16] || iv[12] || ciphertext || tag[16] )
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use burnlink_envelope::{decrypt_with_password, encrypt_with_password};
//!
//! let blob = encrypt_with_password(b"launch codes", "correct horse").unwrap().encode();
//! let plaintext = decrypt_with_password("correct horse", &blob).unwrap();
//! assert_eq!(plaintext, b"launch codes");
//! ```

pub mod crypto;
pub mod envelope;
pub mod error;

pub use crypto::{
    derive_key_from_password, EnvelopeNonce, MasterKey, Salt, SymmetricKey, KEY_LEN,
    MIN_PBKDF2_ITERATIONS, NONCE_LEN, PBKDF2_ITERATIONS, SALT_LEN, TAG_LEN,
};
pub use envelope::{
    decrypt_master, decrypt_with_password, encrypt_master, encrypt_with_password,
    DetachedEnvelope, Envelope, MasterKeyEnvelope, PasswordEnvelope, ALGORITHM,
    MIN_MASTER_BLOB_LEN, MIN_PASSWORD_BLOB_LEN,
};
pub use error::{EnvelopeError, Result};
