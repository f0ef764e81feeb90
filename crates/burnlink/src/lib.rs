//! # Burnlink
//!
//! Burn-after-reading secret sharing: a secret is sealed, stored under the
//! hash of an unguessable token, and destroyed by the first read.
//!
//! ## Overview
//!
//! - **Tokens**: 256 random bits, base64url encoded; possession is the
//!   only authorization
//! - **Envelopes**: AES-256-GCM, keyed either by a server master key or by
//!   a PBKDF2-derived password key
//! - **Stores**: atomic take-and-delete, so exactly one reader ever wins
//! - **Expiry**: every secret carries a TTL and reads as gone once it lapses
//!
//! ## Usage
//!
//! ```rust,no_run
//! use burnlink::{CreateSecretRequest, Vault, VaultConfig, VaultError};
//! use burnlink::store::SqliteStore;
//!
//! async fn example() -> Result<(), VaultError> {
//!     let store = SqliteStore::open("burnlink.db")?;
//!     let vault = Vault::new(store, VaultConfig::from_env()?)?;
//!
//!     let created = vault
//!         .create_secret(CreateSecretRequest::new("secret").password("pw123").ttl_seconds(600))
//!         .await?;
//!
//!     // The first read returns the plaintext...
//!     let plaintext = vault.retrieve_secret(created.token.as_str(), Some("pw123")).await?;
//!     assert_eq!(plaintext, b"secret");
//!
//!     // ...and every later read finds nothing.
//!     assert!(matches!(
//!         vault.retrieve_secret(created.token.as_str(), Some("pw123")).await,
//!         Err(VaultError::Gone)
//!     ));
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `burnlink::core` - Tokens, hashes, payloads and request validation
//! - `burnlink::envelope` - Sealing and the envelope wire formats
//! - `burnlink::store` - Storage abstraction, SQLite and the sweeper

pub mod config;
pub mod error;
pub mod vault;

// Re-export component crates
pub use burnlink_core as core;
pub use burnlink_envelope as envelope;
pub use burnlink_store as store;

// Re-export main types for convenience
pub use config::VaultConfig;
pub use error::{Result, VaultError};
pub use vault::{ClaimedSecret, CreatedSecret, Vault};

// Re-export commonly used component types
pub use burnlink_core::{
    CapabilityToken, CreateSecretRequest, DepositRequest, Limits, LookupHash, SecretPayload,
};
pub use burnlink_envelope::{Envelope, MasterKey};
pub use burnlink_store::{CapabilityStore, MemoryStore, SqliteStore};
