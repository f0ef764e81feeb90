//! # Burnlink Core
//!
//! Pure primitives for Burnlink: capability tokens, lookup hashes, secret
//! payloads and request validation.
//!
//! This crate contains no I/O, no storage and no encryption. It defines the
//! values that the envelope, store and vault crates agree on.
//!
//! ## Key Types
//!
//! - [`CapabilityToken`] - The unguessable bearer value in a share link
//! - [`LookupHash`] - SHA-256 of a token; the only form the store sees
//! - [`SecretPayload`] - Text plus image attachments, as JSON
//! - [`Limits`] - Size and lifetime bounds checked before any crypto work
//! - [`Clock`] - Time source used for expiry

pub mod crypto;
pub mod error;
pub mod payload;
pub mod token;
pub mod types;
pub mod validation;

pub use crypto::LookupHash;
pub use error::{CoreError, Result};
pub use payload::{ImageKind, SecretPayload};
pub use token::{hash_token, issue_token, CapabilityToken, TOKEN_BYTES, TOKEN_TEXT_LEN};
pub use types::{now_millis, system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use validation::{validate_password, CreateSecretRequest, DepositRequest, Limits};
