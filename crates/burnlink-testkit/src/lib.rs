//! # Burnlink Testkit
//!
//! Testing utilities for Burnlink.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed-input envelopes with their exact base64 output
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Ready-made vaults over memory and on-disk stores
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the wire format shared with browser clients:
//!
//! ```rust
//! use burnlink_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, blob) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, blob);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use burnlink_testkit::generators::{malformed_token, token};
//!
//! proptest! {
//!     #[test]
//!     fn lookup_hash_is_deterministic(token in token()) {
//!         prop_assert_eq!(token.lookup_hash(), token.lookup_hash());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust,no_run
//! use burnlink_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! // fixture.vault.create_secret(...), fixture.clock.advance(...)
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use burnlink_core::ManualClock;
pub use fixtures::{test_config, SqliteFixture, TestFixture, FIXTURE_START_MILLIS};
pub use generators::{malformed_token, password, payload, plaintext, token};
pub use vectors::{all_vectors, seal_vector, verify_all_vectors, GoldenVector, VectorKey};
