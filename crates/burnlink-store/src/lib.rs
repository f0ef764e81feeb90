//! # Burnlink Store
//!
//! Storage abstraction for Burnlink. Provides a trait-based interface for
//! burn-after-reading records with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts secret storage behind the [`CapabilityStore`]
//! trait, allowing the vault to be storage-agnostic. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing and
//! single-process use.
//!
//! ## Key Types
//!
//! - [`CapabilityStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage
//! - [`SecretRecord`] - A stored envelope with its timestamps
//! - [`Sweeper`] - Background purge of expired records
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use burnlink_core::LookupHash;
//! use burnlink_store::{CapabilityStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("burnlink.db").unwrap();
//!     let hash = LookupHash::digest(b"token text");
//!
//!     store.put(&hash, "c2VhbGVk", false, Duration::from_secs(3600)).await.unwrap();
//!     let first = store.take_and_delete(&hash).await.unwrap();
//!     let second = store.take_and_delete(&hash).await.unwrap();
//!     assert!(first.is_some() && second.is_none());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Keyed by hash**: only the SHA-256 of a token is ever stored
//! - **Atomic take**: one winner among concurrent readers of the same hash
//! - **Passive expiry**: expired rows read as absent before they are purged

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod sweeper;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use sweeper::{Sweeper, DEFAULT_SWEEP_INTERVAL};
pub use traits::{CapabilityStore, SecretRecord};
