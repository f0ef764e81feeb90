//! Store trait: the abstract interface for secret persistence.
//!
//! This trait allows the vault to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests and single-process
//! deployments).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use burnlink_core::LookupHash;

use crate::error::Result;

/// A stored secret.
///
/// Records are never updated in place. They leave the store exactly once,
/// through `take_and_delete` or through expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    /// SHA-256 of the capability token.
    pub lookup_hash: LookupHash,
    /// The sealed envelope in its base64 wire form.
    pub envelope: String,
    /// Whether the envelope is a password envelope.
    pub password_protected: bool,
    /// When the record was stored (Unix ms).
    pub created_at: i64,
    /// When the record stops being retrievable (Unix ms).
    pub expires_at: i64,
}

impl SecretRecord {
    /// Whether the record is past its expiry at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// Convert a TTL to milliseconds, rejecting zero and overflow.
pub(crate) fn ttl_millis(ttl: Duration) -> Result<i64> {
    let millis = i64::try_from(ttl.as_millis())
        .map_err(|_| crate::StoreError::InvalidData("ttl out of range".into()))?;
    if millis <= 0 {
        return Err(crate::StoreError::InvalidData("ttl must be positive".into()));
    }
    Ok(millis)
}

/// The capability store: async interface for burn-after-reading records.
///
/// # Design Notes
///
/// - **At most once**: `take_and_delete` observes and removes a record in
///   one atomic step. Of any number of concurrent callers with the same
///   hash, exactly one receives the record.
/// - **Passive expiry**: expired records are reported as absent whether or
///   not they have been physically purged yet.
/// - **No overwrite**: `put` on a live hash fails with `Duplicate`.
#[async_trait]
pub trait CapabilityStore: Send + Sync {
    /// Store a sealed envelope under `lookup_hash` for `ttl`.
    ///
    /// Returns the stored record (with its timestamps).
    async fn put(
        &self,
        lookup_hash: &LookupHash,
        envelope: &str,
        password_protected: bool,
        ttl: Duration,
    ) -> Result<SecretRecord>;

    /// Atomically remove and return the live record for `lookup_hash`.
    ///
    /// `Ok(None)` covers never-stored, already-taken and expired.
    async fn take_and_delete(&self, lookup_hash: &LookupHash) -> Result<Option<SecretRecord>>;

    /// Physically delete every expired record. Returns how many were removed.
    async fn purge_expired(&self) -> Result<usize>;

    /// Count records that are still retrievable.
    async fn live_count(&self) -> Result<usize>;
}

#[async_trait]
impl<S: CapabilityStore + ?Sized> CapabilityStore for Arc<S> {
    async fn put(
        &self,
        lookup_hash: &LookupHash,
        envelope: &str,
        password_protected: bool,
        ttl: Duration,
    ) -> Result<SecretRecord> {
        (**self).put(lookup_hash, envelope, password_protected, ttl).await
    }

    async fn take_and_delete(&self, lookup_hash: &LookupHash) -> Result<Option<SecretRecord>> {
        (**self).take_and_delete(lookup_hash).await
    }

    async fn purge_expired(&self) -> Result<usize> {
        (**self).purge_expired().await
    }

    async fn live_count(&self) -> Result<usize> {
        (**self).live_count().await
    }
}
