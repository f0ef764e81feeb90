//! In-memory implementation of the CapabilityStore trait.
//!
//! Same semantics as SQLite but nothing survives the process. Useful for
//! tests and single-process deployments that accept losing secrets on
//! restart.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use burnlink_core::{system_clock, LookupHash, SharedClock};

use crate::error::{Result, StoreError};
use crate::traits::{ttl_millis, CapabilityStore, SecretRecord};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// `take_and_delete` removes under the write lock, which is what makes it
/// atomic.
pub struct MemoryStore {
    records: RwLock<HashMap<LookupHash, SecretRecord>>,
    clock: SharedClock,
}

impl MemoryStore {
    /// Create a new empty in-memory store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// Create a new empty store reading time from `clock`.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<LookupHash, SecretRecord>>> {
        self.records
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<LookupHash, SecretRecord>>> {
        self.records
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityStore for MemoryStore {
    async fn put(
        &self,
        lookup_hash: &LookupHash,
        envelope: &str,
        password_protected: bool,
        ttl: Duration,
    ) -> Result<SecretRecord> {
        let ttl = ttl_millis(ttl)?;
        let now = self.clock.now_millis();
        let mut records = self.write()?;

        if let Some(existing) = records.get(lookup_hash) {
            if !existing.is_expired(now) {
                return Err(StoreError::Duplicate(*lookup_hash));
            }
        }

        let record = SecretRecord {
            lookup_hash: *lookup_hash,
            envelope: envelope.to_owned(),
            password_protected,
            created_at: now,
            expires_at: now.saturating_add(ttl),
        };
        records.insert(*lookup_hash, record.clone());
        Ok(record)
    }

    async fn take_and_delete(&self, lookup_hash: &LookupHash) -> Result<Option<SecretRecord>> {
        let now = self.clock.now_millis();
        let taken = self.write()?.remove(lookup_hash);
        Ok(taken.filter(|record| !record.is_expired(now)))
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now_millis();
        let mut records = self.write()?;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok(before - records.len())
    }

    async fn live_count(&self) -> Result<usize> {
        let now = self.clock.now_millis();
        Ok(self
            .read()?
            .values()
            .filter(|record| !record.is_expired(now))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn hash(byte: u8) -> LookupHash {
        LookupHash::from_bytes([byte; 32])
    }

    #[tokio::test]
    async fn test_put_then_take() {
        let store = MemoryStore::new();
        let stored = store
            .put(&hash(1), "envelope", false, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(stored.expires_at - stored.created_at, 60_000);

        let taken = store.take_and_delete(&hash(1)).await.unwrap().unwrap();
        assert_eq!(taken, stored);
        assert!(store.take_and_delete(&hash(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let store = MemoryStore::new();
        store
            .put(&hash(2), "first", false, Duration::from_secs(60))
            .await
            .unwrap();
        let err = store
            .put(&hash(2), "second", true, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(h) if h == hash(2)));

        // The original record is untouched.
        let taken = store.take_and_delete(&hash(2)).await.unwrap().unwrap();
        assert_eq!(taken.envelope, "first");
    }

    #[tokio::test]
    async fn test_unknown_hash_is_none() {
        let store = MemoryStore::new();
        assert!(store.take_and_delete(&hash(9)).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_take_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(&hash(3), "once", false, Duration::from_secs(60))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take_and_delete(&hash(3)).await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
