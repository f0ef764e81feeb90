//! SQLite implementation of the CapabilityStore trait.
//!
//! This is the primary storage backend for Burnlink. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use burnlink_core::{system_clock, LookupHash, SharedClock};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ttl_millis, CapabilityStore, SecretRecord};

/// How long a writer waits on a locked database file before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    clock: SharedClock,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "opened sqlite store");
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: system_clock(),
        }
    }

    /// Replace the clock used for timestamps and expiry checks.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Execute a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl CapabilityStore for SqliteStore {
    async fn put(
        &self,
        lookup_hash: &LookupHash,
        envelope: &str,
        password_protected: bool,
        ttl: Duration,
    ) -> Result<SecretRecord> {
        let ttl = ttl_millis(ttl)?;
        let now = self.clock.now_millis();
        let record = SecretRecord {
            lookup_hash: *lookup_hash,
            envelope: envelope.to_owned(),
            password_protected,
            created_at: now,
            expires_at: now.saturating_add(ttl),
        };

        self.run(move |conn| {
            // Take the write lock up front. A deferred read-then-write upgrade
            // fails with SQLITE_BUSY without consulting the busy handler.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT expires_at FROM secrets WHERE token_hash = ?1",
                    params![record.lookup_hash.0.as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            match existing {
                Some(expires_at) if expires_at > now => {
                    return Err(StoreError::Duplicate(record.lookup_hash));
                }
                // An expired row under the same hash is dead; replace it.
                Some(_) => {
                    tx.execute(
                        "DELETE FROM secrets WHERE token_hash = ?1",
                        params![record.lookup_hash.0.as_slice()],
                    )?;
                }
                None => {}
            }

            tx.execute(
                "INSERT INTO secrets (token_hash, envelope, password_protected, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.lookup_hash.0.as_slice(),
                    record.envelope,
                    record.password_protected,
                    record.created_at,
                    record.expires_at,
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Duplicate(record.lookup_hash)
                } else {
                    StoreError::Database(e)
                }
            })?;

            tx.commit()?;
            Ok(record)
        })
        .await
    }

    async fn take_and_delete(&self, lookup_hash: &LookupHash) -> Result<Option<SecretRecord>> {
        let lookup_hash = *lookup_hash;
        let now = self.clock.now_millis();

        let taken = self
            .run(move |conn| {
                // Single statement: the row is observed and removed together,
                // so two connections can never both see it.
                let taken = conn
                    .query_row(
                        "DELETE FROM secrets WHERE token_hash = ?1
                         RETURNING envelope, password_protected, created_at, expires_at",
                        params![lookup_hash.0.as_slice()],
                        |row| {
                            Ok(SecretRecord {
                                lookup_hash,
                                envelope: row.get(0)?,
                                password_protected: row.get(1)?,
                                created_at: row.get(2)?,
                                expires_at: row.get(3)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(taken)
            })
            .await?;

        match taken {
            Some(record) if record.is_expired(now) => {
                tracing::debug!("discarded expired record on take");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now_millis();
        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM secrets WHERE expires_at <= ?1", params![now])?;
            Ok(removed)
        })
        .await
    }

    async fn live_count(&self) -> Result<usize> {
        let now = self.clock.now_millis();
        self.run(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM secrets WHERE expires_at > ?1",
                params![now],
                |row| row.get(0),
            )?;
            usize::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("negative row count {}", count)))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnlink_core::ManualClock;

    const START: i64 = 1_700_000_000_000;

    fn hash(byte: u8) -> LookupHash {
        LookupHash::from_bytes([byte; 32])
    }

    fn store_with_clock() -> (SqliteStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let store = SqliteStore::open_memory().unwrap().with_clock(clock.clone());
        (store, clock)
    }

    #[tokio::test]
    async fn test_put_and_take() {
        let (store, _) = store_with_clock();

        let stored = store
            .put(&hash(1), "c2VhbGVk", true, Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(stored.created_at, START);
        assert_eq!(stored.expires_at, START + 3_600_000);

        let taken = store.take_and_delete(&hash(1)).await.unwrap().unwrap();
        assert_eq!(taken, stored);
        assert!(taken.password_protected);

        // Burned.
        assert!(store.take_and_delete(&hash(1)).await.unwrap().is_none());
        assert_eq!(store.live_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_live_hash() {
        let (store, _) = store_with_clock();
        store
            .put(&hash(2), "first", false, Duration::from_secs(60))
            .await
            .unwrap();

        let err = store
            .put(&hash(2), "second", false, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(h) if h == hash(2)));
        assert_eq!(store.live_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_record_is_gone() {
        let (store, clock) = store_with_clock();
        store
            .put(&hash(3), "short", false, Duration::from_secs(1))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(2));
        assert!(store.take_and_delete(&hash(3)).await.unwrap().is_none());
        assert_eq!(store.live_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let (store, clock) = store_with_clock();
        store
            .put(&hash(4), "edge", false, Duration::from_secs(1))
            .await
            .unwrap();

        clock.advance(Duration::from_millis(999));
        assert_eq!(store.live_count().await.unwrap(), 1);

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.live_count().await.unwrap(), 0);
        assert!(store.take_and_delete(&hash(4)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_hash_can_be_reused() {
        let (store, clock) = store_with_clock();
        store
            .put(&hash(5), "old", false, Duration::from_secs(1))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(5));

        store
            .put(&hash(5), "new", false, Duration::from_secs(60))
            .await
            .unwrap();
        let taken = store.take_and_delete(&hash(5)).await.unwrap().unwrap();
        assert_eq!(taken.envelope, "new");
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (store, clock) = store_with_clock();
        store
            .put(&hash(6), "a", false, Duration::from_secs(10))
            .await
            .unwrap();
        store
            .put(&hash(7), "b", false, Duration::from_secs(10))
            .await
            .unwrap();
        store
            .put(&hash(8), "c", false, Duration::from_secs(100))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 0);
        clock.advance(Duration::from_secs(50));
        assert_eq!(store.purge_expired().await.unwrap(), 2);
        assert_eq!(store.purge_expired().await.unwrap(), 0);
        assert_eq!(store.live_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let (store, _) = store_with_clock();
        let err = store
            .put(&hash(9), "x", false, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_take_exactly_once() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        store
            .put(&hash(10), "contended", false, Duration::from_secs(60))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take_and_delete(&hash(10)).await.unwrap() })
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

    #[tokio::test]
    async fn test_on_disk_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("burnlink.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .put(&hash(11), "durable", false, Duration::from_secs(60))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let taken = store.take_and_delete(&hash(11)).await.unwrap().unwrap();
        assert_eq!(taken.envelope, "durable");

        // The deletion is durable too.
        drop(store);
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.take_and_delete(&hash(11)).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_connections_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");

        let a = Arc::new(SqliteStore::open(&path).unwrap());
        let b = Arc::new(SqliteStore::open(&path).unwrap());
        a.put(&hash(12), "shared", false, Duration::from_secs(60))
            .await
            .unwrap();

        let ta = {
            let a = a.clone();
            tokio::spawn(async move { a.take_and_delete(&hash(12)).await.unwrap() })
        };
        let tb = {
            let b = b.clone();
            tokio::spawn(async move { b.take_and_delete(&hash(12)).await.unwrap() })
        };

        let results = [ta.await.unwrap(), tb.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_two_connections_concurrent_puts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");

        let a = Arc::new(SqliteStore::open(&path).unwrap());
        let b = Arc::new(SqliteStore::open(&path).unwrap());

        let tasks: Vec<_> = (0..400u32)
            .map(|i| {
                let store = if i % 2 == 0 { a.clone() } else { b.clone() };
                tokio::spawn(async move {
                    let mut bytes = [0u8; 32];
                    bytes[..4].copy_from_slice(&i.to_be_bytes());
                    let hash = LookupHash::from_bytes(bytes);
                    store
                        .put(&hash, "sealed", false, Duration::from_secs(60))
                        .await
                })
            })
            .collect();

        let mut failed = 0;
        for task in tasks {
            if task.await.unwrap().is_err() {
                failed += 1;
            }
        }
        assert_eq!(failed, 0);
        assert_eq!(a.live_count().await.unwrap(), 400);
        assert_eq!(b.live_count().await.unwrap(), 400);
    }
}
