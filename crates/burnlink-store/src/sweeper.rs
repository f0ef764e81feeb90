//! Background purge of expired records.
//!
//! Expired records are already invisible to `take_and_delete`; the sweeper
//! only reclaims their space. Losing or stopping it never changes what a
//! reader observes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::traits::CapabilityStore;

/// Default interval between purges.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to a running sweep task. Dropping it aborts the task.
pub struct Sweeper {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn a task that calls `purge_expired` every `interval`.
    ///
    /// The first purge runs immediately. Must be called inside a tokio
    /// runtime.
    pub fn spawn<S>(store: Arc<S>, interval: Duration) -> Self
    where
        S: CapabilityStore + ?Sized + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match store.purge_expired().await {
                            Ok(0) => {}
                            Ok(removed) => tracing::debug!(removed, "purged expired secrets"),
                            Err(e) => tracing::warn!(error = %e, "purge of expired secrets failed"),
                        }
                    }
                    _ = &mut stop_rx => {
                        tracing::debug!("stopping sweeper");
                        break;
                    }
                }
            }
        });

        Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Signal the task to stop and wait for it to finish its current purge.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::traits::SecretRecord;
    use crate::MemoryStore;
    use async_trait::async_trait;
    use burnlink_core::{LookupHash, ManualClock};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a store and counts purge calls.
    struct CountingStore {
        inner: MemoryStore,
        purges: AtomicUsize,
    }

    #[async_trait]
    impl CapabilityStore for CountingStore {
        async fn put(
            &self,
            lookup_hash: &LookupHash,
            envelope: &str,
            password_protected: bool,
            ttl: Duration,
        ) -> Result<SecretRecord> {
            self.inner
                .put(lookup_hash, envelope, password_protected, ttl)
                .await
        }

        async fn take_and_delete(&self, lookup_hash: &LookupHash) -> Result<Option<SecretRecord>> {
            self.inner.take_and_delete(lookup_hash).await
        }

        async fn purge_expired(&self) -> Result<usize> {
            self.purges.fetch_add(1, Ordering::SeqCst);
            self.inner.purge_expired().await
        }

        async fn live_count(&self) -> Result<usize> {
            self.inner.live_count().await
        }
    }

    #[tokio::test]
    async fn test_sweeper_purges_until_stopped() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = Arc::new(CountingStore {
            inner: MemoryStore::with_clock(clock.clone()),
            purges: AtomicUsize::new(0),
        });
        store
            .put(
                &LookupHash::from_bytes([1; 32]),
                "x",
                false,
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        clock.advance(Duration::from_secs(5));

        let sweeper = Sweeper::spawn(store.clone(), Duration::from_millis(10));
        for _ in 0..200 {
            if store.purges.load(Ordering::SeqCst) >= 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        sweeper.stop().await;

        let after_stop = store.purges.load(Ordering::SeqCst);
        assert!(after_stop >= 3);
        // The first purge already removed the expired record.
        assert_eq!(store.inner.purge_expired().await.unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.purges.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_drop_aborts_task() {
        let store = Arc::new(CountingStore {
            inner: MemoryStore::new(),
            purges: AtomicUsize::new(0),
        });
        let sweeper = Sweeper::spawn(store.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(sweeper);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let count = store.purges.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.purges.load(Ordering::SeqCst), count);
    }
}
