//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use burnlink::{Vault, VaultConfig};
use burnlink_core::{Limits, ManualClock, SharedClock};
use burnlink_store::{MemoryStore, SqliteStore};
use tempfile::TempDir;

use crate::vectors::VECTOR_MASTER_KEY;

/// Start time for manual clocks: 2024-01-01T00:00:00Z.
pub const FIXTURE_START_MILLIS: i64 = 1_704_067_200_000;

/// Config with the fixed vector master key and default limits.
pub fn test_config() -> VaultConfig {
    VaultConfig::default().with_master_key_base64(STANDARD.encode(VECTOR_MASTER_KEY))
}

/// A vault over an in-memory store with a controllable clock.
pub struct TestFixture {
    pub vault: Vault<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl TestFixture {
    /// Vault with the fixture master key.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Vault that only accepts password-protected secrets.
    pub fn without_master_key() -> Self {
        Self::with_config(VaultConfig::default())
    }

    /// Vault with custom limits and the fixture master key.
    pub fn with_limits(limits: Limits) -> Self {
        Self::with_config(test_config().with_limits(limits))
    }

    fn with_config(config: VaultConfig) -> Self {
        let clock = Arc::new(ManualClock::new(FIXTURE_START_MILLIS));
        let shared: SharedClock = clock.clone();
        let store = MemoryStore::with_clock(shared);
        let vault = Vault::new(store, config).expect("fixture vault config rejected");
        Self { vault, clock }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A vault over an on-disk SQLite store in a temporary directory.
///
/// The directory is removed when the fixture is dropped.
pub struct SqliteFixture {
    pub vault: Vault<SqliteStore>,
    pub dir: TempDir,
}

impl SqliteFixture {
    /// Open a fresh database on the system clock.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store =
            SqliteStore::open(dir.path().join("burnlink.db")).expect("failed to open sqlite store");
        let vault = Vault::new(store, test_config()).expect("fixture vault config rejected");
        Self { vault, dir }
    }
}

impl Default for SqliteFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnlink::CreateSecretRequest;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fixture_clock_drives_expiry() {
        let fixture = TestFixture::new();
        let created = fixture
            .vault
            .create_secret(CreateSecretRequest::new("hello").ttl_seconds(1))
            .await
            .unwrap();
        assert_eq!(created.expires_at, FIXTURE_START_MILLIS + 1_000);

        fixture.clock.advance(Duration::from_secs(2));
        assert!(fixture.vault.claim(created.token.as_str()).await.is_err());
    }

    #[tokio::test]
    async fn test_sqlite_fixture_round_trip() {
        let fixture = SqliteFixture::new();
        let created = fixture
            .vault
            .create_secret(CreateSecretRequest::new("on disk"))
            .await
            .unwrap();
        let plaintext = fixture
            .vault
            .retrieve_secret(created.token.as_str(), None)
            .await
            .unwrap();
        assert_eq!(plaintext, b"on disk");
        assert!(fixture.dir.path().join("burnlink.db").exists());
    }
}
