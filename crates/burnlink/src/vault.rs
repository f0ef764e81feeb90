//! The Vault: create and retrieve burn-after-reading secrets.
//!
//! The Vault ties the token authority, the envelope codec and a capability
//! store together. It holds no per-secret state of its own; every guarantee
//! about single use comes from [`CapabilityStore::take_and_delete`].

use std::sync::Arc;
use std::time::Duration;

use burnlink_core::{CapabilityToken, CreateSecretRequest, DepositRequest, Limits, SecretPayload};
use burnlink_envelope::{
    decrypt_master, decrypt_with_password, encrypt_master, encrypt_with_password, Envelope,
    EnvelopeError, MasterKey, MasterKeyEnvelope,
};
use burnlink_store::{CapabilityStore, Sweeper};
use serde::{Deserialize, Serialize};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};

/// A newly stored secret.
///
/// The token is the only way to read the secret back and is not kept
/// anywhere by the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSecret {
    /// The capability token to embed in the share link.
    pub token: CapabilityToken,
    /// When the secret stops being retrievable (Unix ms).
    pub expires_at: i64,
}

/// A consumed record, still sealed.
///
/// Once claimed the record is gone from the store; opening it is purely
/// local and may be retried, for instance after a mistyped password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedSecret {
    /// The base64 envelope blob.
    #[serde(rename = "encrypted")]
    pub sealed: String,
    /// When the record would have expired (Unix ms).
    pub expires_at: i64,
    /// Whether opening requires a password.
    pub password_protected: bool,
}

/// The main Vault struct.
///
/// Provides:
/// - Creating secrets from plaintext (sealed here)
/// - Depositing secrets sealed by a client
/// - Claiming and opening secrets exactly once
pub struct Vault<S: CapabilityStore> {
    /// The storage backend.
    store: Arc<S>,
    /// Key for secrets created without a password.
    master_key: Option<MasterKey>,
    /// Request bounds.
    limits: Limits,
}

impl<S: CapabilityStore + 'static> Vault<S> {
    /// Create a new vault over `store`.
    ///
    /// Fails if the configured master key cannot be decoded.
    pub fn new(store: S, config: VaultConfig) -> Result<Self> {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create a vault over a store that is also used elsewhere.
    pub fn from_shared(store: Arc<S>, config: VaultConfig) -> Result<Self> {
        config.validate()?;
        let master_key = config.master_key()?;
        if master_key.is_none() {
            tracing::info!("no master key configured; only password-protected secrets can be created");
        }
        Ok(Self {
            store,
            master_key,
            limits: config.limits,
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The limits requests are checked against.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Whether secrets can be created without a password.
    pub fn has_master_key(&self) -> bool {
        self.master_key.is_some()
    }

    /// Start purging expired records from the store every `interval`.
    pub fn spawn_sweeper(&self, interval: Duration) -> Sweeper {
        Sweeper::spawn(self.store.clone(), interval)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────────────────

    /// Seal `request.plaintext` and store it under a fresh token.
    ///
    /// With a password the secret is sealed under a PBKDF2-derived key;
    /// without one it is sealed under the master key, which must be
    /// configured.
    pub async fn create_secret(&self, request: CreateSecretRequest) -> Result<CreatedSecret> {
        let ttl = request.validate(&self.limits)?;
        let CreateSecretRequest {
            plaintext,
            password,
            ..
        } = request;

        let envelope = match password {
            Some(password) => {
                let sealed =
                    run_kdf(move || encrypt_with_password(&plaintext, &password)).await??;
                Envelope::Password(sealed)
            }
            None => {
                let key = self.master_key.as_ref().ok_or_else(|| {
                    VaultError::InvalidRequest(
                        "a password is required: no master key is configured".into(),
                    )
                })?;
                Envelope::Master(encrypt_master(&plaintext, key)?)
            }
        };

        self.store_envelope(&envelope, ttl).await
    }

    /// Store an envelope that the client sealed itself.
    ///
    /// The blob is checked for the shape of its declared variant but never
    /// opened; the vault does not see the password.
    pub async fn deposit_sealed(&self, request: DepositRequest) -> Result<CreatedSecret> {
        let ttl = request.validate(&self.limits)?;
        let envelope = Envelope::decode(&request.secret, request.password_protected)?;
        self.store_envelope(&envelope, ttl).await
    }

    /// Validate, serialize and seal a text-plus-images payload.
    pub async fn create_payload(
        &self,
        payload: &SecretPayload,
        password: Option<&str>,
        ttl_seconds: Option<u64>,
    ) -> Result<CreatedSecret> {
        payload.validate(&self.limits)?;
        let request = CreateSecretRequest {
            plaintext: payload.to_bytes()?,
            password: password.map(str::to_owned),
            ttl_seconds,
        };
        self.create_secret(request).await
    }

    async fn store_envelope(&self, envelope: &Envelope, ttl: Duration) -> Result<CreatedSecret> {
        let password_protected = envelope.is_password_protected();
        let token = CapabilityToken::issue()?;

        let record = self
            .store
            .put(&token.lookup_hash(), &envelope.encode(), password_protected, ttl)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "failed to store secret");
                VaultError::from(e)
            })?;

        tracing::info!(ttl_secs = ttl.as_secs(), password_protected, "secret stored");
        Ok(CreatedSecret {
            token,
            expires_at: record.expires_at,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Retrieval
    // ─────────────────────────────────────────────────────────────────────────

    /// Consume the secret behind `token` without opening it.
    ///
    /// Unknown, already-read, expired and malformed tokens all return
    /// [`VaultError::Gone`]. A store failure is reported as
    /// [`VaultError::Storage`] and leaves the record in place.
    pub async fn claim(&self, token: &str) -> Result<ClaimedSecret> {
        let token = CapabilityToken::parse(token).ok_or(VaultError::Gone)?;

        let record = self
            .store
            .take_and_delete(&token.lookup_hash())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "failed to take secret");
                VaultError::from(e)
            })?
            .ok_or(VaultError::Gone)?;

        tracing::info!(
            password_protected = record.password_protected,
            "secret claimed"
        );
        Ok(ClaimedSecret {
            sealed: record.envelope,
            expires_at: record.expires_at,
            password_protected: record.password_protected,
        })
    }

    /// Open a claimed secret.
    ///
    /// A missing or wrong password, a wrong master key and a corrupted blob
    /// all return [`VaultError::Authentication`]. Opening never touches the
    /// store.
    pub async fn open(&self, claimed: &ClaimedSecret, password: Option<&str>) -> Result<Vec<u8>> {
        if claimed.password_protected {
            let password = password
                .filter(|p| !p.is_empty())
                .ok_or(VaultError::Authentication)?
                .to_owned();
            let sealed = claimed.sealed.clone();
            return run_kdf(move || decrypt_with_password(&password, &sealed))
                .await?
                .map_err(VaultError::from_stored_envelope);
        }

        let key = self.master_key.as_ref().ok_or_else(|| {
            VaultError::KeyConfiguration("no master key configured to open this secret".into())
        })?;
        let envelope =
            MasterKeyEnvelope::decode(&claimed.sealed).map_err(VaultError::from_stored_envelope)?;
        decrypt_master(&envelope, key).map_err(VaultError::from_stored_envelope)
    }

    /// Claim and open in one call.
    ///
    /// The record is consumed by the claim, not by a successful open: a
    /// wrong password still burns the secret.
    pub async fn retrieve_secret(&self, token: &str, password: Option<&str>) -> Result<Vec<u8>> {
        let claimed = self.claim(token).await?;
        self.open(&claimed, password).await.map_err(|e| {
            tracing::debug!(error = %e, "claimed secret did not open");
            e
        })
    }

    /// Retrieve and parse a payload created by [`Vault::create_payload`].
    pub async fn retrieve_payload(
        &self,
        token: &str,
        password: Option<&str>,
    ) -> Result<SecretPayload> {
        let plaintext = self.retrieve_secret(token, password).await?;
        Ok(SecretPayload::from_bytes(&plaintext)?)
    }
}

/// Run password key derivation off the async executor.
///
/// Once started the derivation runs to completion even if the caller is
/// dropped.
async fn run_kdf<T, F>(f: F) -> Result<std::result::Result<T, EnvelopeError>>
where
    F: FnOnce() -> std::result::Result<T, EnvelopeError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| VaultError::Internal(format!("kdf worker failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnlink_store::MemoryStore;

    fn vault() -> Vault<MemoryStore> {
        let key = MasterKey::generate().unwrap().to_base64();
        Vault::new(
            MemoryStore::new(),
            VaultConfig::default().with_master_key_base64(key),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_master_round_trip_then_gone() {
        let vault = vault();
        let created = vault
            .create_secret(CreateSecretRequest::new("hello"))
            .await
            .unwrap();
        assert_eq!(created.token.as_str().len(), 43);

        let plaintext = vault
            .retrieve_secret(created.token.as_str(), None)
            .await
            .unwrap();
        assert_eq!(plaintext, b"hello");

        let err = vault
            .retrieve_secret(created.token.as_str(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Gone));
    }

    #[tokio::test]
    async fn test_missing_password_on_password_secret() {
        let vault = vault();
        let created = vault
            .create_secret(CreateSecretRequest::new("secret").password("pw123"))
            .await
            .unwrap();

        let claimed = vault.claim(created.token.as_str()).await.unwrap();
        assert!(claimed.password_protected);
        assert!(matches!(
            vault.open(&claimed, None).await,
            Err(VaultError::Authentication)
        ));
        assert!(matches!(
            vault.open(&claimed, Some("")).await,
            Err(VaultError::Authentication)
        ));
        assert_eq!(vault.open(&claimed, Some("pw123")).await.unwrap(), b"secret");
    }

    #[tokio::test]
    async fn test_no_master_key_requires_password() {
        let vault = Vault::new(MemoryStore::new(), VaultConfig::default()).unwrap();
        assert!(!vault.has_master_key());

        let err = vault
            .create_secret(CreateSecretRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidRequest(_)));
        assert_eq!(vault.store().live_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_token_is_gone() {
        let vault = vault();
        for token in ["", "short", "!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!"] {
            assert!(matches!(vault.claim(token).await, Err(VaultError::Gone)));
        }
    }

    #[test]
    fn test_claimed_secret_json_shape() {
        let claimed = ClaimedSecret {
            sealed: "AAAA".into(),
            expires_at: 42,
            password_protected: true,
        };
        let json = serde_json::to_value(&claimed).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "encrypted": "AAAA",
                "expires_at": 42,
                "password_protected": true
            })
        );
    }
}
