//! Vault configuration.
//!
//! Loadable from any serde format or from `BURNLINK_*` environment
//! variables. The master key is kept as text until [`VaultConfig::master_key`]
//! decodes it, so a bad key fails loudly at startup rather than on first use.

use burnlink_core::Limits;
use burnlink_envelope::MasterKey;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// Environment variable holding the base64 master key.
pub const ENV_MASTER_KEY: &str = "BURNLINK_MASTER_KEY_BASE64";
/// Environment variable overriding [`Limits::default_ttl_seconds`].
pub const ENV_DEFAULT_TTL: &str = "BURNLINK_DEFAULT_TTL_SECONDS";
/// Environment variable overriding [`Limits::max_ttl_seconds`].
pub const ENV_MAX_TTL: &str = "BURNLINK_MAX_TTL_SECONDS";

/// Configuration for a [`crate::Vault`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Standard base64 encoding of the 32-byte master key. Without one the
    /// vault only creates password-protected secrets.
    pub master_key_base64: Option<String>,
    /// Request bounds.
    pub limits: Limits,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field(
                "master_key_base64",
                &self.master_key_base64.as_ref().map(|_| "<redacted>"),
            )
            .field("limits", &self.limits)
            .finish()
    }
}

impl VaultConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup(ENV_MASTER_KEY).filter(|v| !v.trim().is_empty()) {
            config.master_key_base64 = Some(key);
        }
        if let Some(ttl) = lookup(ENV_DEFAULT_TTL) {
            config.limits.default_ttl_seconds = parse_seconds(ENV_DEFAULT_TTL, &ttl)?;
        }
        if let Some(ttl) = lookup(ENV_MAX_TTL) {
            config.limits.max_ttl_seconds = parse_seconds(ENV_MAX_TTL, &ttl)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the master key from its base64 form.
    pub fn with_master_key_base64(mut self, key: impl Into<String>) -> Self {
        self.master_key_base64 = Some(key.into());
        self
    }

    /// Replace the request limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Check internal consistency and decode the master key.
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.min_ttl_seconds == 0 {
            return Err(VaultError::Config("min_ttl_seconds must be at least 1".into()));
        }
        if limits.min_ttl_seconds > limits.max_ttl_seconds {
            return Err(VaultError::Config(format!(
                "min_ttl_seconds {} exceeds max_ttl_seconds {}",
                limits.min_ttl_seconds, limits.max_ttl_seconds
            )));
        }
        if !(limits.min_ttl_seconds..=limits.max_ttl_seconds).contains(&limits.default_ttl_seconds)
        {
            return Err(VaultError::Config(format!(
                "default_ttl_seconds {} is outside {}..={}",
                limits.default_ttl_seconds, limits.min_ttl_seconds, limits.max_ttl_seconds
            )));
        }
        self.master_key().map(|_| ())
    }

    /// Decode the configured master key, if any.
    pub fn master_key(&self) -> Result<Option<MasterKey>> {
        self.master_key_base64
            .as_deref()
            .map(|encoded| MasterKey::from_base64(encoded).map_err(VaultError::from))
            .transpose()
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| VaultError::Config(format!("{} must be a whole number of seconds", name)))
}
