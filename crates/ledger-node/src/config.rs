//! # Node Configuration
//!
//! Read from the environment at startup.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LEDGER_DATA_DIR` | `./ledger-data` | Chain, entries and lock file |
//! | `LEDGER_SIGNING_KEY` | (required) | Hex HMAC key, at least 16 bytes |
//! | `LEDGER_DIFFICULTY` | `3` | Leading zero hex digits per block hash |
//! | `LEDGER_SEAL_TIMEOUT_MS` | `30000` | Upper bound on one seal |
//! | `LEDGER_ENCRYPTION_KEY` | unset | Hex XChaCha20 key; enables encrypted payloads |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ledger_chain::adapters::PayloadKey;
use ledger_chain::domain::miner::DEFAULT_DIFFICULTY;
use ledger_chain::{ChainConfig, SigningKey};
use ledger_registry::{EntitySchema, RegistryConfig};
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = "./ledger-data";
const DEFAULT_SEAL_TIMEOUT_MS: u64 = 30_000;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No signing key was provided.
    #[error("LEDGER_SIGNING_KEY is not set; blocks and vendor signatures need a secret key")]
    MissingSigningKey,

    /// A variable could not be parsed.
    #[error("Invalid {variable}={value:?}: {reason}")]
    Invalid {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    /// Hex-encoded HMAC key.
    pub signing_key: Option<String>,
    pub difficulty: u32,
    pub seal_timeout: Duration,
    /// Hex-encoded payload encryption key.
    pub encryption_key: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            signing_key: None,
            difficulty: DEFAULT_DIFFICULTY,
            seal_timeout: Duration::from_millis(DEFAULT_SEAL_TIMEOUT_MS),
            encryption_key: None,
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let difficulty = match lookup("LEDGER_DIFFICULTY") {
            Some(value) => parse("LEDGER_DIFFICULTY", &value)?,
            None => defaults.difficulty,
        };
        let seal_timeout = match lookup("LEDGER_SEAL_TIMEOUT_MS") {
            Some(value) => Duration::from_millis(parse("LEDGER_SEAL_TIMEOUT_MS", &value)?),
            None => defaults.seal_timeout,
        };

        Ok(Self {
            data_dir: lookup("LEDGER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            signing_key: lookup("LEDGER_SIGNING_KEY").filter(|k| !k.is_empty()),
            difficulty,
            seal_timeout,
            encryption_key: lookup("LEDGER_ENCRYPTION_KEY").filter(|k| !k.is_empty()),
        })
    }

    /// Decode the signing key.
    pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
        let encoded = self
            .signing_key
            .as_deref()
            .ok_or(ConfigError::MissingSigningKey)?;
        SigningKey::from_hex(encoded).map_err(|e| ConfigError::Invalid {
            variable: "LEDGER_SIGNING_KEY",
            value: "<redacted>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Decode the encryption key, if one is set.
    pub fn payload_key(&self) -> Result<Option<PayloadKey>, ConfigError> {
        self.encryption_key
            .as_deref()
            .map(|encoded| {
                PayloadKey::from_hex(encoded).map_err(|e| ConfigError::Invalid {
                    variable: "LEDGER_ENCRYPTION_KEY",
                    value: "<redacted>".to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig::default().with_difficulty(self.difficulty)
    }

    /// Registry settings; invoice payloads are encrypted when a key is set.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default()
            .with_seal_timeout(self.seal_timeout)
            .with_schema(
                "invoice",
                EntitySchema::invoice().with_encrypt_payload(self.encryption_key.is_some()),
            )
    }

    pub fn chain_path(&self) -> PathBuf {
        self.data_dir.join("chain.db")
    }

    pub fn entries_path(&self) -> PathBuf {
        self.data_dir.join("registry.db")
    }
}

fn parse<T: std::str::FromStr>(variable: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        variable,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
