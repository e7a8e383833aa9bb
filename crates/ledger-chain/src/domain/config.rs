//! # Chain Configuration
//!
//! Tunables for sealing and signing. Secrets are NOT part of the config: the
//! signing key is injected separately into `LedgerChain`.

use crate::domain::errors::{ChainError, ChainResult};
use crate::domain::miner::{ProofOfWork, DEFAULT_DIFFICULTY, DEFAULT_MAX_ATTEMPTS, MAX_DIFFICULTY};

/// Configuration for the ledger chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Leading zero hex nibbles required of every block hash (default: 3).
    pub difficulty: u32,

    /// Nonce attempts before sealing fails with `ResourceExhausted`
    /// (default: 50,000,000).
    pub max_seal_attempts: u64,

    /// Sign new blocks when a signer is configured (default: true).
    ///
    /// Unsigned blocks are still valid; the validator counts them.
    pub sign_blocks: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_seal_attempts: DEFAULT_MAX_ATTEMPTS,
            sign_blocks: true,
        }
    }
}

impl ChainConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the proof-of-work difficulty.
    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set the nonce attempt budget.
    pub fn with_max_seal_attempts(mut self, attempts: u64) -> Self {
        self.max_seal_attempts = attempts;
        self
    }

    /// Enable or disable block signing.
    pub fn with_sign_blocks(mut self, sign: bool) -> Self {
        self.sign_blocks = sign;
        self
    }

    /// Check the configuration for out-of-range values.
    pub fn validate(&self) -> ChainResult<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidConfig(format!(
                "difficulty must be 0..={MAX_DIFFICULTY}, got {}",
                self.difficulty
            )));
        }
        if self.max_seal_attempts == 0 {
            return Err(ChainError::InvalidConfig(
                "max_seal_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Sealer matching this configuration.
    pub fn proof_of_work(&self) -> ChainResult<ProofOfWork> {
        ProofOfWork::new(self.difficulty, self.max_seal_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChainConfig::default();
        assert_eq!(config.difficulty, 3);
        assert_eq!(config.max_seal_attempts, 50_000_000);
        assert!(config.sign_blocks);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ChainConfig::new()
            .with_difficulty(1)
            .with_max_seal_attempts(10)
            .with_sign_blocks(false);

        assert_eq!(config.difficulty, 1);
        assert_eq!(config.max_seal_attempts, 10);
        assert!(!config.sign_blocks);
        assert_eq!(config.proof_of_work().unwrap().difficulty(), 1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(ChainConfig::new().with_difficulty(65).validate().is_err());
        assert!(ChainConfig::new().with_max_seal_attempts(0).validate().is_err());
    }
}
