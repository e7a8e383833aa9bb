//! # Domain Errors
//!
//! Error types for the ledger chain.
//!
//! Tamper findings are NOT errors: the validator reports them in a
//! `ValidationReport`. Errors here abort the call that raised them and leave
//! the chain untouched.

use thiserror::Error;

/// Result alias for chain operations.
pub type ChainResult<T> = std::result::Result<T, ChainError>;

/// Errors that can occur in the ledger chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Malformed input, rejected before hashing.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The same canonical payload hash already exists for this data type.
    #[error("Duplicate {data_type} payload {data_hash} (already at block #{existing_index})")]
    Duplicate {
        /// Data type label of the submission.
        data_type: String,
        /// Canonical payload hash.
        data_hash: String,
        /// Index of the block that already carries it.
        existing_index: u64,
    },

    /// Append would break the single-chain invariant.
    #[error("Chain integrity error: {0}")]
    ChainIntegrity(String),

    /// No block at this index.
    #[error("No block at index {index}")]
    NotFound {
        /// Requested index.
        index: u64,
    },

    /// Proof-of-work search gave up.
    #[error("Mining exhausted after {attempts} attempts at difficulty {difficulty}")]
    ResourceExhausted {
        /// Requested difficulty in leading hex zeros.
        difficulty: u32,
        /// Attempts made before giving up.
        attempts: u64,
    },

    /// Nonce search abandoned by the caller.
    #[error("Sealing of block #{index} cancelled")]
    Cancelled {
        /// Index of the candidate being sealed.
        index: u64,
    },

    /// Key-value store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Encoding/decoding failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Signing or encryption failure.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChainError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a chain integrity error.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::ChainIntegrity(message.into())
    }

    /// Whether the caller may retry the same operation.
    ///
    /// Integrity failures come from append races; a fresh candidate on the
    /// new head will succeed. Duplicates are benign for idempotent callers.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ChainIntegrity(_) | Self::Duplicate { .. })
    }
}

/// Key-value store errors.
#[derive(Debug, Clone, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError {
        /// Underlying error text.
        message: String,
    },
    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError {
        /// What was found.
        message: String,
    },
}

impl From<KVStoreError> for ChainError {
    fn from(err: KVStoreError) -> Self {
        ChainError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization(err.to_string())
    }
}
