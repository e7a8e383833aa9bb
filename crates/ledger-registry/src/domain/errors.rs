//! Error types for the integrity registry.

use ledger_chain::ChainError;
use thiserror::Error;

/// Result alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Errors returned by the registry.
///
/// A tampered record is NOT an error for `verify`, which reports it in a
/// `VerificationOutcome`. `TamperDetected` exists for callers that prefer
/// error flow (`VerificationOutcome::into_result`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Malformed record or request, rejected before hashing.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record already registered. Benign for idempotent callers.
    #[error("Duplicate {entity_type} record: {reason}")]
    Duplicate {
        /// Entity type of the rejected registration.
        entity_type: String,
        /// What collided.
        reason: String,
        /// Block already carrying the record, when known.
        existing_block: Option<u64>,
    },

    /// Append raced with another writer or found a broken link.
    #[error("Chain integrity error: {0}")]
    ChainIntegrity(String),

    /// Current record no longer matches its registration.
    #[error("Tamper detected on entity {entity_id}: registered {registered_hash}, now {current_hash}")]
    TamperDetected {
        entity_id: u64,
        registered_hash: String,
        current_hash: String,
    },

    /// Unknown entity.
    #[error("No registry entry for entity {entity_id}")]
    NotFound { entity_id: u64 },

    /// Proof-of-work did not finish in time; the chain head is unchanged.
    #[error("Sealing timed out after {timeout_ms} ms")]
    SealTimeout { timeout_ms: u64 },

    /// Any other ledger failure.
    #[error("Ledger error: {0}")]
    Chain(ChainError),

    /// Entry persistence failed.
    #[error("Registry storage error: {0}")]
    Storage(String),

    /// Entry or payload encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The collaborator's record store failed.
    #[error("Record source error: {0}")]
    RecordSource(String),

    /// The blocking sealing task died.
    #[error("Sealing worker failed: {0}")]
    Worker(String),
}

impl RegistryError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the caller may retry or treat the failure as benign.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Duplicate { .. } | Self::ChainIntegrity(_) | Self::SealTimeout { .. }
        )
    }
}

impl From<ChainError> for RegistryError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Validation(message) => Self::Validation(message),
            ChainError::Duplicate {
                data_type,
                data_hash,
                existing_index,
            } => Self::Duplicate {
                entity_type: data_type,
                reason: format!("canonical hash {data_hash} already on chain"),
                existing_block: Some(existing_index),
            },
            ChainError::ChainIntegrity(message) => Self::ChainIntegrity(message),
            other => Self::Chain(other),
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<ledger_chain::KVStoreError> for RegistryError {
    fn from(err: ledger_chain::KVStoreError) -> Self {
        Self::Storage(err.to_string())
    }
}
