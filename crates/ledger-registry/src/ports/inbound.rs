//! Inbound Ports (Driving Ports)
//!
//! The API collaborators use to anchor records on the ledger and check
//! them later.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::entry::{
    AuditEvent, RecordedEvent, RegistrationReceipt, RegistryEntry, VerificationOutcome,
};
use crate::domain::errors::RegistryResult;

/// Primary registry API (Driving Port)
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Fingerprint, sign, seal and commit a record.
    ///
    /// ## Errors
    ///
    /// - `Validation`: malformed record or entity type
    /// - `Duplicate`: entity already registered, or identical record on chain
    /// - `SealTimeout`: proof-of-work did not finish in time; safe to retry
    async fn register(
        &self,
        entity_type: &str,
        entity_id: u64,
        record: Value,
    ) -> RegistryResult<RegistrationReceipt>;

    /// Append a later event (payment, dispute, amendment) about a
    /// registered entity.
    async fn record_event(
        &self,
        entity_id: u64,
        event_type: &str,
        details: Value,
    ) -> RegistryResult<RecordedEvent>;

    /// Compare the entity's current record with its registration.
    ///
    /// Tampering is reported in the outcome, not as an error.
    async fn verify(&self, entity_id: u64) -> RegistryResult<VerificationOutcome>;

    /// The entity's history, oldest first.
    async fn audit_trail(&self, entity_id: u64) -> RegistryResult<Vec<AuditEvent>>;

    /// The stored registry entry.
    async fn entry(&self, entity_id: u64) -> RegistryResult<RegistryEntry>;

    /// Every entry ever found tampered.
    async fn tampered_entries(&self) -> RegistryResult<Vec<RegistryEntry>>;
}
