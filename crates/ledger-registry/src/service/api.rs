//! `RegistryApi` implementation.

use async_trait::async_trait;
use ledger_chain::{KeyValueStore, TimeSource};
use serde_json::Value;

use super::RegistryService;
use crate::domain::entry::{
    AuditEvent, RecordedEvent, RegistrationReceipt, RegistryEntry, VerificationOutcome,
};
use crate::domain::errors::{RegistryError, RegistryResult};
use crate::ports::inbound::RegistryApi;
use crate::ports::outbound::RecordStore;

#[async_trait]
impl<KV, TS, R> RegistryApi for RegistryService<KV, TS, R>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    R: RecordStore,
{
    async fn register(
        &self,
        entity_type: &str,
        entity_id: u64,
        record: Value,
    ) -> RegistryResult<RegistrationReceipt> {
        self.register_record(entity_type, entity_id, record).await
    }

    async fn record_event(
        &self,
        entity_id: u64,
        event_type: &str,
        details: Value,
    ) -> RegistryResult<RecordedEvent> {
        self.append_event(entity_id, event_type, details).await
    }

    async fn verify(&self, entity_id: u64) -> RegistryResult<VerificationOutcome> {
        self.verify_entity(entity_id).await
    }

    async fn audit_trail(&self, entity_id: u64) -> RegistryResult<Vec<AuditEvent>> {
        self.build_audit_trail(entity_id)
    }

    async fn entry(&self, entity_id: u64) -> RegistryResult<RegistryEntry> {
        self.entries
            .get(entity_id)?
            .ok_or(RegistryError::NotFound { entity_id })
    }

    async fn tampered_entries(&self) -> RegistryResult<Vec<RegistryEntry>> {
        self.tampered()
    }
}
