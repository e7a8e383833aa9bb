//! Audit trail assembly.

use ledger_chain::{KeyValueStore, TimeSource};

use super::RegistryService;
use crate::domain::entry::{sort_audit_trail, AuditEvent, AuditEventType};
use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::payload::{RegistryEventRecord, REGISTRY_EVENT_DATA_TYPE};
use crate::ports::outbound::RecordStore;

impl<KV, TS, R> RegistryService<KV, TS, R>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    R: RecordStore,
{
    /// Entry lifecycle merged with every block that refers to the entity.
    pub(crate) fn build_audit_trail(&self, entity_id: u64) -> RegistryResult<Vec<AuditEvent>> {
        let entry = self
            .entries
            .get(entity_id)?
            .ok_or(RegistryError::NotFound { entity_id })?;

        let mut events = vec![AuditEvent {
            event_type: AuditEventType::Created,
            block_index: None,
            timestamp: entry.created_at,
            hash: entry.invoice_hash.clone(),
            details: None,
        }];

        for block in self.chain.snapshot().iter() {
            if Some(block.index) == entry.block_index {
                events.push(AuditEvent {
                    event_type: AuditEventType::Registered,
                    block_index: Some(block.index),
                    timestamp: block.timestamp,
                    hash: block.block_hash.clone(),
                    details: None,
                });
                continue;
            }
            if block.data_type != REGISTRY_EVENT_DATA_TYPE {
                continue;
            }

            let payload = match self.chain.decrypt_payload(block) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::debug!("[registry] Skipping unreadable block {}: {}", block.index, e);
                    continue;
                }
            };
            let Ok(event) = serde_json::from_str::<RegistryEventRecord>(&payload) else {
                continue;
            };
            if event.entity_id != entity_id || event.entity_type != entry.entity_type {
                continue;
            }
            events.push(AuditEvent {
                event_type: AuditEventType::Event(event.event_type),
                block_index: Some(block.index),
                timestamp: block.timestamp,
                hash: block.block_hash.clone(),
                details: Some(event.details),
            });
        }

        if let Some(timestamp) = entry.last_verified_at {
            events.push(AuditEvent {
                event_type: AuditEventType::Verified,
                block_index: None,
                timestamp,
                hash: entry.invoice_hash.clone(),
                details: None,
            });
        }
        if let Some(timestamp) = entry.tampered_at {
            events.push(AuditEvent {
                event_type: AuditEventType::TamperDetected,
                block_index: None,
                timestamp,
                hash: entry.invoice_hash.clone(),
                details: None,
            });
        }

        sort_audit_trail(&mut events);
        Ok(events)
    }
}
