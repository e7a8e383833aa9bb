//! Registration and later events.

use ledger_chain::domain::block::validate_data_type;
use ledger_chain::{canonical_json, sha256_hex, Block, ChainSubmission, KeyValueStore, TimeSource};
use serde_json::Value;
use uuid::Uuid;

use super::RegistryService;
use crate::domain::config::validate_entity_type;
use crate::domain::entry::{RecordedEvent, RegistrationReceipt, RegistrationStatus, RegistryEntry};
use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::fingerprint::RecordFingerprint;
use crate::domain::payload::{
    EntityRef, RegistrationPayload, RegistryEventRecord, REGISTRY_EVENT_DATA_TYPE,
};
use crate::ports::outbound::RecordStore;

/// Signing scope for a vendor's records, or the entity type when the schema
/// names no vendor.
pub(crate) fn vendor_scope(entity_type: &str, vendor: Option<&str>) -> String {
    match vendor {
        Some(vendor) => format!("vendor:{entity_type}:{vendor}"),
        None => format!("entity:{entity_type}"),
    }
}

/// Signing scope for sensitive-field hashes of an entity type.
pub(crate) fn sensitive_scope(entity_type: &str) -> String {
    format!("sensitive:{entity_type}")
}

impl<KV, TS, R> RegistryService<KV, TS, R>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    R: RecordStore,
{
    pub(crate) async fn register_record(
        &self,
        entity_type: &str,
        entity_id: u64,
        record: Value,
    ) -> RegistryResult<RegistrationReceipt> {
        validate_entity_type(entity_type)?;
        let canonical = canonical_json(&record)?;
        if canonical.len() > self.config.max_record_bytes {
            return Err(RegistryError::validation(format!(
                "record is {} bytes, limit is {}",
                canonical.len(),
                self.config.max_record_bytes
            )));
        }

        let schema = self.config.schema_for(entity_type);
        let sensitive_key = self.signer.scoped(&sensitive_scope(entity_type));
        let fingerprint = RecordFingerprint::compute(&schema, &record, &sensitive_key)?;

        let _queue = self.write_queue.lock().await;

        let pending = match self.entries.get(entity_id)? {
            Some(existing) if existing.is_sealed() => {
                return Err(RegistryError::Duplicate {
                    entity_type: entity_type.to_string(),
                    reason: format!("entity {entity_id} is already registered"),
                    existing_block: existing.block_index,
                });
            }
            other => other,
        };

        if let Some(existing_index) = self.chain.find_duplicate(entity_type, &fingerprint.invoice_hash) {
            // A retry whose earlier attempt committed but never recorded it.
            if let Some(entry) = pending.filter(|p| p.invoice_hash == fingerprint.invoice_hash) {
                let block = self.chain.store().get(existing_index)?;
                if self.block_registers(&block, entity_id) {
                    tracing::info!(
                        "[registry] Recovered registration of {} {} from block {}",
                        entity_type,
                        entity_id,
                        block.index
                    );
                    return self.finish_registration(entry, &block).await;
                }
            }
            return Err(RegistryError::Duplicate {
                entity_type: entity_type.to_string(),
                reason: format!("identical record already on chain at block {existing_index}"),
                existing_block: Some(existing_index),
            });
        }

        let vendor_signature = self
            .signer
            .scoped(&vendor_scope(entity_type, fingerprint.vendor.as_deref()))
            .sign(&fingerprint.invoice_hash);

        let entry = RegistryEntry {
            entity_id,
            entity_type: entity_type.to_string(),
            invoice_hash: fingerprint.invoice_hash.clone(),
            vendor_signature: vendor_signature.clone(),
            buyer_gstin_hash: fingerprint.sensitive_hash.clone(),
            merkle_root: None,
            block_index: None,
            block_hash: None,
            registration_status: RegistrationStatus::Pending,
            tamper_check_count: 0,
            field_hashes: fingerprint.field_hashes.clone(),
            created_at: pending.map(|p| p.created_at).unwrap_or_else(|| self.chain.now()),
            registered_at: None,
            last_verified_at: None,
            tampered_at: None,
        };
        self.entries.put(&entry)?;

        let payload = RegistrationPayload {
            entity_id,
            entity_type: entity_type.to_string(),
            invoice_hash: fingerprint.invoice_hash.clone(),
            vendor_signature,
            record: fingerprint.redacted.clone(),
        };
        let submission = ChainSubmission::new(
            entity_type,
            fingerprint.invoice_hash.clone(),
            canonical_json(&serde_json::to_value(&payload)?)?,
        )
        .with_sub_items(fingerprint.leaves())
        .with_encryption(schema.encrypt_payload);

        let block = self.seal_and_commit(submission).await?;
        tracing::info!(
            "[registry] 📜 Registered {} {} in block {} ({})",
            entity_type,
            entity_id,
            block.index,
            block.block_hash
        );
        self.finish_registration(entry, &block).await
    }

    /// Mark the entry registered and hand the proof to the record store.
    async fn finish_registration(
        &self,
        entry: RegistryEntry,
        block: &Block,
    ) -> RegistryResult<RegistrationReceipt> {
        let registered = self.entries.update(entry.entity_id, |e| {
            e.registration_status = RegistrationStatus::Registered;
            e.block_index = Some(block.index);
            e.block_hash = Some(block.block_hash.clone());
            e.merkle_root = Some(block.merkle_root.clone());
            e.registered_at = Some(block.timestamp);
        })?;

        let receipt = RegistrationReceipt {
            entity_id: registered.entity_id,
            entity_type: registered.entity_type,
            invoice_hash: registered.invoice_hash,
            vendor_signature: registered.vendor_signature,
            block_index: block.index,
            block_hash: block.block_hash.clone(),
            merkle_root: block.merkle_root.clone(),
        };

        // The block is committed either way; a missing proof can be reattached.
        if let Err(e) = self.records.attach_proof(&receipt).await {
            tracing::warn!(
                "[registry] Could not attach proof to {} {}: {}",
                receipt.entity_type,
                receipt.entity_id,
                e
            );
        }
        Ok(receipt)
    }

    fn block_registers(&self, block: &Block, entity_id: u64) -> bool {
        self.chain
            .decrypt_payload(block)
            .ok()
            .and_then(|payload| EntityRef::parse(&payload))
            .is_some_and(|entity| entity.entity_id == entity_id && entity.entity_type == block.data_type)
    }

    pub(crate) async fn append_event(
        &self,
        entity_id: u64,
        event_type: &str,
        details: Value,
    ) -> RegistryResult<RecordedEvent> {
        validate_data_type(event_type)?;

        let entry = self
            .entries
            .get(entity_id)?
            .ok_or(RegistryError::NotFound { entity_id })?;
        if !entry.is_sealed() {
            return Err(RegistryError::validation(format!(
                "entity {entity_id} is not registered yet"
            )));
        }

        let _queue = self.write_queue.lock().await;

        let record = RegistryEventRecord {
            event_id: Uuid::new_v4().to_string(),
            entity_id,
            entity_type: entry.entity_type.clone(),
            event_type: event_type.to_string(),
            invoice_hash: entry.invoice_hash.clone(),
            recorded_at: self.chain.now(),
            details,
        };
        let payload = canonical_json(&serde_json::to_value(&record)?)?;
        if payload.len() > self.config.max_record_bytes {
            return Err(RegistryError::validation(format!(
                "event is {} bytes, limit is {}",
                payload.len(),
                self.config.max_record_bytes
            )));
        }

        let schema = self.config.schema_for(&entry.entity_type);
        let submission = ChainSubmission::new(
            REGISTRY_EVENT_DATA_TYPE,
            sha256_hex(payload.as_bytes()),
            payload,
        )
        .with_sub_items(vec![entry.invoice_hash])
        .with_encryption(schema.encrypt_payload);

        let block = self.seal_and_commit(submission).await?;
        tracing::info!(
            "[registry] Recorded {} event for {} {} in block {}",
            event_type,
            entry.entity_type,
            entity_id,
            block.index
        );

        Ok(RecordedEvent {
            event_id: record.event_id,
            entity_id,
            event_type: record.event_type,
            block_index: block.index,
            block_hash: block.block_hash,
        })
    }
}
