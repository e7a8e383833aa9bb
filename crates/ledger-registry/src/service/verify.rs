//! Tamper verification.

use std::collections::BTreeMap;

use ledger_chain::{KeyValueStore, TimeSource};

use super::RegistryService;
use crate::domain::entry::{RegistrationStatus, RegistryEntry, VerificationOutcome};
use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::fingerprint::{content_hashes, drift_fields, ABSENT_RECORD_HASH};
use crate::ports::outbound::RecordStore;

impl<KV, TS, R> RegistryService<KV, TS, R>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    R: RecordStore,
{
    pub(crate) async fn verify_entity(&self, entity_id: u64) -> RegistryResult<VerificationOutcome> {
        let entry = self.require_sealed(entity_id)?;

        // A deleted record has drifted in every registered field.
        let record = self.records.load(&entry.entity_type, entity_id).await?;
        let (current_hash, current_fields) = match &record {
            Some(record) => content_hashes(record)?,
            None => (ABSENT_RECORD_HASH.to_string(), BTreeMap::new()),
        };
        let matches = current_hash == entry.invoice_hash;

        let now = self.chain.now();
        let updated = self.entries.update(entity_id, |e| {
            e.tamper_check_count += 1;
            if e.is_tampered() {
                return;
            }
            if matches {
                e.last_verified_at = Some(now);
            } else {
                e.registration_status = RegistrationStatus::Tampered;
                e.tampered_at = Some(now);
            }
        })?;

        let drifted = if matches {
            Vec::new()
        } else {
            drift_fields(&entry.field_hashes, &current_fields)
        };

        if record.is_none() && !entry.is_tampered() {
            tracing::warn!(
                "[registry] 🚨 Tamper detected on {} {}: record deleted after block {:?}",
                entry.entity_type,
                entity_id,
                entry.block_index
            );
        } else if !matches && !entry.is_tampered() {
            tracing::warn!(
                "[registry] 🚨 Tamper detected on {} {}: fields {:?} changed since block {:?}",
                entry.entity_type,
                entity_id,
                drifted,
                entry.block_index
            );
        } else {
            tracing::debug!(
                "[registry] Verified {} {}: match={} status={:?}",
                entry.entity_type,
                entity_id,
                matches,
                updated.registration_status
            );
        }

        Ok(VerificationOutcome {
            entity_id,
            verified: matches && !updated.is_tampered(),
            current_hash,
            registered_hash: entry.invoice_hash,
            registration_status: updated.registration_status,
            drift_fields: drifted,
            tamper_check_count: updated.tamper_check_count,
        })
    }

    /// Entry that has made it onto the chain.
    pub(crate) fn require_sealed(&self, entity_id: u64) -> RegistryResult<RegistryEntry> {
        let entry = self
            .entries
            .get(entity_id)?
            .ok_or(RegistryError::NotFound { entity_id })?;
        if !entry.is_sealed() {
            return Err(RegistryError::validation(format!(
                "entity {entity_id} is not registered yet"
            )));
        }
        Ok(entry)
    }

    pub(crate) fn tampered(&self) -> RegistryResult<Vec<RegistryEntry>> {
        Ok(self
            .entries
            .scan()?
            .into_iter()
            .filter(RegistryEntry::is_tampered)
            .collect())
    }
}
