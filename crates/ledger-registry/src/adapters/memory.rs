//! In-memory `RecordStore`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::domain::entry::RegistrationReceipt;
use crate::domain::errors::{RegistryError, RegistryResult};
use crate::ports::outbound::RecordStore;

type RecordKey = (String, u64);

#[derive(Default)]
struct Inner {
    records: HashMap<RecordKey, Value>,
    proofs: HashMap<RecordKey, RegistrationReceipt>,
}

/// Records and attached proofs held in memory. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, entity_type: &str, entity_id: u64, record: Value) {
        self.inner
            .write()
            .records
            .insert((entity_type.to_string(), entity_id), record);
    }

    /// Overwrite one field of a stored record. Returns `false` if the record
    /// does not exist or is not an object.
    pub fn set_field(&self, entity_type: &str, entity_id: u64, field: &str, value: Value) -> bool {
        let mut inner = self.inner.write();
        match inner
            .records
            .get_mut(&(entity_type.to_string(), entity_id))
            .and_then(Value::as_object_mut)
        {
            Some(fields) => {
                fields.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Remove a record.
    pub fn remove(&self, entity_type: &str, entity_id: u64) -> Option<Value> {
        self.inner
            .write()
            .records
            .remove(&(entity_type.to_string(), entity_id))
    }

    /// Proof attached to a record, if any.
    pub fn proof(&self, entity_type: &str, entity_id: u64) -> Option<RegistrationReceipt> {
        self.inner
            .read()
            .proofs
            .get(&(entity_type.to_string(), entity_id))
            .cloned()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn load(&self, entity_type: &str, entity_id: u64) -> RegistryResult<Option<Value>> {
        Ok(self
            .inner
            .read()
            .records
            .get(&(entity_type.to_string(), entity_id))
            .cloned())
    }

    async fn attach_proof(&self, receipt: &RegistrationReceipt) -> RegistryResult<()> {
        let key = (receipt.entity_type.clone(), receipt.entity_id);
        let mut inner = self.inner.write();
        if !inner.records.contains_key(&key) {
            return Err(RegistryError::RecordSource(format!(
                "no {} record {} to attach a proof to",
                receipt.entity_type, receipt.entity_id
            )));
        }
        inner.proofs.insert(key, receipt.clone());
        Ok(())
    }
}
