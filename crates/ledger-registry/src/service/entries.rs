//! Registry entry persistence: one JSON document per entity under `r:`.

use ledger_chain::KeyValueStore;
use parking_lot::Mutex;

use crate::domain::entry::RegistryEntry;
use crate::domain::errors::{RegistryError, RegistryResult};

/// Key prefix for registry entries.
pub const ENTRY_PREFIX: &[u8] = b"r:";

/// `r:` followed by the big-endian entity id, so scans run in id order.
pub fn entry_key(entity_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(ENTRY_PREFIX.len() + 8);
    key.extend_from_slice(ENTRY_PREFIX);
    key.extend_from_slice(&entity_id.to_be_bytes());
    key
}

/// Entries over a key-value store. Every read-modify-write runs under one
/// lock.
pub struct EntryStore<KV: KeyValueStore> {
    kv: Mutex<KV>,
}

impl<KV: KeyValueStore> EntryStore<KV> {
    pub fn new(kv: KV) -> Self {
        Self { kv: Mutex::new(kv) }
    }

    pub fn get(&self, entity_id: u64) -> RegistryResult<Option<RegistryEntry>> {
        let kv = self.kv.lock();
        read_entry(&*kv, entity_id)
    }

    /// Insert or replace an entry.
    pub fn put(&self, entry: &RegistryEntry) -> RegistryResult<()> {
        let bytes = serde_json::to_vec(entry)?;
        self.kv.lock().put(&entry_key(entry.entity_id), &bytes)?;
        Ok(())
    }

    /// Apply `change` to a stored entry and persist the result.
    pub fn update(
        &self,
        entity_id: u64,
        change: impl FnOnce(&mut RegistryEntry),
    ) -> RegistryResult<RegistryEntry> {
        let mut kv = self.kv.lock();
        let mut entry =
            read_entry(&*kv, entity_id)?.ok_or(RegistryError::NotFound { entity_id })?;
        change(&mut entry);
        kv.put(&entry_key(entity_id), &serde_json::to_vec(&entry)?)?;
        Ok(entry)
    }

    /// Every entry, in id order.
    pub fn scan(&self) -> RegistryResult<Vec<RegistryEntry>> {
        let pairs = self.kv.lock().prefix_scan(ENTRY_PREFIX)?;
        pairs
            .iter()
            .map(|(_, bytes)| serde_json::from_slice(bytes).map_err(RegistryError::from))
            .collect()
    }
}

fn read_entry<KV: KeyValueStore>(kv: &KV, entity_id: u64) -> RegistryResult<Option<RegistryEntry>> {
    match kv.get(&entry_key(entity_id))? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}
