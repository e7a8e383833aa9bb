//! Chain payloads written by the registry.
//!
//! Both shapes carry `entity_id` and `entity_type` at the top level so the
//! audit trail can find them again without knowing which one it is reading.

use ledger_chain::{HashHex, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `data_type` of blocks that record a later event about an entity.
pub const REGISTRY_EVENT_DATA_TYPE: &str = "registry_event";

/// Body of a registration block (`data_type` = entity type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPayload {
    pub entity_id: u64,
    pub entity_type: String,
    pub invoice_hash: HashHex,
    pub vendor_signature: String,
    /// Record with the sensitive field replaced by its hash.
    pub record: Value,
}

/// Body of a `registry_event` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEventRecord {
    pub event_id: String,
    pub entity_id: u64,
    pub entity_type: String,
    pub event_type: String,
    /// Registered hash of the entity the event refers to.
    pub invoice_hash: HashHex,
    pub recorded_at: Timestamp,
    #[serde(default)]
    pub details: Value,
}

/// Entity reference shared by both payload shapes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityRef {
    pub entity_id: u64,
    pub entity_type: String,
}

impl EntityRef {
    /// Entity reference in a plaintext chain payload, if it has one.
    pub fn parse(payload: &str) -> Option<Self> {
        serde_json::from_str(payload).ok()
    }
}
