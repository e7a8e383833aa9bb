//! # Registry Entries
//!
//! One `RegistryEntry` per registered entity, keyed by `entity_id`.
//!
//! ```text
//! Pending ──register ok──→ Registered ──verify mismatch──→ Tampered
//!    │                         │                             │
//!    └─ seal failed: retry     └─ verify ok: count += 1      └─ sticky
//! ```

use std::collections::BTreeMap;

use ledger_chain::{HashHex, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::{RegistryError, RegistryResult};

/// Lifecycle of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Persisted before sealing; the chain does not carry it yet.
    Pending,
    /// Sealed and committed.
    Registered,
    /// A verification found drift. Never reverts.
    Tampered,
}

/// What the registry remembers about one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub entity_id: u64,
    pub entity_type: String,
    /// Canonical hash at registration.
    pub invoice_hash: HashHex,
    /// HMAC of `invoice_hash` under the vendor-scoped key.
    pub vendor_signature: String,
    pub buyer_gstin_hash: Option<HashHex>,
    pub merkle_root: Option<HashHex>,
    pub block_index: Option<u64>,
    pub block_hash: Option<HashHex>,
    pub registration_status: RegistrationStatus,
    /// Number of verifications performed.
    pub tamper_check_count: u64,
    /// Per-field hashes at registration, for drift reports.
    pub field_hashes: BTreeMap<String, HashHex>,
    pub created_at: Timestamp,
    pub registered_at: Option<Timestamp>,
    pub last_verified_at: Option<Timestamp>,
    pub tampered_at: Option<Timestamp>,
}

impl RegistryEntry {
    /// Whether the entity is on the chain.
    pub fn is_sealed(&self) -> bool {
        self.registration_status != RegistrationStatus::Pending
    }

    pub fn is_tampered(&self) -> bool {
        self.registration_status == RegistrationStatus::Tampered
    }
}

/// Chain proof handed back to the collaborator after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    pub entity_id: u64,
    pub entity_type: String,
    pub invoice_hash: HashHex,
    pub vendor_signature: String,
    pub block_index: u64,
    pub block_hash: HashHex,
    pub merkle_root: HashHex,
}

/// Result of a later `record_event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_id: String,
    pub entity_id: u64,
    pub event_type: String,
    pub block_index: u64,
    pub block_hash: HashHex,
}

/// Result of comparing a current record with its registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub entity_id: u64,
    pub verified: bool,
    pub current_hash: HashHex,
    pub registered_hash: HashHex,
    pub registration_status: RegistrationStatus,
    /// Fields whose hash changed since registration, sorted.
    pub drift_fields: Vec<String>,
    pub tamper_check_count: u64,
}

impl VerificationOutcome {
    /// Turn a failed verification into `TamperDetected`.
    pub fn into_result(self) -> RegistryResult<Self> {
        if self.verified {
            Ok(self)
        } else {
            Err(RegistryError::TamperDetected {
                entity_id: self.entity_id,
                registered_hash: self.registered_hash,
                current_hash: self.current_hash,
            })
        }
    }
}

/// Kind of entry in an audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum AuditEventType {
    /// Entry first persisted.
    Created,
    /// Registration block committed.
    Registered,
    /// Later `registry_event` block, named by its event type.
    Event(String),
    /// Most recent successful verification.
    Verified,
    /// First failed verification.
    TamperDetected,
}

impl AuditEventType {
    /// Position among events with the same timestamp.
    fn rank(&self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Registered => 1,
            Self::Event(_) => 2,
            Self::Verified => 3,
            Self::TamperDetected => 4,
        }
    }
}

/// One line of an entity's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    /// Block carrying the event; `None` for events derived from the entry.
    pub block_index: Option<u64>,
    pub timestamp: Timestamp,
    /// Block hash, or the registered record hash for entry-derived events.
    pub hash: HashHex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Order events oldest first, breaking ties by lifecycle position, then by
/// block index.
pub fn sort_audit_trail(events: &mut [AuditEvent]) {
    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.event_type.rank().cmp(&b.event_type.rank()))
            .then_with(|| a.block_index.cmp(&b.block_index))
    });
}
