//! # Ledger Registry
//!
//! Anchors business records (invoices first) on the ledger chain and tells a
//! collaborator, at any later time, whether a record still matches what was
//! registered.
//!
//! ## Flow
//!
//! ```text
//! register(type, id, record)
//!   ├─ RecordFingerprint   canonical hash, field hashes, vendor, leaves
//!   ├─ RegistryEntry       persisted as Pending
//!   ├─ LedgerChain         prepare → seal (blocking pool, timeout) → commit
//!   └─ RecordStore         proof attached, entry Registered
//!
//! verify(id)
//!   └─ RecordStore::load → canonical hash == registered? → count / Tampered
//! ```
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entries, fingerprints, payload shapes, config, errors
//! - `ports/` - `RegistryApi` inbound, `RecordStore` outbound
//! - `adapters/` - `InMemoryRecordStore`
//! - `service/` - `RegistryService`

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::config::{EntitySchema, RegistryConfig};
pub use domain::entry::{
    AuditEvent, AuditEventType, RecordedEvent, RegistrationReceipt, RegistrationStatus,
    RegistryEntry, VerificationOutcome,
};
pub use domain::errors::{RegistryError, RegistryResult};
pub use domain::fingerprint::{RecordFingerprint, ABSENT_RECORD_HASH};
pub use domain::payload::REGISTRY_EVENT_DATA_TYPE;
pub use ports::{RecordStore, RegistryApi};
pub use service::{RegistryDependencies, RegistryService};
