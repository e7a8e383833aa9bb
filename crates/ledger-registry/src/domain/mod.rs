//! # Registry Domain
//!
//! - `entry` - Registry entries, receipts, verification outcomes, audit events
//! - `fingerprint` - Canonical record hashes and per-field drift
//! - `payload` - What the registry writes into chain payloads
//! - `config` - Registry and per-entity-type configuration
//! - `errors` - Registry error types

pub mod config;
pub mod entry;
pub mod errors;
pub mod fingerprint;
pub mod payload;
