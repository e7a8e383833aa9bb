//! # Ports Layer
//!
//! Trait boundaries of the ledger chain.
//!
//! - `inbound` - Read API exposed to collaborators (`LedgerChainApi`)
//! - `outbound` - Storage, serialization, time, duplicate index, encryption

pub mod inbound;
pub mod outbound;
