//! # Ports
//!
//! - `inbound` - `RegistryApi`, what collaborators call
//! - `outbound` - `RecordStore`, the collaborator's own record storage

pub mod inbound;
pub mod outbound;

pub use inbound::RegistryApi;
pub use outbound::RecordStore;
