//! Outbound Ports (Driven Ports)
//!
//! Implementations live in `crate::adapters`.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::entry::RegistrationReceipt;
use crate::domain::errors::RegistryResult;

/// The collaborator's storage for the records being anchored.
///
/// The registry reads the live record at verification time and writes the
/// chain proof back once a registration commits.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Current version of a record, `None` if it no longer exists.
    async fn load(&self, entity_type: &str, entity_id: u64) -> RegistryResult<Option<Value>>;

    /// Store the chain proof alongside the record.
    async fn attach_proof(&self, receipt: &RegistrationReceipt) -> RegistryResult<()>;
}
