//! # Registry Configuration
//!
//! The registry never interprets business fields on its own. Which field
//! names the vendor, which one is sensitive and which one lists sub-items is
//! declared per entity type through an `EntitySchema`.

use std::collections::HashMap;
use std::time::Duration;

use ledger_chain::domain::block::validate_data_type;
use ledger_chain::GENESIS_DATA_TYPE;

use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::payload::REGISTRY_EVENT_DATA_TYPE;

/// Field roles for one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySchema {
    /// Field whose value scopes the vendor signing key. Required when set.
    pub vendor_field: Option<String>,
    /// Field stored only as a hash, never in the clear.
    pub sensitive_field: Option<String>,
    /// Array field whose elements become Merkle leaves.
    pub sub_items_field: Option<String>,
    /// Encrypt the chain payload at rest.
    pub encrypt_payload: bool,
}

impl EntitySchema {
    /// Schema for invoices: `vendor_id`, `buyer_gstin`, `line_items`.
    pub fn invoice() -> Self {
        Self {
            vendor_field: Some("vendor_id".to_string()),
            sensitive_field: Some("buyer_gstin".to_string()),
            sub_items_field: Some("line_items".to_string()),
            encrypt_payload: false,
        }
    }

    pub fn with_vendor_field(mut self, field: impl Into<String>) -> Self {
        self.vendor_field = Some(field.into());
        self
    }

    pub fn with_sensitive_field(mut self, field: impl Into<String>) -> Self {
        self.sensitive_field = Some(field.into());
        self
    }

    pub fn with_sub_items_field(mut self, field: impl Into<String>) -> Self {
        self.sub_items_field = Some(field.into());
        self
    }

    pub fn with_encrypt_payload(mut self, encrypt: bool) -> Self {
        self.encrypt_payload = encrypt;
        self
    }
}

/// Configuration for the registry service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Upper bound on one proof-of-work search (default: 30s).
    pub seal_timeout: Duration,

    /// Largest accepted record, in canonical JSON bytes (default: 1 MiB).
    pub max_record_bytes: usize,

    /// Schemas by entity type. Unlisted types get `EntitySchema::default()`.
    pub schemas: HashMap<String, EntitySchema>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            seal_timeout: Duration::from_secs(30),
            max_record_bytes: 1024 * 1024,
            schemas: HashMap::from([("invoice".to_string(), EntitySchema::invoice())]),
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sealing timeout.
    pub fn with_seal_timeout(mut self, timeout: Duration) -> Self {
        self.seal_timeout = timeout;
        self
    }

    /// Set the record size limit.
    pub fn with_max_record_bytes(mut self, bytes: usize) -> Self {
        self.max_record_bytes = bytes;
        self
    }

    /// Register or replace the schema for `entity_type`.
    pub fn with_schema(mut self, entity_type: impl Into<String>, schema: EntitySchema) -> Self {
        self.schemas.insert(entity_type.into(), schema);
        self
    }

    /// Schema for `entity_type`.
    pub fn schema_for(&self, entity_type: &str) -> EntitySchema {
        self.schemas.get(entity_type).cloned().unwrap_or_default()
    }

    /// Check limits and schema names.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.seal_timeout.is_zero() {
            return Err(RegistryError::validation("seal_timeout must be positive"));
        }
        if self.max_record_bytes == 0 {
            return Err(RegistryError::validation("max_record_bytes must be positive"));
        }
        for entity_type in self.schemas.keys() {
            validate_entity_type(entity_type)?;
        }
        Ok(())
    }
}

/// Entity types share the chain's label rules and may not shadow the
/// ledger's own block types.
pub fn validate_entity_type(entity_type: &str) -> RegistryResult<()> {
    validate_data_type(entity_type)?;
    if entity_type == GENESIS_DATA_TYPE || entity_type == REGISTRY_EVENT_DATA_TYPE {
        return Err(RegistryError::validation(format!(
            "entity type {entity_type:?} is reserved"
        )));
    }
    Ok(())
}
