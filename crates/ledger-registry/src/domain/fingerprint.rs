//! # Record Fingerprints
//!
//! A fingerprint is everything the registry derives from a record before it
//! touches the chain: the canonical hash, one hash per top-level field, the
//! vendor key scope, the sensitive-field hash and the sub-item leaves.
//!
//! The sensitive field is hashed with an HMAC key scoped to the entity type,
//! never with plain SHA-256.
//!
//! Canonical hashing ignores key order, so re-serializing a record never
//! counts as tampering.

use std::collections::BTreeMap;

use ledger_chain::{hash_payload, BlockSigner, HashHex, EMPTY_MERKLE_ROOT};
use serde_json::Value;

use crate::domain::config::EntitySchema;
use crate::domain::errors::{RegistryError, RegistryResult};

/// `current_hash` reported for a record that no longer exists: the SHA-256
/// of empty input, which no canonical JSON text hashes to.
pub const ABSENT_RECORD_HASH: &str = EMPTY_MERKLE_ROOT;

/// Hashes derived from one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFingerprint {
    /// Canonical hash of the whole record.
    pub invoice_hash: HashHex,
    /// Canonical hash per top-level field.
    pub field_hashes: BTreeMap<String, HashHex>,
    /// Vendor identifier scoping the signing key.
    pub vendor: Option<String>,
    /// Keyed hash of the sensitive field, never the value itself.
    pub sensitive_hash: Option<HashHex>,
    /// One leaf per sub-item, in record order.
    pub sub_item_hashes: Vec<HashHex>,
    /// The record with the sensitive field replaced by its hash.
    pub redacted: Value,
}

impl RecordFingerprint {
    /// Fingerprint `record` under `schema`, hashing the sensitive field
    /// with `sensitive_key`.
    ///
    /// ## Errors
    ///
    /// - `Validation`: not a non-empty object, missing vendor field, or a
    ///   sub-items field that is not an array
    pub fn compute(
        schema: &EntitySchema,
        record: &Value,
        sensitive_key: &BlockSigner,
    ) -> RegistryResult<Self> {
        let fields = record
            .as_object()
            .ok_or_else(|| RegistryError::validation("record must be a JSON object"))?;
        if fields.is_empty() {
            return Err(RegistryError::validation("record has no fields"));
        }

        let (invoice_hash, field_hashes) = content_hashes(record)?;

        let vendor = match &schema.vendor_field {
            Some(field) => {
                let value = fields.get(field).ok_or_else(|| {
                    RegistryError::validation(format!("missing vendor field {field:?}"))
                })?;
                Some(scalar_text(field, value)?)
            }
            None => None,
        };

        let sensitive_hash = match &schema.sensitive_field {
            Some(field) => match fields.get(field) {
                Some(Value::Null) | None => None,
                Some(value) => Some(sensitive_key.sign(&scalar_text(field, value)?)),
            },
            None => None,
        };

        let sub_item_hashes = match &schema.sub_items_field {
            Some(field) => match fields.get(field) {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(hash_payload)
                    .collect::<Result<Vec<_>, _>>()?,
                Some(Value::Null) | None => Vec::new(),
                Some(_) => {
                    return Err(RegistryError::validation(format!(
                        "sub-items field {field:?} must be an array"
                    )))
                }
            },
            None => Vec::new(),
        };

        let mut redacted = record.clone();
        if let (Some(field), Some(hash)) = (&schema.sensitive_field, &sensitive_hash) {
            if let Some(slot) = redacted.get_mut(field) {
                *slot = Value::String(hash.clone());
            }
        }

        Ok(Self {
            invoice_hash,
            field_hashes,
            vendor,
            sensitive_hash,
            sub_item_hashes,
            redacted,
        })
    }

    /// Merkle leaves for the registration block, before the payload leaf:
    /// record hash, sub-items, then the sensitive-field hash.
    pub fn leaves(&self) -> Vec<HashHex> {
        let mut leaves = Vec::with_capacity(self.sub_item_hashes.len() + 2);
        leaves.push(self.invoice_hash.clone());
        leaves.extend(self.sub_item_hashes.iter().cloned());
        if let Some(hash) = &self.sensitive_hash {
            leaves.push(hash.clone());
        }
        leaves
    }
}

/// Canonical hash of any record plus per-field hashes of its top level.
///
/// Accepts every JSON shape, so a record that was damaged into a non-object
/// still hashes (with no fields) and shows up as drift.
pub fn content_hashes(record: &Value) -> RegistryResult<(HashHex, BTreeMap<String, HashHex>)> {
    let mut field_hashes = BTreeMap::new();
    if let Some(fields) = record.as_object() {
        for (name, value) in fields {
            field_hashes.insert(name.clone(), hash_payload(value)?);
        }
    }
    Ok((hash_payload(record)?, field_hashes))
}

/// Strings are taken as-is; numbers and booleans by their JSON text.
fn scalar_text(field: &str, value: &Value) -> RegistryResult<String> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(RegistryError::validation(format!(
            "field {field:?} must be a non-empty string or number"
        ))),
    }
}

/// Fields whose hash differs between registration and now, including
/// fields that were added or removed. Sorted by name.
pub fn drift_fields(
    registered: &BTreeMap<String, HashHex>,
    current: &BTreeMap<String, HashHex>,
) -> Vec<String> {
    let mut drifted: Vec<String> = registered
        .iter()
        .filter(|(name, hash)| current.get(*name) != Some(*hash))
        .map(|(name, _)| name.clone())
        .collect();
    drifted.extend(
        current
            .keys()
            .filter(|name| !registered.contains_key(*name))
            .cloned(),
    );
    drifted.sort();
    drifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_chain::test_utils::test_signer;
    use serde_json::json;

    fn key() -> BlockSigner {
        test_signer().scoped("sensitive:invoice")
    }

    fn invoice() -> Value {
        json!({
            "invoice_number": "INV-001",
            "vendor_id": 17,
            "buyer_gstin": "29ABCDE1234F1Z5",
            "total": 1180.0,
            "line_items": [
                {"sku": "A-1", "qty": 2, "price": 500},
                {"sku": "B-2", "qty": 1, "price": 180}
            ]
        })
    }

    #[test]
    fn test_invoice_fingerprint() {
        let fp = RecordFingerprint::compute(&EntitySchema::invoice(), &invoice(), &key()).unwrap();

        assert_eq!(fp.vendor.as_deref(), Some("17"));
        assert_eq!(fp.sub_item_hashes.len(), 2);
        assert_eq!(
            fp.sensitive_hash.as_deref(),
            Some(key().sign("29ABCDE1234F1Z5").as_str())
        );
        assert_eq!(fp.field_hashes.len(), 5);
        assert_eq!(fp.leaves().len(), 4);
        assert_eq!(fp.leaves()[0], fp.invoice_hash);
    }

    #[test]
    fn test_sensitive_hash_is_keyed() {
        let record = invoice();
        let fp = RecordFingerprint::compute(&EntitySchema::invoice(), &record, &key()).unwrap();
        let hash = fp.sensitive_hash.unwrap();

        // Not recoverable by hashing candidate identifiers without the key.
        assert_ne!(hash, ledger_chain::sha256_hex(b"29ABCDE1234F1Z5"));
        let other_scope = test_signer().scoped("sensitive:receipt");
        let other = RecordFingerprint::compute(&EntitySchema::invoice(), &record, &other_scope)
            .unwrap()
            .sensitive_hash
            .unwrap();
        assert_ne!(hash, other);
    }

    #[test]
    fn test_redaction_hides_sensitive_value() {
        let fp = RecordFingerprint::compute(&EntitySchema::invoice(), &invoice(), &key()).unwrap();
        let text = fp.redacted.to_string();

        assert!(!text.contains("29ABCDE1234F1Z5"));
        assert_eq!(fp.redacted["buyer_gstin"], json!(fp.sensitive_hash.unwrap()));
        // The canonical hash still covers the original record.
        assert_eq!(fp.invoice_hash, hash_payload(&invoice()).unwrap());
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a = json!({"vendor_id": "v1", "total": 10});
        let b: Value = serde_json::from_str(r#"{"total":10,"vendor_id":"v1"}"#).unwrap();
        let schema = EntitySchema::default().with_vendor_field("vendor_id");

        assert_eq!(
            RecordFingerprint::compute(&schema, &a, &key()).unwrap().invoice_hash,
            RecordFingerprint::compute(&schema, &b, &key()).unwrap().invoice_hash
        );
    }

    #[test]
    fn test_rejects_malformed_records() {
        let schema = EntitySchema::invoice();

        assert!(RecordFingerprint::compute(&schema, &json!([1, 2]), &key()).is_err());
        assert!(RecordFingerprint::compute(&schema, &json!({}), &key()).is_err());
        assert!(RecordFingerprint::compute(&schema, &json!({"total": 1}), &key()).is_err());
        assert!(RecordFingerprint::compute(
            &schema,
            &json!({"vendor_id": "v", "line_items": "oops"}),
            &key()
        )
        .is_err());
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let fp =
            RecordFingerprint::compute(&EntitySchema::invoice(), &json!({"vendor_id": "v9"}), &key())
                .unwrap();

        assert!(fp.sensitive_hash.is_none());
        assert!(fp.sub_item_hashes.is_empty());
        assert_eq!(fp.leaves(), vec![fp.invoice_hash.clone()]);
    }

    #[test]
    fn test_drift_fields() {
        let schema = EntitySchema::invoice();
        let before = RecordFingerprint::compute(&schema, &invoice(), &key()).unwrap();

        let mut changed = invoice();
        changed["total"] = json!(9999.0);
        changed["notes"] = json!("edited");
        changed.as_object_mut().unwrap().remove("buyer_gstin");
        let after = RecordFingerprint::compute(&schema, &changed, &key()).unwrap();

        assert_eq!(
            drift_fields(&before.field_hashes, &after.field_hashes),
            vec!["buyer_gstin", "notes", "total"]
        );
        assert!(drift_fields(&before.field_hashes, &before.field_hashes).is_empty());
    }

    #[test]
    fn test_content_hashes_accept_any_shape() {
        let (hash, fields) = content_hashes(&json!("overwritten")).unwrap();
        assert_eq!(hash, hash_payload(&json!("overwritten")).unwrap());
        assert!(fields.is_empty());
    }
}
