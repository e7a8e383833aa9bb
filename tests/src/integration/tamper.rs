//! # Tamper Detection
//!
//! End-to-end registry flows: record drift against the anchored
//! fingerprint, duplicate rejection and the audit trail that results.

#[cfg(test)]
mod tests {
    use ledger_chain::LedgerChainApi;
    use ledger_registry::test_utils::{make_test_registry, sample_invoice};
    use ledger_registry::{AuditEventType, RegistrationStatus, RegistryApi, RegistryError};
    use serde_json::json;

    // =========================================================================
    // DRIFT
    // =========================================================================

    #[tokio::test]
    async fn test_each_field_edit_is_reported() {
        let edits = [
            ("total", json!(1)),
            ("currency", json!("USD")),
            ("vendor_id", json!(999)),
            ("buyer_gstin", json!("07AAAAA0000A1Z5")),
            ("line_items", json!([])),
        ];

        for (id, (field, value)) in (1u64..).zip(edits) {
            let (registry, records, _) = make_test_registry();
            records.insert("invoice", id, sample_invoice(id));
            registry
                .register("invoice", id, sample_invoice(id))
                .await
                .unwrap();

            records.set_field("invoice", id, field, value);
            let outcome = registry.verify(id).await.unwrap();

            assert!(!outcome.verified, "edit to {field} went unnoticed");
            assert_eq!(outcome.drift_fields, vec![field.to_string()]);
            // The chain itself is untouched by record drift.
            assert!(registry.chain().validate_chain().valid);
        }
    }

    #[tokio::test]
    async fn test_added_field_counts_as_drift() {
        let (registry, records, _) = make_test_registry();
        records.insert("invoice", 1, sample_invoice(1));
        registry
            .register("invoice", 1, sample_invoice(1))
            .await
            .unwrap();

        records.set_field("invoice", 1, "discount", json!(50));
        let outcome = registry.verify(1).await.unwrap();

        assert!(!outcome.verified);
        assert_eq!(outcome.drift_fields, vec!["discount"]);
    }

    #[tokio::test]
    async fn test_only_the_edited_entity_is_flagged() {
        let (registry, records, _) = make_test_registry();
        for id in 1..=4 {
            records.insert("invoice", id, sample_invoice(id));
            registry
                .register("invoice", id, sample_invoice(id))
                .await
                .unwrap();
        }

        records.set_field("invoice", 3, "total", json!(0));
        for id in 1..=4 {
            let outcome = registry.verify(id).await.unwrap();
            assert_eq!(outcome.verified, id != 3);
        }

        let tampered = registry.tampered_entries().await.unwrap();
        assert_eq!(tampered.len(), 1);
        assert_eq!(tampered[0].entity_id, 3);
        assert_eq!(
            registry.entry(3).await.unwrap().registration_status,
            RegistrationStatus::Tampered
        );
    }

    // =========================================================================
    // DUPLICATES
    // =========================================================================

    #[tokio::test]
    async fn test_rejected_duplicates_do_not_grow_chain() {
        let (registry, _, _) = make_test_registry();
        registry
            .register("invoice", 1, sample_invoice(1))
            .await
            .unwrap();
        let head = registry.chain().head().unwrap();

        for attempt in [
            registry.register("invoice", 1, sample_invoice(1)).await,
            registry.register("invoice", 2, sample_invoice(1)).await,
        ] {
            assert!(matches!(attempt, Err(RegistryError::Duplicate { .. })));
        }

        assert_eq!(registry.chain().head().unwrap().block_hash, head.block_hash);
        assert!(matches!(
            registry.entry(2).await,
            Err(RegistryError::NotFound { entity_id: 2 })
        ));
    }

    #[tokio::test]
    async fn test_same_content_other_type_is_accepted() {
        let (registry, _, _) = make_test_registry();
        registry
            .register("invoice", 1, sample_invoice(1))
            .await
            .unwrap();

        let receipt = registry
            .register("credit_note", 2, sample_invoice(1))
            .await
            .unwrap();
        assert_eq!(receipt.block_index, 2);
        assert_eq!(registry.chain().stats().by_type["credit_note"], 1);
    }

    // =========================================================================
    // AUDIT
    // =========================================================================

    #[tokio::test]
    async fn test_audit_trail_tells_the_whole_story() {
        let (registry, records, clock) = make_test_registry();
        records.insert("invoice", 1, sample_invoice(1));
        registry
            .register("invoice", 1, sample_invoice(1))
            .await
            .unwrap();

        clock.advance(100);
        registry
            .record_event(1, "payment", json!({"amount": 1001}))
            .await
            .unwrap();
        clock.advance(100);
        records.set_field("invoice", 1, "total", json!(1));
        registry.verify(1).await.unwrap();

        let trail = registry.audit_trail(1).await.unwrap();
        let kinds: Vec<_> = trail.iter().map(|e| e.event_type.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                AuditEventType::Created,
                AuditEventType::Registered,
                AuditEventType::Event("payment".into()),
                AuditEventType::Verified,
                AuditEventType::TamperDetected,
            ]
        );

        // Events are anchored in the chain, findings are not.
        assert!(trail[1].block_index.is_some());
        assert!(trail[2].block_index.is_some());
        assert!(trail[3].block_index.is_none());
        assert_eq!(registry.chain().stats().total_blocks, 3);
    }
}
