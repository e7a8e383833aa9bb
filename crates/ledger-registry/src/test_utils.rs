//! Fixtures shared by unit tests and downstream test crates.

use std::sync::Arc;

use ledger_chain::adapters::{InMemoryKVStore, ManualTimeSource};
use ledger_chain::test_utils::{make_test_chain, test_signer, TestChain};
use serde_json::{json, Value};

use crate::adapters::InMemoryRecordStore;
use crate::domain::config::RegistryConfig;
use crate::service::{RegistryDependencies, RegistryService};

pub type TestRegistry = RegistryService<InMemoryKVStore, ManualTimeSource, InMemoryRecordStore>;

/// Registry over a fresh in-memory chain.
pub fn make_test_registry() -> (TestRegistry, InMemoryRecordStore, ManualTimeSource) {
    let (chain, _, clock) = make_test_chain();
    let (registry, records) = make_test_registry_on(Arc::new(chain), RegistryConfig::default());
    (registry, records, clock)
}

/// Registry over an existing chain, with its own entry and record stores.
pub fn make_test_registry_on(
    chain: Arc<TestChain>,
    config: RegistryConfig,
) -> (TestRegistry, InMemoryRecordStore) {
    let records = InMemoryRecordStore::new();
    let deps = RegistryDependencies {
        chain,
        entry_store: InMemoryKVStore::new(),
        records: records.clone(),
        signer: test_signer(),
    };
    let registry = RegistryService::new(deps, config).expect("test registry config is valid");
    (registry, records)
}

/// Invoice record unique to `n`.
pub fn sample_invoice(n: u64) -> Value {
    json!({
        "invoice_number": format!("INV-{n:05}"),
        "vendor_id": 100 + n % 3,
        "buyer_gstin": format!("29ABCDE{n:04}F1Z5"),
        "total": 1000 + n,
        "currency": "INR",
        "line_items": [
            {"sku": "SKU-1", "qty": 1 + n % 4, "price": 250},
            {"sku": "SKU-2", "qty": 2, "price": n}
        ]
    })
}
