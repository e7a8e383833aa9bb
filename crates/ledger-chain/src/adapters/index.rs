//! Hash-map duplicate index.

use std::collections::HashMap;

use crate::domain::block::Block;
use crate::ports::outbound::DuplicateIndex;

/// `(data_type, data_hash) -> first block index`, O(1) per lookup.
#[derive(Debug, Clone, Default)]
pub struct HashDuplicateIndex {
    entries: HashMap<(String, String), u64>,
}

impl HashDuplicateIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DuplicateIndex for HashDuplicateIndex {
    fn lookup(&self, data_type: &str, data_hash: &str) -> Option<u64> {
        // Tuple keys cannot be borrowed as (&str, &str).
        self.entries
            .get(&(data_type.to_string(), data_hash.to_string()))
            .copied()
    }

    fn record(&mut self, block: &Block) {
        if block.is_genesis() {
            return;
        }
        self.entries
            .entry((block.data_type.clone(), block.data_hash.clone()))
            .or_insert(block.index);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
