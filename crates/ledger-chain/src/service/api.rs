//! `LedgerChainApi` implementation. Snapshot reads only.

use crate::domain::block::Block;
use crate::domain::errors::ChainResult;
use crate::domain::validator::{ChainValidator, ValidationReport};
use crate::ports::inbound::{BlockDetail, BlockPage, ChainStats, LedgerChainApi};
use crate::ports::outbound::{KeyValueStore, TimeSource};

use super::LedgerChain;

/// Largest page `list_blocks` returns.
pub const MAX_PAGE_LIMIT: usize = 500;

impl<KV: KeyValueStore, TS: TimeSource> LedgerChainApi for LedgerChain<KV, TS> {
    fn validate_chain(&self) -> ValidationReport {
        let snapshot = self.snapshot();
        ChainValidator::new()
            .with_difficulty(self.config.difficulty)
            .validate(&snapshot, self.signer.as_ref())
    }

    fn get_block(&self, index: u64) -> ChainResult<BlockDetail> {
        let block = self.store.get(index)?;
        let signature_verified = match (&block.digital_signature, &self.signer) {
            (Some(signature), Some(signer)) => signer.verify(&block.block_hash, signature),
            _ => false,
        };
        Ok(BlockDetail {
            block,
            signature_verified,
        })
    }

    fn list_blocks(&self, data_type: Option<&str>, offset: usize, limit: usize) -> BlockPage {
        let (total, blocks) = self
            .store
            .list(data_type, offset, limit.min(MAX_PAGE_LIMIT));
        BlockPage { total, blocks }
    }

    fn stats(&self) -> ChainStats {
        let snapshot = self.snapshot();
        let mut stats = ChainStats {
            total_blocks: snapshot.len() as u64,
            ..ChainStats::default()
        };

        for block in snapshot.iter() {
            *stats.by_type.entry(block.data_type.clone()).or_insert(0) += 1;
            stats.signed_count += u64::from(block.is_signed());
            stats.encrypted_count += u64::from(block.is_encrypted);
        }
        stats
    }

    fn head(&self) -> Option<Block> {
        self.store.head()
    }
}
