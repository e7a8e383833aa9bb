//! # Inbound Ports (Driving Ports)
//!
//! Read-side API of the ledger chain. Every call works on a committed
//! snapshot and never waits on an in-flight append.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::block::Block;
use crate::domain::errors::ChainResult;
use crate::domain::validator::ValidationReport;

/// A block plus the result of re-verifying its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDetail {
    pub block: Block,
    /// True only for signed blocks whose signature verifies now.
    pub signature_verified: bool,
}

/// One page of blocks, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPage {
    /// Blocks matching the filter, across all pages.
    pub total: u64,
    pub blocks: Vec<Block>,
}

/// Aggregate counters over the whole chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    pub total_blocks: u64,
    pub by_type: BTreeMap<String, u64>,
    pub signed_count: u64,
    pub encrypted_count: u64,
}

/// Primary read API of the ledger chain.
pub trait LedgerChainApi: Send + Sync {
    /// Walk the full chain and report every integrity violation.
    fn validate_chain(&self) -> ValidationReport;

    /// Block at `index` with its signature re-verified.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no block at this index
    fn get_block(&self, index: u64) -> ChainResult<BlockDetail>;

    /// Newest-first page of blocks, optionally restricted to one `data_type`.
    fn list_blocks(&self, data_type: Option<&str>, offset: usize, limit: usize) -> BlockPage;

    /// Counters by type, signature and encryption.
    fn stats(&self) -> ChainStats;

    /// Latest committed block, `None` before genesis.
    fn head(&self) -> Option<Block>;
}
