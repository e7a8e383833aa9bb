//! Bincode encoding of blocks at rest.

use crate::domain::block::Block;
use crate::domain::errors::{ChainError, ChainResult};
use crate::ports::outbound::BlockSerializer;

/// Default block serializer using bincode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeBlockSerializer;

impl BlockSerializer for BincodeBlockSerializer {
    fn serialize(&self, block: &Block) -> ChainResult<Vec<u8>> {
        bincode::serialize(block).map_err(|e| ChainError::Serialization(e.to_string()))
    }

    fn deserialize(&self, data: &[u8]) -> ChainResult<Block> {
        bincode::deserialize(data).map_err(|e| ChainError::Serialization(e.to_string()))
    }
}
