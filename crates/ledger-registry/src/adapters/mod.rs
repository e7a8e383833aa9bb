//! # Adapters
//!
//! - `memory` - `InMemoryRecordStore` for tests and embedding

pub mod memory;

pub use memory::InMemoryRecordStore;
