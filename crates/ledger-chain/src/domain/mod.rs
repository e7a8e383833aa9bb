//! # Domain Layer
//!
//! Pure ledger logic. Nothing in here performs I/O.
//!
//! ## Modules
//!
//! - `hashing` - Canonical JSON and SHA-256 content hashes
//! - `signature` - HMAC-SHA256 block and vendor signatures
//! - `merkle` - Merkle root over sub-item hashes
//! - `block` - Block, candidate and submission types, block hash
//! - `miner` - Proof-of-work nonce search
//! - `validator` - Full-chain integrity walk
//! - `config` - Chain configuration
//! - `errors` - Domain error types

pub mod block;
pub mod config;
pub mod errors;
pub mod hashing;
pub mod merkle;
pub mod miner;
pub mod signature;
pub mod validator;
