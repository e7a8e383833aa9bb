//! # Adapters Module
//!
//! Concrete implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `storage`: in-memory and file-backed key-value stores
//! - `serializer`: bincode block encoding
//! - `time`: system and manual clocks
//! - `index`: hash-map duplicate index
//! - `encryption`: plaintext and XChaCha20-Poly1305 payload providers
//! - `lock`: data directory process lock (feature `locking`)

pub mod encryption;
pub mod index;
#[cfg(feature = "locking")]
pub mod lock;
pub mod serializer;
pub mod storage;
pub mod time;

pub use encryption::PlaintextProvider;
#[cfg(feature = "encryption")]
pub use encryption::{PayloadKey, XChaCha20Provider};
pub use index::HashDuplicateIndex;
#[cfg(feature = "locking")]
pub use lock::{DatabaseLock, LockError};
pub use serializer::BincodeBlockSerializer;
pub use storage::{FileBackedKVStore, InMemoryKVStore};
pub use time::{ManualTimeSource, SystemTimeSource};
