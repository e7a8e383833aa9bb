//! # Data Directory Locking
//!
//! Keeps a second process from opening the same ledger files. Two writers on
//! one chain file would each rewrite it from their own in-memory copy and
//! silently drop the other's blocks.
//!
//! - `flock`: exclusive `fs2` lock with a PID file
//! - `liveness`: stale-lock detection

mod flock;
mod liveness;

pub use flock::{DatabaseLock, LockError};
