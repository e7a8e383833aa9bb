//! # Invoice Ledger Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── chain_properties.rs   # Link, determinism and pinpointing properties
//!     ├── concurrency.rs        # Parallel registrations against one chain
//!     ├── persistence.rs        # File-backed reopen and on-disk tampering
//!     └── tamper.rs             # Registry verify / audit scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ledger-tests
//! cargo test -p ledger-tests integration::tamper
//!
//! # Benchmarks
//! cargo bench -p ledger-tests
//! ```

pub mod integration;
