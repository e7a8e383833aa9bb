//! Cross-crate integration tests.

mod chain_properties;
mod concurrency;
mod persistence;
mod tamper;
