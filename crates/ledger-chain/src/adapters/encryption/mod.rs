//! Encryption Adapters
//!
//! Implementations of the `EncryptionProvider` trait.

mod plaintext;
#[cfg(feature = "encryption")]
mod xchacha;

pub use plaintext::PlaintextProvider;
#[cfg(feature = "encryption")]
pub use xchacha::{PayloadKey, XChaCha20Provider};
