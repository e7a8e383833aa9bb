use crate::domain::errors::{ChainError, ChainResult};
use crate::ports::outbound::EncryptionProvider;

/// Provider used when no payload key is configured.
///
/// Reports itself inactive, so submissions asking for encryption are
/// rejected instead of silently stored in the clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextProvider;

impl EncryptionProvider for PlaintextProvider {
    fn name(&self) -> &'static str {
        "plaintext"
    }

    fn is_active(&self) -> bool {
        false
    }

    fn encrypt(&self, _plaintext: &[u8]) -> ChainResult<Vec<u8>> {
        Err(ChainError::Crypto(
            "no encryption provider configured".to_string(),
        ))
    }

    fn decrypt(&self, _ciphertext: &[u8]) -> ChainResult<Vec<u8>> {
        Err(ChainError::Crypto(
            "no encryption provider configured".to_string(),
        ))
    }
}
