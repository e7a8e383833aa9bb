//! # XChaCha20-Poly1305 Payload Encryption
//!
//! Ciphertext layout at rest: `nonce (24 bytes) ‖ ciphertext+tag`.
//!
//! The 192-bit nonce is drawn at random per payload, which is safe for
//! XChaCha20 without a counter.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::errors::{ChainError, ChainResult};
use crate::ports::outbound::EncryptionProvider;

const NONCE_LEN: usize = 24;

/// 256-bit payload encryption key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PayloadKey([u8; 32]);

impl PayloadKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex key.
    pub fn from_hex(encoded: &str) -> ChainResult<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(encoded.trim(), &mut bytes).map_err(|e| {
            ChainError::InvalidConfig(format!("payload key must be 32 hex-encoded bytes: {e}"))
        })?;
        Ok(Self(bytes))
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl std::fmt::Debug for PayloadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PayloadKey(<redacted>)")
    }
}

/// XChaCha20-Poly1305 provider.
#[derive(Clone, Debug)]
pub struct XChaCha20Provider {
    key: PayloadKey,
}

impl XChaCha20Provider {
    pub fn new(key: PayloadKey) -> Self {
        Self { key }
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new((&self.key.0).into())
    }
}

impl EncryptionProvider for XChaCha20Provider {
    fn name(&self) -> &'static str {
        "xchacha20poly1305"
    }

    fn is_active(&self) -> bool {
        true
    }

    fn encrypt(&self, plaintext: &[u8]) -> ChainResult<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher()
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|e| ChainError::Crypto(format!("encryption failed: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> ChainResult<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return Err(ChainError::Crypto(
                "ciphertext shorter than its nonce".to_string(),
            ));
        }
        let (nonce, body) = ciphertext.split_at(NONCE_LEN);

        self.cipher()
            .decrypt(XNonce::from_slice(nonce), body)
            .map_err(|e| ChainError::Crypto(format!("decryption failed: {e}")))
    }
}
