//! # Digital Signatures
//!
//! Keyed message authentication (HMAC-SHA256) over block hashes and record
//! hashes. There is one process-wide secret, injected at construction; vendor
//! keys are derived from it per scope.
//!
//! ## Security Invariants
//!
//! - Key material is zeroized on drop and never printed
//! - Verification is constant-time (`Mac::verify_slice`)
//! - A missing signature is valid but reported as unsigned

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::errors::{ChainError, ChainResult};

type HmacSha256 = Hmac<Sha256>;

/// Domain separation label for scoped key derivation.
const SCOPE_DOMAIN: &[u8] = b"ledger.v1.scope:";

/// Minimum accepted key length in bytes.
pub const MIN_KEY_LEN: usize = 16;

/// Secret HMAC key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> ChainResult<Self> {
        let bytes = bytes.into();
        if bytes.len() < MIN_KEY_LEN {
            return Err(ChainError::InvalidConfig(format!(
                "signing key must be at least {} bytes, got {}",
                MIN_KEY_LEN,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Parse a hex-encoded key.
    pub fn from_hex(encoded: &str) -> ChainResult<Self> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| ChainError::InvalidConfig(format!("signing key is not hex: {e}")))?;
        Self::from_bytes(bytes)
    }

    /// Derive a key bound to `scope` (e.g. a vendor identifier).
    ///
    /// `HMAC(master, "ledger.v1.scope:" ‖ scope)`
    pub fn derive_scoped(&self, scope: &str) -> SigningKey {
        let mut mac = self.mac();
        mac.update(SCOPE_DOMAIN);
        mac.update(scope.as_bytes());
        SigningKey(mac.finalize().into_bytes().to_vec())
    }

    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as Mac>::new_from_slice(&self.0).expect("HMAC key size is always valid")
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Signs and verifies messages with a single key.
#[derive(Clone, Debug)]
pub struct BlockSigner {
    key: SigningKey,
}

impl BlockSigner {
    /// Create a signer over `key`.
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Signer for a derived scope of this signer's key.
    pub fn scoped(&self, scope: &str) -> Self {
        Self::new(self.key.derive_scoped(scope))
    }

    /// HMAC-SHA256 of `message` as lowercase hex.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = self.key.mac();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check `signature_hex` against `message`.
    ///
    /// Malformed hex is simply an invalid signature.
    pub fn verify(&self, message: &str, signature_hex: &str) -> bool {
        let Ok(signature) = hex::decode(signature_hex) else {
            return false;
        };
        let mut mac = self.key.mac();
        mac.update(message.as_bytes());
        mac.verify_slice(&signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> BlockSigner {
        BlockSigner::new(SigningKey::from_bytes([7u8; 32]).unwrap())
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let signer = signer();
        let signature = signer.sign("block-hash");

        assert_eq!(signature.len(), 64);
        assert!(signer.verify("block-hash", &signature));
        assert!(!signer.verify("other-hash", &signature));
    }

    #[test]
    fn test_signature_is_deterministic() {
        assert_eq!(signer().sign("abc"), signer().sign("abc"));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let other = BlockSigner::new(SigningKey::from_bytes([8u8; 32]).unwrap());
        let signature = signer().sign("abc");
        assert!(!other.verify("abc", &signature));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        assert!(!signer().verify("abc", "not-hex"));
        assert!(!signer().verify("abc", ""));
    }

    #[test]
    fn test_scoped_keys_differ_per_scope() {
        let base = signer();
        let vendor_a = base.scoped("vendor:1");
        let vendor_b = base.scoped("vendor:2");

        let sig_a = vendor_a.sign("invoice");
        assert!(vendor_a.verify("invoice", &sig_a));
        assert!(!vendor_b.verify("invoice", &sig_a));
        assert!(!base.verify("invoice", &sig_a));
        assert_eq!(sig_a, base.scoped("vendor:1").sign("invoice"));
    }

    #[test]
    fn test_short_key_rejected() {
        assert!(matches!(
            SigningKey::from_bytes(vec![1u8; 4]),
            Err(ChainError::InvalidConfig(_))
        ));
        assert!(SigningKey::from_hex("zz").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SigningKey::from_bytes([0xAB; 32]).unwrap();
        assert_eq!(format!("{key:?}"), "SigningKey(<redacted>)");
    }
}
