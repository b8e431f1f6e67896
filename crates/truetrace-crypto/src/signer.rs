//! The signing seam used when sealing events.
//!
//! The chain never reads key files itself. It is handed an [`EventSigner`],
//! which may be an on-disk [`KeyPair`] or anything else that can produce an
//! Ed25519 signature (an agent, an HSM bridge, a test double).

use crate::error::CryptoResult;
use crate::keypair::{KeyPair, PublicKey};
use crate::signature::Signature;

/// Produces Ed25519 signatures over canonical event bytes.
pub trait EventSigner: Send + Sync {
    /// Sign `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the signer cannot produce a signature.
    fn sign_message(&self, message: &[u8]) -> CryptoResult<Signature>;

    /// The public key that verifies this signer's signatures.
    fn public_key(&self) -> PublicKey;

    /// The public key as lowercase hex, as carried on events.
    fn public_key_hex(&self) -> String {
        self.public_key().to_hex()
    }
}

impl EventSigner for KeyPair {
    fn sign_message(&self, message: &[u8]) -> CryptoResult<Signature> {
        Ok(self.sign(message))
    }

    fn public_key(&self) -> PublicKey {
        KeyPair::public_key(self)
    }
}

/// Verify a hex signature over `message` against a hex public key.
///
/// Never errors: malformed hex, wrong lengths, invalid curve points and bad
/// signatures all yield `false`.
#[must_use]
pub fn verify_hex(signature_hex: &str, message: &[u8], public_key_hex: &str) -> bool {
    let Ok(signature) = Signature::from_hex(signature_hex) else {
        return false;
    };
    let Ok(public_key) = PublicKey::from_hex(public_key_hex) else {
        return false;
    };
    signature.verify(message, &public_key).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_hex_roundtrip() {
        let kp = KeyPair::generate();
        let sig = kp.sign_message(b"payload").unwrap();

        assert!(verify_hex(&sig.to_hex(), b"payload", &kp.public_key_hex()));
        assert!(!verify_hex(&sig.to_hex(), b"tampered", &kp.public_key_hex()));
    }

    #[test]
    fn test_verify_hex_wrong_key() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let sig = kp.sign(b"payload");

        assert!(!verify_hex(&sig.to_hex(), b"payload", &other.public_key_hex()));
    }

    #[test]
    fn test_verify_hex_malformed_inputs() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"payload").to_hex();
        let pk = kp.public_key_hex();

        assert!(!verify_hex("zz", b"payload", &pk));
        assert!(!verify_hex(&sig[..64], b"payload", &pk));
        assert!(!verify_hex(&sig, b"payload", "00"));
        assert!(!verify_hex(&sig, b"payload", ""));
        assert!(!verify_hex("", b"payload", &pk));
    }

    #[test]
    fn test_trait_object_signer() {
        let signer: Box<dyn EventSigner> = Box::new(KeyPair::generate());
        let sig = signer.sign_message(b"abc").unwrap();
        assert!(verify_hex(&sig.to_hex(), b"abc", &signer.public_key_hex()));
    }
}
