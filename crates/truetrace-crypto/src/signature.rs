//! Detached Ed25519 signatures, carried on events as 128 hex characters.

use std::fmt;

use ed25519_dalek::Verifier;

use crate::error::{CryptoError, CryptoResult, fixed};
use crate::keypair::PublicKey;

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Lowercase hex, 128 characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the hex form stored on an event.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Hex`] or [`CryptoError::WrongLength`].
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        fixed("signature", &hex::decode(s)?).map(Self)
    }

    /// Check this signature over `message` against `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if `key` is not a curve
    /// point and [`CryptoError::BadSignature`] if the check fails.
    pub fn verify(&self, message: &[u8], key: &PublicKey) -> CryptoResult<()> {
        key.verifying_key()?
            .verify(message, &ed25519_dalek::Signature::from_bytes(&self.0))
            .map_err(|_| CryptoError::BadSignature)
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(sig: ed25519_dalek::Signature) -> Self {
        Self(sig.to_bytes())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_hex_is_128_lowercase_chars() {
        let sig = KeyPair::generate().sign(b"canonical bytes");
        let hex = sig.to_hex();
        assert_eq!(hex.len(), 128);
        assert!(hex.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
        assert_eq!(Signature::from_hex(&hex).unwrap(), sig);
    }

    #[test]
    fn test_verify_rejects_other_message_and_key() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"payload");

        assert!(sig.verify(b"payload", &kp.public_key()).is_ok());
        assert!(matches!(
            sig.verify(b"payload!", &kp.public_key()),
            Err(CryptoError::BadSignature)
        ));
        assert!(sig.verify(b"payload", &KeyPair::generate().public_key()).is_err());
    }

    #[test]
    fn test_from_hex_length() {
        assert!(matches!(
            Signature::from_hex(&"ab".repeat(63)),
            Err(CryptoError::WrongLength { what: "signature", expected: 64, actual: 63 })
        ));
    }
}
