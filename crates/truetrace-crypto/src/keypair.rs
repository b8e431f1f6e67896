//! Ed25519 signing keys and their public halves.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult, fixed};
use crate::signature::Signature;

/// An Ed25519 key pair. The secret half is zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Fresh key from the OS random source.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a key pair from its 32-byte seed.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::WrongLength`] unless `seed` is 32 bytes.
    pub fn from_seed(seed: &[u8]) -> CryptoResult<Self> {
        let seed = Zeroizing::new(fixed::<32>("private key", seed)?);
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// The 32-byte seed, as written to the private key file.
    #[must_use]
    pub fn seed(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// The public half.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Public key as 64 lowercase hex characters.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        self.public_key().to_hex()
    }

    /// Short identifier for logs.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        self.public_key().key_id_hex()
    }

    /// Sign `message`. Ed25519 is deterministic: equal input, equal output.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message).into()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id_hex())
            .finish_non_exhaustive()
    }
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::WrongLength`] unless `bytes` is 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        fixed("public key", bytes).map(Self)
    }

    /// Parse the hex form stored in an event's `pubkey`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Hex`] or [`CryptoError::WrongLength`].
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        Self::from_slice(&hex::decode(s)?)
    }

    /// Raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 bytes as hex.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }

    pub(crate) fn verifying_key(&self) -> CryptoResult<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.key_id_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
