//! Errors from hashing, signing and key handling.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong in this crate.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Raw key, signature or digest bytes of the wrong size.
    #[error("{what} must be {expected} bytes, got {actual}")]
    WrongLength {
        /// What was being decoded.
        what: &'static str,
        /// Required size in bytes.
        expected: usize,
        /// Size that was supplied.
        actual: usize,
    },

    /// Input that should be hex is not.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// 32 bytes that are not an Ed25519 point.
    #[error("not a valid Ed25519 public key")]
    InvalidPublicKey,

    /// A well-formed signature that does not verify.
    #[error("signature does not verify")]
    BadSignature,

    /// Key material could not be loaded from its configured location.
    #[error("signing key unavailable at {}: {reason}", path.display())]
    KeyUnavailable {
        /// Where the key was expected.
        path: PathBuf,
        /// Why it could not be used.
        reason: String,
    },

    /// The signer refused or failed to produce a signature.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Reading or writing a key file failed.
    #[error("key file {}: {source}", path.display())]
    KeyFile {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for this crate.
pub type CryptoResult<T> = Result<T, CryptoError>;

pub(crate) fn fixed<const N: usize>(what: &'static str, bytes: &[u8]) -> CryptoResult<[u8; N]> {
    bytes.try_into().map_err(|_| CryptoError::WrongLength {
        what,
        expected: N,
        actual: bytes.len(),
    })
}
