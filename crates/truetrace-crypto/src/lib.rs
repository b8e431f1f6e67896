//! TrueTrace Crypto - hashing and signing primitives for the event chain.
//!
//! This crate provides:
//! - SHA-256 event digests rendered as lowercase hex
//! - Ed25519 key pairs and their raw 32-byte key files
//! - Hex-encoded signatures and public keys
//! - The [`EventSigner`] seam used by the chain to seal events
//!
//! Nothing here knows about events. Callers hand in canonical bytes and get
//! back digests and signatures.
//!
//! # Example
//!
//! ```
//! use truetrace_crypto::{verify_hex, EventDigest, KeyPair};
//!
//! let keypair = KeyPair::generate();
//! let message = br#"{"event_id":"evt-1"}"#;
//!
//! let signature = keypair.sign(message);
//! assert!(verify_hex(&signature.to_hex(), message, &keypair.public_key_hex()));
//!
//! let digest = EventDigest::of(message);
//! assert_eq!(digest.to_hex().len(), 64);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod digest;
mod error;
mod keyfile;
mod keypair;
mod signature;
mod signer;

pub use error::{CryptoError, CryptoResult};
pub use digest::EventDigest;
pub use keypair::{KeyPair, PublicKey};
pub use signature::Signature;
pub use signer::{EventSigner, verify_hex};
