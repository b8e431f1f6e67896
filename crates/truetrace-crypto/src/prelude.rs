//! Prelude module - commonly used types for convenient import.
//!
//! Use `use truetrace_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Key types
pub use crate::{KeyPair, PublicKey};

// Signatures
pub use crate::{EventSigner, Signature, verify_hex};

// Hashing
pub use crate::EventDigest;
