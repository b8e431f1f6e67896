//! SHA-256 digests of canonical event bytes.

use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 over an event's canonical bytes.
///
/// Events carry it as 64 lowercase hex characters in `hash`, and the next
/// event repeats it in `prev_hash`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventDigest([u8; 32]);

impl EventDigest {
    /// Digest `bytes`.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Lowercase hex, 64 characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether `stored` is exactly this digest's hex form.
    #[must_use]
    pub fn matches_hex(&self, stored: &str) -> bool {
        self.to_hex() == stored
    }
}

impl fmt::Debug for EventDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventDigest({}..)", &self.to_hex()[..12])
    }
}

impl fmt::Display for EventDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
