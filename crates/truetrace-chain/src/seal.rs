//! Sealing events (hash + optional signature) and checking signatures.

use serde_json::Value;
use truetrace_crypto::{CryptoResult, EventSigner, verify_hex};

use crate::canonical::{canonical_event_bytes, event_hash_hex};
use crate::event::{Event, fields};

/// Seal an event in place.
///
/// Any previous seal is discarded. With a signer, the canonical bytes are
/// signed and `signature` and `pubkey` are set. `hash` is always set and
/// also returned.
///
/// # Errors
///
/// Returns the signer's error if it cannot produce a signature. The event
/// is left unsealed in that case.
pub fn seal_event(event: &mut Event, signer: Option<&dyn EventSigner>) -> CryptoResult<String> {
    event.strip_seal();
    if let Some(signer) = signer {
        let signature = signer.sign_message(&canonical_event_bytes(event))?;
        event.insert(fields::SIGNATURE, signature.to_hex());
        event.insert(fields::PUBKEY, signer.public_key_hex());
    }
    let hash = event_hash_hex(event);
    event.insert(fields::HASH, hash.clone());
    Ok(hash)
}

/// Check the signature over the event's canonical bytes.
///
/// `null` and `""` count as absent. With neither `signature` nor `pubkey`
/// present the event is unsigned and passes. With exactly one present, or
/// with either one not a string, it fails.
#[must_use]
pub fn signature_is_valid(event: &Event) -> bool {
    match (
        present(event.get(fields::SIGNATURE)),
        present(event.get(fields::PUBKEY)),
    ) {
        (None, None) => true,
        (Some(Value::String(sig)), Some(Value::String(key))) => {
            verify_hex(sig, &canonical_event_bytes(event), key)
        },
        _ => false,
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v),
    }
}
