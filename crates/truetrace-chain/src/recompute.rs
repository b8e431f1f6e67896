//! Full-chain recompute ("re-sign").
//!
//! Every event is stripped of `hash`, `signature`, `pubkey` and
//! `prev_hash`, relinked to the freshly computed hash of its predecessor
//! and sealed with the given signer. The result is a re-issuance under that
//! key: original authorship is not preserved.

use truetrace_crypto::EventSigner;

use crate::error::{ChainError, ChainResult};
use crate::event::{Event, fields};
use crate::seal::seal_event;

/// Rebuild `events` under `signer`.
///
/// Pure: nothing is read or written. Output order matches input order and
/// the first event gets an empty `prev_hash`.
///
/// # Errors
///
/// Returns [`ChainError::Recompute`] with the failing index if an event is
/// missing a required field or the signer fails. No partial chain is
/// returned.
pub fn recompute_chain(events: &[Event], signer: &dyn EventSigner) -> ChainResult<Vec<Event>> {
    let mut rebuilt = Vec::with_capacity(events.len());
    let mut prev_hash = String::new();

    for (index, original) in events.iter().enumerate() {
        if let Some(field) = fields::REQUIRED.iter().find(|f| !original.contains(f)) {
            return Err(ChainError::Recompute {
                index,
                reason: format!("missing_field:{field}"),
            });
        }

        let mut event = original.clone();
        event.strip_seal();
        event.set_prev_hash(prev_hash);
        prev_hash = seal_event(&mut event, Some(signer)).map_err(|e| ChainError::Recompute {
            index,
            reason: e.to_string(),
        })?;
        rebuilt.push(event);
    }

    Ok(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::diagnose_chain;
    use crate::validation::Validator;
    use serde_json::json;
    use truetrace_crypto::{CryptoError, CryptoResult, KeyPair, PublicKey, Signature};

    fn raw(n: usize) -> Vec<Event> {
        (0..n)
            .map(|i| {
                Event::try_from(json!({
                    "event_id": format!("evt-{i}"),
                    "event_type": "test",
                    "payload": {"index": i},
                    "timestamp": 1_700_000_000,
                    "prev_hash": "stale",
                    "hash": "stale",
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_links_and_signs_every_event() {
        let kp = KeyPair::generate();
        let chain = recompute_chain(&raw(3), &kp).unwrap();

        assert_eq!(chain[0].prev_hash(), Some(""));
        assert_eq!(chain[1].prev_hash(), chain[0].hash());
        assert_eq!(chain[2].prev_hash(), chain[1].hash());
        for event in &chain {
            assert_eq!(event.pubkey(), Some(kp.public_key_hex().as_str()));
        }
        assert!(diagnose_chain(&chain, &Validator::default()).is_ok());
    }

    #[test]
    fn test_idempotent_under_same_key() {
        let kp = KeyPair::generate();
        let once = recompute_chain(&raw(4), &kp).unwrap();
        let twice = recompute_chain(&once, &kp).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_new_key_reissues_chain() {
        let old = KeyPair::generate();
        let new = KeyPair::generate();
        let chain = recompute_chain(&raw(2), &old).unwrap();
        let rotated = recompute_chain(&chain, &new).unwrap();

        assert_eq!(rotated[1].pubkey(), Some(new.public_key_hex().as_str()));
        // Hashes do not cover the key, so linkage is unchanged.
        assert_eq!(rotated[1].hash(), chain[1].hash());
        assert_ne!(rotated[1].signature(), chain[1].signature());
    }

    #[test]
    fn test_missing_field_reports_index() {
        let mut events = raw(3);
        events[2].remove("payload");
        let err = recompute_chain(&events, &KeyPair::generate()).unwrap_err();
        assert!(matches!(
            err,
            ChainError::Recompute { index: 2, ref reason } if reason == "missing_field:payload"
        ));
    }

    struct FailingSigner(PublicKey);

    impl EventSigner for FailingSigner {
        fn sign_message(&self, _message: &[u8]) -> CryptoResult<Signature> {
            Err(CryptoError::SigningFailed("device unplugged".into()))
        }

        fn public_key(&self) -> PublicKey {
            self.0
        }
    }

    #[test]
    fn test_signer_failure_reports_index() {
        let signer = FailingSigner(KeyPair::generate().public_key());
        let err = recompute_chain(&raw(2), &signer).unwrap_err();
        assert!(matches!(err, ChainError::Recompute { index: 0, .. }));
        assert!(err.to_string().contains("device unplugged"));
    }

    #[test]
    fn test_empty_chain() {
        assert!(recompute_chain(&[], &KeyPair::generate()).unwrap().is_empty());
    }
}
