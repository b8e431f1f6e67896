//! Single-event validation.
//!
//! The [`Validator`] runs four checks in a fixed order and collects every
//! error rather than stopping at the first:
//!
//! 1. structure (required fields present)
//! 2. security rules (see [`rules`])
//! 3. hash consistency
//! 4. signature
//!
//! The recomputed hash is part of every report, valid or not.

pub mod rules;

use serde::Serialize;
use serde_json::Value;

use crate::canonical::event_hash;
use crate::event::{Event, fields};
use crate::seal::signature_is_valid;

pub use rules::{RulePolicy, RuleSet, SecurityRule};

/// A single validation failure.
///
/// `Display` renders the stable error code shown to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent.
    MissingField(String),
    /// A well-known field has the wrong JSON type or is empty.
    InvalidFieldType(String),
    /// `payload` is not a JSON object.
    PayloadNotObject,
    /// Canonical payload exceeds the configured limit.
    PayloadTooLarge {
        /// Canonical payload size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
    /// `event_type` is not in the configured allow-list.
    EventTypeNotAllowed(String),
    /// A custom rule failed with its own code.
    Rule(String),
    /// Stored hash differs from the recomputed one.
    HashMismatch {
        /// Recomputed hash.
        expected: String,
        /// Hash found on the event.
        stored: String,
    },
    /// Signature present but not valid.
    InvalidSignature,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing_field:{field}"),
            Self::InvalidFieldType(field) => write!(f, "invalid_field_type:{field}"),
            Self::PayloadNotObject => write!(f, "payload_not_object"),
            Self::PayloadTooLarge { size, limit } => {
                write!(f, "payload_too_large: size={size}, limit={limit}")
            },
            Self::EventTypeNotAllowed(kind) => write!(f, "event_type_not_allowed:{kind}"),
            Self::Rule(code) => write!(f, "{code}"),
            Self::HashMismatch { expected, stored } => {
                write!(f, "hash_mismatch: expected={expected}, stored={stored}")
            },
            Self::InvalidSignature => write!(f, "invalid_signature"),
        }
    }
}

impl Serialize for ValidationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Outcome of validating one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Whether every check passed.
    pub valid: bool,
    /// Errors in check order (empty if valid).
    pub errors: Vec<ValidationError>,
    /// Hash recomputed from the event's canonical bytes.
    pub computed_hash: String,
}

impl ValidationReport {
    fn new(errors: Vec<ValidationError>, computed_hash: String) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            computed_hash,
        }
    }

    /// Whether every check passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Error codes as strings.
    #[must_use]
    pub fn error_codes(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// The `(valid, report)` pair form.
    #[must_use]
    pub fn into_tuple(self) -> (bool, Self) {
        (self.valid, self)
    }
}

/// Event validator.
#[derive(Debug, Default)]
pub struct Validator {
    rules: RuleSet,
}

impl Validator {
    /// Validator with the given security rules.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Validator with the built-in rules configured by `policy`.
    #[must_use]
    pub fn from_policy(policy: &RulePolicy) -> Self {
        Self::new(RuleSet::from_policy(policy))
    }

    /// The configured security rules.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Validate one event.
    #[must_use]
    pub fn validate(&self, event: &Event) -> ValidationReport {
        let mut errors: Vec<ValidationError> = fields::REQUIRED
            .iter()
            .filter(|field| !event.contains(field))
            .map(|field| ValidationError::MissingField((*field).to_string()))
            .collect();

        errors.extend(self.rules.check(event));

        let digest = event_hash(event);
        let computed_hash = digest.to_hex();
        if let Some(stored) = stored_hash(event)
            && !digest.matches_hex(&stored)
        {
            errors.push(ValidationError::HashMismatch {
                expected: computed_hash.clone(),
                stored,
            });
        }

        if !signature_is_valid(event) {
            errors.push(ValidationError::InvalidSignature);
        }

        ValidationReport::new(errors, computed_hash)
    }
}

// `null`, `false` and `""` mean no hash was stored.
fn stored_hash(event: &Event) -> Option<String> {
    match event.get(fields::HASH)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::event_hash_hex;
    use crate::seal::seal_event;
    use serde_json::json;
    use truetrace_crypto::KeyPair;

    fn sealed(kp: &KeyPair) -> Event {
        let mut event = Event::try_from(json!({
            "event_id": "evt-1",
            "event_type": "demo",
            "payload": {"index": 0},
            "timestamp": 1_700_000_000,
            "prev_hash": "",
        }))
        .unwrap();
        seal_event(&mut event, Some(kp)).unwrap();
        event
    }

    #[test]
    fn test_valid_signed_event() {
        let kp = KeyPair::generate();
        let report = Validator::default().validate(&sealed(&kp));
        assert!(report.is_valid(), "{:?}", report.errors);
        assert_eq!(report.computed_hash.len(), 64);
    }

    #[test]
    fn test_missing_fields_are_each_reported() {
        let event = Event::try_from(json!({"event_type": "x"})).unwrap();
        let report = Validator::new(RuleSet::empty()).validate(&event);
        assert_eq!(
            report.error_codes(),
            vec![
                "missing_field:event_id",
                "missing_field:payload",
                "missing_field:timestamp"
            ]
        );
    }

    #[test]
    fn test_tampered_payload_reports_hash_and_signature() {
        let kp = KeyPair::generate();
        let mut event = sealed(&kp);
        let stored = event.hash().unwrap().to_string();
        event.insert("payload", json!({"index": 99}));

        let report = Validator::default().validate(&event);
        assert!(!report.is_valid());
        assert_eq!(
            report.error_codes(),
            vec![
                format!(
                    "hash_mismatch: expected={}, stored={stored}",
                    report.computed_hash
                ),
                "invalid_signature".to_string(),
            ]
        );
    }

    #[test]
    fn test_uppercase_stored_hash_is_a_mismatch() {
        let mut event = sealed(&KeyPair::generate());
        let upper = event.hash().unwrap().to_uppercase();
        event.insert("hash", upper.clone());

        let report = Validator::default().validate(&event);
        assert!(matches!(
            report.errors.as_slice(),
            [ValidationError::HashMismatch { stored, .. }] if *stored == upper
        ));
    }

    #[test]
    fn test_missing_hash_is_not_a_mismatch() {
        let mut event = sealed(&KeyPair::generate());
        event.insert("hash", "");
        assert!(Validator::default().validate(&event).is_valid());
        event.remove("hash");
        assert!(Validator::default().validate(&event).is_valid());
    }

    #[test]
    fn test_unsigned_event_is_valid() {
        let mut event = sealed(&KeyPair::generate());
        event.remove("signature");
        event.remove("pubkey");
        assert!(Validator::default().validate(&event).is_valid());
    }

    #[test]
    fn test_computed_hash_returned_when_invalid() {
        let event = Event::try_from(json!({"payload": []})).unwrap();
        let report = Validator::default().validate(&event);
        assert!(!report.is_valid());
        assert_eq!(report.computed_hash, event_hash_hex(&event));
    }

    #[test]
    fn test_report_serializes_codes() {
        let event = Event::try_from(json!({"event_id": "e", "event_type": "t", "timestamp": 1}))
            .unwrap();
        let report = Validator::new(RuleSet::empty()).validate(&event);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["valid"], json!(false));
        assert_eq!(value["errors"], json!(["missing_field:payload"]));
        assert_eq!(value["computed_hash"], json!(report.computed_hash));
    }

    #[test]
    fn test_tuple_form() {
        let (ok, report) = Validator::default()
            .validate(&sealed(&KeyPair::generate()))
            .into_tuple();
        assert!(ok);
        assert!(report.errors.is_empty());
    }
}
