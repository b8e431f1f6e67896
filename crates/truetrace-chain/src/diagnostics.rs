//! Whole-chain verification and reporting.
//!
//! Everything here is read-only. Linkage is checked against the hash the
//! validator recomputes for the previous event, never against its stored
//! `hash`, so a forged `hash`/`prev_hash` pair is still caught.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::event::{Event, fields};
use crate::validation::{ValidationError, Validator};

/// A problem found with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainIssue {
    /// The validator rejected the event.
    Validation(ValidationError),
    /// `prev_hash` does not match the previous event's recomputed hash.
    BrokenLink {
        /// Recomputed hash of the previous event.
        expected: String,
        /// `prev_hash` found on this event.
        actual: String,
    },
    /// The first event points at a predecessor.
    InvalidGenesis {
        /// `prev_hash` found on the first event.
        actual: String,
    },
    /// The stored event carries no `hash`.
    MissingHash,
}

impl std::fmt::Display for ChainIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::BrokenLink { expected, actual } => {
                write!(f, "chain_link_mismatch: expected prev_hash={expected}, got={actual}")
            },
            Self::InvalidGenesis { actual } => {
                write!(f, "invalid_genesis: expected prev_hash=, got={actual}")
            },
            Self::MissingHash => write!(f, "missing_field:{}", fields::HASH),
        }
    }
}

impl Serialize for ChainIssue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Overall verdict of a diagnostics run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticsStatus {
    /// No issues anywhere.
    Ok,
    /// At least one event has an issue.
    IssuesDetected,
}

/// Issues for one flagged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDiagnostics {
    /// Position in the chain.
    pub index: usize,
    /// `event_id`, if the event has a string one.
    pub event_id: Option<String>,
    /// Issues in check order.
    pub issues: Vec<ChainIssue>,
    /// Hash recomputed from the event.
    pub computed_hash: String,
}

/// Result of [`diagnose_chain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticsReport {
    /// `ok` or `issues_detected`.
    pub status: DiagnosticsStatus,
    /// Number of events examined.
    pub event_count: usize,
    /// Number of events with at least one issue.
    pub issues_found: usize,
    /// Flagged events only, in chain order.
    pub details: Vec<EventDiagnostics>,
}

impl DiagnosticsReport {
    /// Whether the chain is clean.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == DiagnosticsStatus::Ok
    }

    /// Issue count summed over every event.
    #[must_use]
    pub fn total_issues(&self) -> usize {
        self.details.iter().map(|d| d.issues.len()).sum()
    }

    /// Diagnostics for the event at `index`, if it was flagged.
    #[must_use]
    pub fn for_index(&self, index: usize) -> Option<&EventDiagnostics> {
        self.details.iter().find(|d| d.index == index)
    }
}

/// Validate every event and check linkage across the chain.
#[must_use]
pub fn diagnose_chain(events: &[Event], validator: &Validator) -> DiagnosticsReport {
    let mut details = Vec::new();
    let mut previous_hash: Option<String> = None;

    for (index, event) in events.iter().enumerate() {
        let report = validator.validate(event);
        let mut issues: Vec<ChainIssue> = report
            .errors
            .into_iter()
            .map(ChainIssue::Validation)
            .collect();

        let prev = event.get(fields::PREV_HASH);
        match &previous_hash {
            Some(expected) if prev.and_then(Value::as_str) != Some(expected.as_str()) => {
                let actual = render_prev_hash(prev);
                warn!(
                    index,
                    event_id = event.event_id().unwrap_or_default(),
                    expected = %expected,
                    actual = %actual,
                    "Chain link broken"
                );
                issues.push(ChainIssue::BrokenLink {
                    expected: expected.clone(),
                    actual,
                });
            },
            None if !is_genesis_prev_hash(prev) => {
                issues.push(ChainIssue::InvalidGenesis {
                    actual: render_prev_hash(prev),
                });
            },
            _ => {},
        }

        if !event.contains(fields::HASH) {
            issues.push(ChainIssue::MissingHash);
        }

        if !issues.is_empty() {
            details.push(EventDiagnostics {
                index,
                event_id: event.event_id().map(str::to_string),
                issues,
                computed_hash: report.computed_hash.clone(),
            });
        }

        previous_hash = Some(report.computed_hash);
    }

    DiagnosticsReport {
        status: if details.is_empty() {
            DiagnosticsStatus::Ok
        } else {
            DiagnosticsStatus::IssuesDetected
        },
        event_count: events.len(),
        issues_found: details.len(),
        details,
    }
}

fn is_genesis_prev_hash(prev: Option<&Value>) -> bool {
    match prev {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn render_prev_hash(prev: Option<&Value>) -> String {
    match prev {
        None => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Per-event verdict, as listed by [`verify_events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventVerdict {
    /// `event_id`, if present.
    pub event_id: Option<String>,
    /// Validator verdict.
    pub valid: bool,
    /// Error codes, `None` when valid.
    pub errors: Option<Vec<String>>,
    /// Hash recomputed from the event.
    pub computed_hash: String,
}

/// Result of [`verify_events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationListing {
    /// Number of events verified.
    pub count: usize,
    /// One verdict per event, in chain order.
    pub results: Vec<EventVerdict>,
}

/// Validate each event independently. Linkage is not checked.
#[must_use]
pub fn verify_events(events: &[Event], validator: &Validator) -> VerificationListing {
    let results: Vec<EventVerdict> = events
        .iter()
        .map(|event| {
            let report = validator.validate(event);
            EventVerdict {
                event_id: event.event_id().map(str::to_string),
                valid: report.valid,
                errors: (!report.valid).then(|| report.error_codes()),
                computed_hash: report.computed_hash,
            }
        })
        .collect();
    VerificationListing {
        count: results.len(),
        results,
    }
}

/// Quick status of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Latest event validates (or the chain is empty).
    Ok,
    /// Latest event failed validation.
    Error,
}

/// Result of [`health`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `ok` or `error`.
    pub status: HealthStatus,
    /// Human-readable summary.
    pub message: String,
    /// Error codes of the latest event when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Recomputed hash of the latest event when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_hash: Option<String>,
}

/// Validate only the latest event.
#[must_use]
pub fn health(events: &[Event], validator: &Validator) -> HealthReport {
    let Some(latest) = events.last() else {
        return HealthReport {
            status: HealthStatus::Ok,
            message: "no events yet".to_string(),
            errors: None,
            computed_hash: None,
        };
    };

    let report = validator.validate(latest);
    if report.valid {
        HealthReport {
            status: HealthStatus::Ok,
            message: "chain integrity valid".to_string(),
            errors: None,
            computed_hash: None,
        }
    } else {
        HealthReport {
            status: HealthStatus::Error,
            message: "latest event failed validation".to_string(),
            errors: Some(report.error_codes()),
            computed_hash: Some(report.computed_hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recompute::recompute_chain;
    use serde_json::json;
    use truetrace_crypto::KeyPair;

    fn chain(kp: &KeyPair, n: usize) -> Vec<Event> {
        let raw: Vec<Event> = (0..n)
            .map(|i| {
                Event::try_from(json!({
                    "event_id": format!("evt-{i}"),
                    "event_type": "test",
                    "payload": {"index": i},
                    "timestamp": 1_700_000_000,
                }))
                .unwrap()
            })
            .collect();
        recompute_chain(&raw, kp).unwrap()
    }

    #[test]
    fn test_clean_chain() {
        let kp = KeyPair::generate();
        let report = diagnose_chain(&chain(&kp, 4), &Validator::default());
        assert!(report.is_ok());
        assert_eq!(report.event_count, 4);
        assert_eq!(report.issues_found, 0);
        assert!(report.details.is_empty());
    }

    #[test]
    fn test_empty_chain() {
        let report = diagnose_chain(&[], &Validator::default());
        assert!(report.is_ok());
        assert_eq!(report.event_count, 0);
    }

    #[test]
    fn test_forged_link_detected_at_index() {
        let kp = KeyPair::generate();
        let mut events = chain(&kp, 3);
        let expected = events[0].hash().unwrap().to_string();
        events[1].set_prev_hash("deadbeef");

        let report = diagnose_chain(&events, &Validator::default());
        let flagged = report.for_index(1).unwrap();
        let link = format!("chain_link_mismatch: expected prev_hash={expected}, got=deadbeef");
        assert!(flagged.issues.iter().any(|i| i.to_string() == link));
        assert!(report.for_index(0).is_none());
    }

    #[test]
    fn test_missing_hash_flagged() {
        let kp = KeyPair::generate();
        let mut events = chain(&kp, 1);
        events[0].remove("hash");
        let report = diagnose_chain(&events, &Validator::default());
        let codes: Vec<String> = report.details[0].issues.iter().map(ToString::to_string).collect();
        assert_eq!(codes, vec!["missing_field:hash"]);
    }

    #[test]
    fn test_invalid_genesis_flagged() {
        let mut event = Event::try_from(json!({
            "event_id": "evt-0",
            "event_type": "test",
            "payload": {},
            "timestamp": 1,
            "prev_hash": "abc",
        }))
        .unwrap();
        crate::seal::seal_event(&mut event, None).unwrap();

        let report = diagnose_chain(&[event], &Validator::default());
        assert_eq!(
            report.details[0].issues,
            vec![ChainIssue::InvalidGenesis {
                actual: "abc".to_string()
            }]
        );
    }

    #[test]
    fn test_null_genesis_accepted() {
        let mut event = Event::try_from(json!({
            "event_id": "evt-0",
            "event_type": "test",
            "payload": {},
            "timestamp": 1,
            "prev_hash": null,
        }))
        .unwrap();
        crate::seal::seal_event(&mut event, None).unwrap();
        assert!(diagnose_chain(&[event], &Validator::default()).is_ok());
    }

    #[test]
    fn test_report_shape() {
        let kp = KeyPair::generate();
        let mut events = chain(&kp, 2);
        events[1].insert("payload", json!({"index": 42}));
        let value = serde_json::to_value(diagnose_chain(&events, &Validator::default())).unwrap();

        assert_eq!(value["status"], json!("issues_detected"));
        assert_eq!(value["event_count"], json!(2));
        assert_eq!(value["issues_found"], json!(1));
        assert_eq!(value["details"][0]["index"], json!(1));
        assert_eq!(value["details"][0]["event_id"], json!("evt-1"));
        assert!(value["details"][0]["issues"][0]
            .as_str()
            .unwrap()
            .starts_with("hash_mismatch"));
    }

    #[test]
    fn test_verify_events_listing() {
        let kp = KeyPair::generate();
        let mut events = chain(&kp, 2);
        events[0].insert("payload", json!({"index": 7}));

        let listing = verify_events(&events, &Validator::default());
        assert_eq!(listing.count, 2);
        assert!(!listing.results[0].valid);
        assert!(listing.results[0].errors.as_ref().unwrap().contains(&"invalid_signature".to_string()));
        assert!(listing.results[1].valid);
        assert!(listing.results[1].errors.is_none());
    }

    #[test]
    fn test_health() {
        let validator = Validator::default();
        assert_eq!(health(&[], &validator).message, "no events yet");

        let kp = KeyPair::generate();
        let mut events = chain(&kp, 2);
        assert_eq!(health(&events, &validator).status, HealthStatus::Ok);

        events[1].insert("payload", json!({}));
        let report = health(&events, &validator);
        assert_eq!(report.status, HealthStatus::Error);
        assert!(report.errors.is_some());
        assert!(report.computed_hash.is_some());

        let value = serde_json::to_value(health(&events[..1], &validator)).unwrap();
        assert!(value.get("errors").is_none());
    }
}
