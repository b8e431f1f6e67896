//! Security rules applied between the structure and hash checks.
//!
//! Each rule inspects one event and returns zero or more errors. A
//! [`RuleSet`] is assembled once from a [`RulePolicy`] (usually built from
//! the `[rules]` section of the configuration) and can be extended with
//! custom rules.

use std::collections::BTreeSet;

use serde_json::Value;

use super::ValidationError;
use crate::canonical::canonical_value_bytes;
use crate::event::{Event, fields};

/// A pluggable validation rule.
pub trait SecurityRule: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Check an event. An empty vector means the rule passed.
    fn check(&self, event: &Event) -> Vec<ValidationError>;
}

/// Which built-in rules are active and how they are tuned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePolicy {
    /// Reject events whose well-known fields have the wrong type.
    pub check_field_types: bool,
    /// Reject payloads that are not JSON objects.
    pub require_object_payload: bool,
    /// Maximum canonical payload size in bytes. `None` disables the check.
    pub max_payload_bytes: Option<usize>,
    /// Permitted event types. Empty means any type.
    pub allowed_event_types: Vec<String>,
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self {
            check_field_types: true,
            require_object_payload: true,
            max_payload_bytes: Some(65_536),
            allowed_event_types: Vec::new(),
        }
    }
}

/// An ordered list of rules.
pub struct RuleSet {
    rules: Vec<Box<dyn SecurityRule>>,
}

impl RuleSet {
    /// A rule set with no rules.
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in rules enabled by `policy`.
    #[must_use]
    pub fn from_policy(policy: &RulePolicy) -> Self {
        let mut set = Self::empty();
        if policy.check_field_types {
            set.push(FieldTypeRule);
        }
        if policy.require_object_payload {
            set.push(ObjectPayloadRule);
        }
        if let Some(limit) = policy.max_payload_bytes {
            set.push(PayloadSizeRule { limit });
        }
        if !policy.allowed_event_types.is_empty() {
            set.push(EventTypeAllowlistRule {
                allowed: policy.allowed_event_types.iter().cloned().collect(),
            });
        }
        set
    }

    /// Append a rule.
    pub fn push(&mut self, rule: impl SecurityRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Append a rule, builder style.
    #[must_use]
    pub fn with(mut self, rule: impl SecurityRule + 'static) -> Self {
        self.push(rule);
        self
    }

    /// Names of the active rules, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule and collect the errors.
    #[must_use]
    pub fn check(&self, event: &Event) -> Vec<ValidationError> {
        self.rules.iter().flat_map(|rule| rule.check(event)).collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_policy(&RulePolicy::default())
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.names())
            .finish()
    }
}

/// `event_id` and `event_type` must be non-empty strings and `timestamp` an
/// integer. Absent fields are left to the structure check.
#[derive(Debug, Clone, Copy)]
pub struct FieldTypeRule;

impl SecurityRule for FieldTypeRule {
    fn name(&self) -> &'static str {
        "field_types"
    }

    fn check(&self, event: &Event) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for field in [fields::EVENT_ID, fields::EVENT_TYPE] {
            match event.get(field) {
                None => {},
                Some(Value::String(s)) if !s.is_empty() => {},
                Some(_) => errors.push(ValidationError::InvalidFieldType(field.to_string())),
            }
        }
        if let Some(ts) = event.get(fields::TIMESTAMP)
            && !(ts.is_i64() || ts.is_u64())
        {
            errors.push(ValidationError::InvalidFieldType(
                fields::TIMESTAMP.to_string(),
            ));
        }
        errors
    }
}

/// `payload` must be a JSON object.
#[derive(Debug, Clone, Copy)]
pub struct ObjectPayloadRule;

impl SecurityRule for ObjectPayloadRule {
    fn name(&self) -> &'static str {
        "object_payload"
    }

    fn check(&self, event: &Event) -> Vec<ValidationError> {
        match event.payload() {
            None | Some(Value::Object(_)) => Vec::new(),
            Some(_) => vec![ValidationError::PayloadNotObject],
        }
    }
}

/// Caps the canonical encoding size of `payload`.
#[derive(Debug, Clone, Copy)]
pub struct PayloadSizeRule {
    /// Limit in bytes.
    pub limit: usize,
}

impl SecurityRule for PayloadSizeRule {
    fn name(&self) -> &'static str {
        "payload_size"
    }

    fn check(&self, event: &Event) -> Vec<ValidationError> {
        let Some(payload) = event.payload() else {
            return Vec::new();
        };
        let size = canonical_value_bytes(payload).len();
        if size > self.limit {
            vec![ValidationError::PayloadTooLarge {
                size,
                limit: self.limit,
            }]
        } else {
            Vec::new()
        }
    }
}

/// Restricts `event_type` to a fixed set.
#[derive(Debug, Clone)]
pub struct EventTypeAllowlistRule {
    /// Permitted types.
    pub allowed: BTreeSet<String>,
}

impl SecurityRule for EventTypeAllowlistRule {
    fn name(&self) -> &'static str {
        "event_type_allowlist"
    }

    fn check(&self, event: &Event) -> Vec<ValidationError> {
        match event.event_type() {
            Some(kind) if !self.allowed.contains(kind) => {
                vec![ValidationError::EventTypeNotAllowed(kind.to_string())]
            },
            _ => Vec::new(),
        }
    }
}
