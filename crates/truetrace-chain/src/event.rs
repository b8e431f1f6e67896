//! The event record and its builder.
//!
//! An [`Event`] is an open JSON object. The chain only interprets a handful of
//! well-known fields; anything else an author adds is carried through
//! untouched and is covered by the hash like every other field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{ChainError, ChainResult};

/// Well-known top-level field names.
pub mod fields {
    /// Opaque unique identifier.
    pub const EVENT_ID: &str = "event_id";
    /// Free-form category.
    pub const EVENT_TYPE: &str = "event_type";
    /// Arbitrary structured data.
    pub const PAYLOAD: &str = "payload";
    /// Seconds since the Unix epoch.
    pub const TIMESTAMP: &str = "timestamp";
    /// Hash of the preceding event, empty for the first.
    pub const PREV_HASH: &str = "prev_hash";
    /// Content hash of this event.
    pub const HASH: &str = "hash";
    /// Ed25519 signature over the canonical bytes.
    pub const SIGNATURE: &str = "signature";
    /// Public key verifying `signature`.
    pub const PUBKEY: &str = "pubkey";
    /// Event schema version.
    pub const EVENT_VERSION: &str = "event_version";
    /// Producer of the event.
    pub const ORIGIN: &str = "origin";
    /// Correlation identifier.
    pub const TRACE_ID: &str = "trace_id";

    /// Fields every event must carry.
    pub const REQUIRED: [&str; 4] = [EVENT_ID, EVENT_TYPE, PAYLOAD, TIMESTAMP];

    /// Fields excluded from the canonical encoding.
    pub const SEAL: [&str; 3] = [HASH, SIGNATURE, PUBKEY];
}

/// A single chain event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Create an empty event.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an existing JSON object.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parse an event from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::SerializationError`] for invalid JSON and
    /// [`ChainError::NotAnObject`] if the document is not an object.
    pub fn from_json_str(s: &str) -> ChainResult<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::try_from(value)
    }

    /// Borrow the underlying object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Get a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a field is present (even if `null`).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The event identifier, if present and a string.
    #[must_use]
    pub fn event_id(&self) -> Option<&str> {
        self.str_field(fields::EVENT_ID)
    }

    /// The event type, if present and a string.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.str_field(fields::EVENT_TYPE)
    }

    /// The payload, if present.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.0.get(fields::PAYLOAD)
    }

    /// The timestamp, if present and an integer.
    #[must_use]
    pub fn timestamp(&self) -> Option<i64> {
        self.0.get(fields::TIMESTAMP).and_then(Value::as_i64)
    }

    /// The stored predecessor hash, if present and a string.
    #[must_use]
    pub fn prev_hash(&self) -> Option<&str> {
        self.str_field(fields::PREV_HASH)
    }

    /// The stored content hash, if present and a string.
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        self.str_field(fields::HASH)
    }

    /// The stored signature, if present and a string.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.str_field(fields::SIGNATURE)
    }

    /// The stored public key, if present and a string.
    #[must_use]
    pub fn pubkey(&self) -> Option<&str> {
        self.str_field(fields::PUBKEY)
    }

    /// Set the predecessor hash.
    pub fn set_prev_hash(&mut self, prev_hash: impl Into<String>) {
        self.0
            .insert(fields::PREV_HASH.to_string(), Value::String(prev_hash.into()));
    }

    /// Remove `hash`, `signature` and `pubkey`.
    pub fn strip_seal(&mut self) {
        for field in fields::SEAL {
            self.0.remove(field);
        }
    }

    /// Case-insensitive substring match over the event's JSON text.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let haystack = Value::Object(self.0.clone()).to_string().to_lowercase();
        haystack.contains(&query.to_lowercase())
    }

    /// Render as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::SerializationError`] if rendering fails.
    pub fn to_pretty_json(&self) -> ChainResult<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}

impl TryFrom<Value> for Event {
    type Error = ChainError;

    fn try_from(value: Value) -> ChainResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ChainError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }
}

impl From<Event> for Value {
    fn from(event: Event) -> Self {
        Value::Object(event.into_map())
    }
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Values stamped on every event built through [`NewEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefaults {
    /// Value of `event_version`.
    pub version: String,
    /// Value of `origin` when the builder does not set one.
    pub origin: String,
}

impl Default for EventDefaults {
    fn default() -> Self {
        Self {
            version: "1.5".to_string(),
            origin: "system".to_string(),
        }
    }
}

/// Builder for a fresh event.
///
/// The identifier, timestamp and trace id are assigned when the event is
/// built, not when the builder is created.
#[derive(Debug, Clone)]
pub struct NewEvent {
    event_type: String,
    payload: Value,
    origin: Option<String>,
    extra: Map<String, Value>,
}

impl NewEvent {
    /// Start a new event of the given type.
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            origin: None,
            extra: Map::new(),
        }
    }

    /// Override the origin.
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Attach an additional top-level field.
    ///
    /// Seal fields and `prev_hash` are ignored here; the chain owns them.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != fields::PREV_HASH && !fields::SEAL.contains(&key.as_str()) {
            self.extra.insert(key, value.into());
        }
        self
    }

    /// Build the unsealed event.
    #[must_use]
    pub fn build(self, defaults: &EventDefaults) -> Event {
        let mut event = Event::from_map(self.extra);
        event.insert(fields::EVENT_ID, generate_event_id());
        event.insert(fields::EVENT_VERSION, defaults.version.clone());
        event.insert(fields::TIMESTAMP, chrono::Utc::now().timestamp());
        event.insert(fields::EVENT_TYPE, self.event_type);
        event.insert(fields::PAYLOAD, self.payload);
        event.insert(
            fields::ORIGIN,
            self.origin.unwrap_or_else(|| defaults.origin.clone()),
        );
        event.insert(fields::TRACE_ID, Uuid::new_v4().simple().to_string());
        event
    }
}

/// `evt-` followed by 12 hex characters of a random UUID.
#[must_use]
pub fn generate_event_id() -> String {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(12);
    format!("evt-{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let event = Event::try_from(json!({
            "event_id": "evt-1",
            "event_type": "demo",
            "payload": {"a": 1},
            "timestamp": 1_700_000_000,
            "prev_hash": "",
            "hash": "abc",
        }))
        .unwrap();

        assert_eq!(event.event_id(), Some("evt-1"));
        assert_eq!(event.event_type(), Some("demo"));
        assert_eq!(event.payload(), Some(&json!({"a": 1})));
        assert_eq!(event.timestamp(), Some(1_700_000_000));
        assert_eq!(event.prev_hash(), Some(""));
        assert_eq!(event.hash(), Some("abc"));
        assert_eq!(event.signature(), None);
    }

    #[test]
    fn test_rejects_non_object() {
        let err = Event::try_from(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ChainError::NotAnObject { found: "array" }));
        assert!(Event::from_json_str("\"text\"").is_err());
    }

    #[test]
    fn test_strip_seal_keeps_prev_hash() {
        let mut event = Event::try_from(json!({
            "prev_hash": "p",
            "hash": "h",
            "signature": "s",
            "pubkey": "k",
        }))
        .unwrap();
        event.strip_seal();
        assert_eq!(event.as_map().len(), 1);
        assert_eq!(event.prev_hash(), Some("p"));
    }

    #[test]
    fn test_builder_stamps_fields() {
        let event = NewEvent::new("login", json!({"user": "ana"}))
            .field("severity", "low")
            .field("hash", "ignored")
            .build(&EventDefaults::default());

        let id = event.event_id().unwrap();
        assert!(id.starts_with("evt-"));
        assert_eq!(id.len(), 16);
        assert_eq!(event.get("event_version"), Some(&json!("1.5")));
        assert_eq!(event.get("origin"), Some(&json!("system")));
        assert_eq!(event.get("severity"), Some(&json!("low")));
        assert_eq!(event.get("trace_id").and_then(Value::as_str).map(str::len), Some(32));
        assert!(event.timestamp().is_some());
        assert!(!event.contains("hash"));
        assert!(!event.contains("prev_hash"));
    }

    #[test]
    fn test_builder_origin_override() {
        let event = NewEvent::new("x", json!({}))
            .origin("sensor-7")
            .build(&EventDefaults::default());
        assert_eq!(event.get("origin"), Some(&json!("sensor-7")));
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let event = Event::try_from(json!({"payload": {"note": "Door OPENED"}})).unwrap();
        assert!(event.matches("door opened"));
        assert!(!event.matches("closed"));
    }

    #[test]
    fn test_serde_is_transparent() {
        let value = json!({"event_id": "evt-1", "payload": {}});
        let event: Event = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&event).unwrap(), value);
    }
}
