//! Canonical encoding and content hashing.
//!
//! The canonical form is compact JSON with object keys sorted by code point
//! at every depth and every non-ASCII character written as a lowercase
//! `\uXXXX` escape (astral characters as UTF-16 surrogate pairs). The seal
//! fields `hash`, `signature` and `pubkey` are left out at the top level.
//!
//! These bytes are the single input to both hashing and signing.

use std::fmt::Write as _;

use serde_json::{Map, Value};
use truetrace_crypto::EventDigest;

use crate::event::{Event, fields};

/// Canonical bytes of an event, excluding the seal fields.
#[must_use]
pub fn canonical_event_bytes(event: &Event) -> Vec<u8> {
    let mut out = String::new();
    write_object(&mut out, event.as_map(), &fields::SEAL);
    out.into_bytes()
}

/// Canonical bytes of an arbitrary JSON value. Nothing is excluded.
#[must_use]
pub fn canonical_value_bytes(value: &Value) -> Vec<u8> {
    let mut out = String::new();
    write_value(&mut out, value);
    out.into_bytes()
}

/// SHA-256 of the event's canonical bytes.
#[must_use]
pub fn event_hash(event: &Event) -> EventDigest {
    EventDigest::of(&canonical_event_bytes(event))
}

/// [`event_hash`] as 64 lowercase hex characters.
#[must_use]
pub fn event_hash_hex(event: &Event) -> String {
    event_hash(event).to_hex()
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        },
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        },
        Value::Object(map) => write_object(out, map, &[]),
    }
}

// Map iteration order depends on serde_json's `preserve_order` feature, so
// keys are always sorted here.
fn write_object(out: &mut String, map: &Map<String, Value>, exclude: &[&str]) {
    let mut entries: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(key, _)| !exclude.contains(&key.as_str()))
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{unit:04x}");
                }
            },
        }
    }
    out.push('"');
}
