//! `TRUETRACE_*` environment overrides.
//!
//! Environment variables are the highest-priority layer: a set variable
//! replaces whatever the config files said.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: ValueKind,
}

#[derive(Clone, Copy)]
enum ValueKind {
    Str,
    Int,
    Bool,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "TRUETRACE_DATA_DIR",
        field_path: "storage.data_dir",
        kind: ValueKind::Str,
    },
    EnvMapping {
        var_name: "TRUETRACE_CHAIN_FILE",
        field_path: "storage.chain_file",
        kind: ValueKind::Str,
    },
    EnvMapping {
        var_name: "TRUETRACE_PRIVATE_KEY",
        field_path: "keys.private_key",
        kind: ValueKind::Str,
    },
    EnvMapping {
        var_name: "TRUETRACE_PUBLIC_KEY",
        field_path: "keys.public_key",
        kind: ValueKind::Str,
    },
    EnvMapping {
        var_name: "TRUETRACE_EVENT_ORIGIN",
        field_path: "events.origin",
        kind: ValueKind::Str,
    },
    EnvMapping {
        var_name: "TRUETRACE_MAX_PAYLOAD_BYTES",
        field_path: "rules.max_payload_bytes",
        kind: ValueKind::Int,
    },
    EnvMapping {
        var_name: "TRUETRACE_CHECK_FIELD_TYPES",
        field_path: "rules.check_field_types",
        kind: ValueKind::Bool,
    },
    EnvMapping {
        var_name: "TRUETRACE_LOG_LEVEL",
        field_path: "logging.level",
        kind: ValueKind::Str,
    },
    EnvMapping {
        var_name: "TRUETRACE_LOG_FORMAT",
        field_path: "logging.format",
        kind: ValueKind::Str,
    },
    EnvMapping {
        var_name: "TRUETRACE_LOG_DIR",
        field_path: "logging.directory",
        kind: ValueKind::Str,
    },
];

/// Apply every set `TRUETRACE_*` variable to `merged`.
///
/// Values that do not parse as the field's type are kept as strings, so
/// the subsequent deserialize reports them against the right field.
/// Returns the number of variables applied.
pub fn apply_env_overrides<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let Some(val) = env_vars.get(mapping.var_name) else {
            continue;
        };
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var override"
        );
        set_field(merged, mapping.field_path, coerce(mapping.kind, val));
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    count
}

fn coerce(kind: ValueKind, val: &str) -> toml::Value {
    match kind {
        ValueKind::Int => val
            .parse::<i64>()
            .map_or_else(|_| toml::Value::String(val.to_owned()), toml::Value::Integer),
        ValueKind::Bool => val
            .parse::<bool>()
            .map_or_else(|_| toml::Value::String(val.to_owned()), toml::Value::Boolean),
        ValueKind::Str => toml::Value::String(val.to_owned()),
    }
}

/// Set a dotted `path` in the tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
