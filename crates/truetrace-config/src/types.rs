//! Configuration types for TrueTrace.
//!
//! These types mirror the chain's rule policy and event defaults without
//! depending on the chain crate; the CLI converts them at start-up. Every
//! struct implements [`Default`] with the same values as `defaults.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the chain and its backup live.
    pub storage: StorageSection,
    /// Paths to the signing key pair.
    pub keys: KeysSection,
    /// Values stamped onto newly created events.
    pub events: EventsSection,
    /// Validation rules applied on top of the structural checks.
    pub rules: RulesSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

impl Config {
    /// Data directory, with a relative `data_dir` resolved against `base`.
    #[must_use]
    pub fn data_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.storage.data_dir)
    }

    /// Path of the chain document.
    #[must_use]
    pub fn chain_path(&self, base: &Path) -> PathBuf {
        self.data_dir(base).join(&self.storage.chain_file)
    }

    /// Path of the raw 32-byte private key seed.
    #[must_use]
    pub fn private_key_path(&self, base: &Path) -> PathBuf {
        self.data_dir(base).join(&self.keys.private_key)
    }

    /// Path of the raw 32-byte public key.
    #[must_use]
    pub fn public_key_path(&self, base: &Path) -> PathBuf {
        self.data_dir(base).join(&self.keys.public_key)
    }

    /// Log directory, if file logging is configured.
    #[must_use]
    pub fn log_directory(&self, base: &Path) -> Option<PathBuf> {
        let dir = self.logging.directory.trim();
        (!dir.is_empty()).then(|| base.join(dir))
    }
}

// ---------------------------------------------------------------------------
// StorageSection
// ---------------------------------------------------------------------------

/// Chain storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Base directory for relative storage and key paths.
    pub data_dir: String,
    /// Chain document, relative to `data_dir` unless absolute.
    pub chain_file: String,
    /// Appended to the chain file name to form the backup path.
    pub backup_suffix: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: "data".to_owned(),
            chain_file: "chain/event_chain.json".to_owned(),
            backup_suffix: ".bak".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// KeysSection
// ---------------------------------------------------------------------------

/// Key file locations, relative to `storage.data_dir` unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysSection {
    /// Raw 32-byte Ed25519 seed.
    pub private_key: String,
    /// Raw 32-byte Ed25519 public key.
    pub public_key: String,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self {
            private_key: "keys/truetrace_priv.bin".to_owned(),
            public_key: "keys/truetrace_pub.bin".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventsSection
// ---------------------------------------------------------------------------

/// Defaults for newly created events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsSection {
    /// `event_version` stamped on new events.
    pub version: String,
    /// `origin` used when the caller does not give one.
    pub origin: String,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            version: "1.5".to_owned(),
            origin: "system".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// RulesSection
// ---------------------------------------------------------------------------

/// Security rules run by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesSection {
    /// Check that `event_id` and `event_type` are non-empty strings and
    /// `timestamp` is an integer.
    pub check_field_types: bool,
    /// Require `payload` to be a JSON object.
    pub require_object_payload: bool,
    /// Maximum canonical payload size in bytes. `0` disables the limit.
    pub max_payload_bytes: u64,
    /// Accepted event types. Empty accepts any.
    pub allowed_event_types: Vec<String>,
}

impl Default for RulesSection {
    fn default() -> Self {
        Self {
            check_field_types: true,
            require_object_payload: true,
            max_payload_bytes: 65_536,
            allowed_event_types: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["truetrace_chain=debug"]`).
    pub directives: Vec<String>,
    /// Log directory. Empty means stderr.
    pub directory: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: String::new(),
        }
    }
}
