//! JSON file storage.
//!
//! The chain lives in a single document, normally a pretty-printed JSON
//! array. Two other layouts are read and written back in kind: an
//! `{"events": [...]}` envelope (other keys are kept) and JSON lines.
//!
//! Whole-document writes go through a temporary file in the same directory
//! that is synced and then renamed over the original.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use super::{BackupStatus, ChainStorage, LoadedChain, StoreHealth, StoreShape, WriteLock};
use crate::error::{ChainError, ChainResult};
use crate::event::{Event, json_type_name};

/// Default suffix appended to the chain file name for the backup copy.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// Chain storage backed by one JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileChainStorage {
    path: PathBuf,
    backup_suffix: String,
}

impl JsonFileChainStorage {
    /// Storage at `path`. The file is created on first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }

    /// Use a different backup suffix.
    #[must_use]
    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    /// Path of the chain document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the backup is written to.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        self.sibling(&self.backup_suffix)
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn read_document(&self) -> ChainResult<Document> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Document::missing());
            },
            Err(e) => return Err(e.into()),
        };

        let doc = match String::from_utf8(bytes) {
            Ok(text) => Document::parse(&text),
            Err(e) => Document::unreadable(e.to_string()),
        };

        match &doc.health {
            StoreHealth::Unreadable { reason } => {
                error!(
                    path = %self.path.display(),
                    reason = %reason,
                    "Chain store is unreadable; treating it as empty"
                );
            },
            StoreHealth::Degraded { skipped } => {
                warn!(
                    path = %self.path.display(),
                    skipped,
                    "Skipped non-object records in chain store"
                );
            },
            _ => {},
        }

        Ok(doc)
    }

    fn write_document(&self, doc: &Document) -> ChainResult<()> {
        let body = doc.render()?;
        let parent = self.parent_dir();
        std::fs::create_dir_all(parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(body.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| ChainError::from(e.error))?;
        Ok(())
    }

    // The original bytes are moved aside before a corrupt store is
    // overwritten.
    fn quarantine(&self) -> ChainResult<PathBuf> {
        let target = self.sibling(&format!(".corrupt-{}", chrono::Utc::now().timestamp()));
        std::fs::rename(&self.path, &target)?;
        warn!(
            path = %self.path.display(),
            quarantined = %target.display(),
            "Moved unreadable chain store aside"
        );
        Ok(target)
    }
}

impl ChainStorage for JsonFileChainStorage {
    fn load(&self) -> ChainResult<LoadedChain> {
        let doc = self.read_document()?;
        Ok(doc.into_loaded())
    }

    fn append(&self, event: &Event) -> ChainResult<()> {
        let mut doc = self.read_document()?;
        if matches!(doc.health, StoreHealth::Unreadable { .. }) {
            self.quarantine()?;
            doc = Document::missing();
        }

        if doc.shape == StoreShape::Lines && doc.health != StoreHealth::Missing {
            let mut file = std::fs::OpenOptions::new().append(true).open(&self.path)?;
            let mut line = String::new();
            if !doc.ends_with_newline {
                line.push('\n');
            }
            line.push_str(&serde_json::to_string(event)?);
            line.push('\n');
            file.write_all(line.as_bytes())?;
            file.sync_all()?;
            return Ok(());
        }

        doc.records.push(Value::from(event.clone()));
        self.write_document(&doc)
    }

    fn replace_all(&self, events: &[Event]) -> ChainResult<()> {
        let mut doc = self.read_document()?;
        if matches!(doc.health, StoreHealth::Unreadable { .. }) {
            doc = Document::missing();
        }
        doc.records = events.iter().cloned().map(Value::from).collect();
        self.write_document(&doc)
    }

    fn preserve_backup(&self) -> ChainResult<BackupStatus> {
        if !self.path.exists() {
            return Ok(BackupStatus::NotNeeded);
        }
        let backup = self.backup_path();
        if backup.exists() {
            info!(backup = %backup.display(), "Backup already present; leaving it untouched");
            return Ok(BackupStatus::AlreadyPresent(Some(backup)));
        }

        let mut tmp = tempfile::NamedTempFile::new_in(self.parent_dir())?;
        let mut source = std::fs::File::open(&self.path)?;
        std::io::copy(&mut source, tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&backup) {
            Ok(_) => {
                info!(backup = %backup.display(), "Chain backup created");
                Ok(BackupStatus::Created(Some(backup)))
            },
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                Ok(BackupStatus::AlreadyPresent(Some(backup)))
            },
            Err(e) => Err(e.error.into()),
        }
    }

    fn lock_writes(&self) -> ChainResult<WriteLock> {
        use fs2::FileExt;

        std::fs::create_dir_all(self.parent_dir())?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        file.lock_exclusive()
            .map_err(|e| ChainError::StorageError(format!("failed to acquire chain lock: {e}")))?;
        Ok(WriteLock::holding(file))
    }
}

/// A parsed chain document. `records` keeps every array element, including
/// skipped non-objects, so appends do not silently drop them.
#[derive(Debug)]
struct Document {
    records: Vec<Value>,
    extras: Map<String, Value>,
    shape: StoreShape,
    health: StoreHealth,
    ends_with_newline: bool,
}

impl Document {
    fn missing() -> Self {
        Self {
            records: Vec::new(),
            extras: Map::new(),
            shape: StoreShape::Array,
            health: StoreHealth::Missing,
            ends_with_newline: true,
        }
    }

    fn unreadable(reason: String) -> Self {
        Self {
            health: StoreHealth::Unreadable { reason },
            ..Self::missing()
        }
    }

    fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self {
                health: StoreHealth::Empty,
                ..Self::missing()
            };
        }

        match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(records)) => Self::from_records(records, StoreShape::Array, Map::new()),
            Ok(Value::Object(mut map)) => match map.remove("events") {
                Some(Value::Array(records)) => {
                    Self::from_records(records, StoreShape::Envelope, map)
                },
                Some(other) => Self::unreadable(format!(
                    "`events` is {}, expected an array",
                    json_type_name(&other)
                )),
                // A lone object is a one-record JSON-lines file only when it
                // sits on a single line; anything else has no chain in it.
                None if text.trim().lines().count() > 1 => {
                    Self::unreadable("object without `events` is not a chain".to_string())
                },
                None => {
                    let mut doc = Self::from_records(
                        vec![Value::Object(map)],
                        StoreShape::Lines,
                        Map::new(),
                    );
                    doc.ends_with_newline = text.ends_with('\n');
                    doc
                },
            },
            Ok(other) => Self::unreadable(format!(
                "top-level {} is not a chain",
                json_type_name(&other)
            )),
            Err(whole) => match parse_lines(text) {
                Some(records) => {
                    let mut doc = Self::from_records(records, StoreShape::Lines, Map::new());
                    doc.ends_with_newline = text.ends_with('\n');
                    doc
                },
                None => Self::unreadable(whole.to_string()),
            },
        }
    }

    fn from_records(records: Vec<Value>, shape: StoreShape, extras: Map<String, Value>) -> Self {
        let skipped = records.iter().filter(|r| !r.is_object()).count();
        let health = if skipped > 0 {
            StoreHealth::Degraded { skipped }
        } else if records.is_empty() {
            StoreHealth::Empty
        } else {
            StoreHealth::Healthy
        };
        Self {
            records,
            extras,
            shape,
            health,
            ends_with_newline: true,
        }
    }

    fn events(&self) -> Vec<Event> {
        self.records
            .iter()
            .filter_map(|r| r.as_object().cloned().map(Event::from_map))
            .collect()
    }

    fn into_loaded(self) -> LoadedChain {
        let events = self.events();
        LoadedChain::new(events, self.health, self.shape)
    }

    fn render(&self) -> ChainResult<String> {
        match self.shape {
            StoreShape::Array => {
                let mut body = serde_json::to_string_pretty(&self.records)?;
                body.push('\n');
                Ok(body)
            },
            StoreShape::Envelope => {
                let mut map = self.extras.clone();
                map.insert("events".to_string(), Value::Array(self.records.clone()));
                let mut body = serde_json::to_string_pretty(&map)?;
                body.push('\n');
                Ok(body)
            },
            StoreShape::Lines => {
                let mut body = String::new();
                for record in &self.records {
                    body.push_str(&serde_json::to_string(record)?);
                    body.push('\n');
                }
                Ok(body)
            },
        }
    }
}

fn parse_lines(text: &str) -> Option<Vec<Value>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str::<Value>(line).ok())
        .collect()
}
