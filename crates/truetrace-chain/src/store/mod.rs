//! Chain storage trait and implementations.
//!
//! Storage is append-only from the chain's point of view. The only
//! operation that rewrites history is [`ChainStorage::replace_all`], which the
//! re-sign procedure calls after [`ChainStorage::preserve_backup`].

mod file;
mod memory;

use std::path::PathBuf;

use serde::Serialize;

use crate::error::ChainResult;
use crate::event::Event;

pub use file::JsonFileChainStorage;
pub use memory::MemoryChainStorage;

/// Storage backend for an event chain.
///
/// Implementations must be thread-safe. Write operations assume the caller
/// holds the guard returned by [`lock_writes`](Self::lock_writes).
pub trait ChainStorage: Send + Sync {
    /// Read every event along with the health of the underlying store.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be accessed at all. A
    /// corrupt document is reported through [`StoreHealth`], not as an error.
    fn load(&self) -> ChainResult<LoadedChain>;

    /// Read every event in chain order.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    fn read_all(&self) -> ChainResult<Vec<Event>> {
        Ok(self.load()?.events)
    }

    /// Persist one event at the end of the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be persisted.
    fn append(&self, event: &Event) -> ChainResult<()>;

    /// Replace the whole chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain cannot be written.
    fn replace_all(&self, events: &[Event]) -> ChainResult<()>;

    /// Copy the current chain to its backup location unless a backup exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be written.
    fn preserve_backup(&self) -> ChainResult<BackupStatus>;

    /// Acquire the cross-process write lock, if the backend has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired.
    fn lock_writes(&self) -> ChainResult<WriteLock> {
        Ok(WriteLock::unlocked())
    }
}

/// Events read from a store plus what the reader found.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedChain {
    /// Events in chain order.
    pub events: Vec<Event>,
    /// Condition of the stored document.
    pub health: StoreHealth,
    /// Layout of the stored document.
    pub shape: StoreShape,
}

impl LoadedChain {
    pub(crate) fn new(events: Vec<Event>, health: StoreHealth, shape: StoreShape) -> Self {
        Self {
            events,
            health,
            shape,
        }
    }
}

/// Condition of a store at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StoreHealth {
    /// No chain has been written yet.
    Missing,
    /// The document exists but holds no events.
    Empty,
    /// Every record was read.
    Healthy,
    /// Some records were not objects and were skipped.
    Degraded {
        /// How many records were skipped.
        skipped: usize,
    },
    /// The document could not be parsed; it was treated as empty.
    Unreadable {
        /// Parser or I/O message.
        reason: String,
    },
}

impl StoreHealth {
    /// Whether every stored record was usable.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Missing | Self::Empty | Self::Healthy)
    }
}

impl std::fmt::Display for StoreHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Empty => write!(f, "empty"),
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded { skipped } => write!(f, "degraded ({skipped} records skipped)"),
            Self::Unreadable { reason } => write!(f, "unreadable: {reason}"),
        }
    }
}

/// Layout of a stored chain document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreShape {
    /// A JSON array of events.
    Array,
    /// An object with an `events` array and possibly other keys.
    Envelope,
    /// One JSON object per line.
    Lines,
}

/// Result of [`ChainStorage::preserve_backup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStatus {
    /// A new backup was written.
    Created(Option<PathBuf>),
    /// A backup already existed and was left untouched.
    AlreadyPresent(Option<PathBuf>),
    /// There was nothing to back up.
    NotNeeded,
}

impl std::fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created(Some(path)) => write!(f, "backup created at {}", path.display()),
            Self::Created(None) => write!(f, "backup created"),
            Self::AlreadyPresent(Some(path)) => {
                write!(f, "backup already present at {}", path.display())
            },
            Self::AlreadyPresent(None) => write!(f, "backup already present"),
            Self::NotNeeded => write!(f, "no chain to back up"),
        }
    }
}

/// Guard for the cross-process write lock. Released on drop.
#[derive(Debug)]
pub struct WriteLock {
    file: Option<std::fs::File>,
}

impl WriteLock {
    /// A guard that holds nothing.
    #[must_use]
    pub fn unlocked() -> Self {
        Self { file: None }
    }

    pub(crate) fn holding(file: std::fs::File) -> Self {
        Self { file: Some(file) }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            // fs2::FileExt::unlock requires the trait in scope.
            let _ = <std::fs::File as fs2::FileExt>::unlock(file);
        }
    }
}
