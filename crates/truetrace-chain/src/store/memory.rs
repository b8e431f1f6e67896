//! In-memory storage for tests and embedding.

use std::sync::RwLock;

use super::{BackupStatus, ChainStorage, LoadedChain, StoreHealth, StoreShape};
use crate::error::{ChainError, ChainResult};
use crate::event::Event;

/// Chain storage held entirely in memory. The backup is kept alongside.
#[derive(Debug, Default)]
pub struct MemoryChainStorage {
    events: RwLock<Vec<Event>>,
    backup: RwLock<Option<Vec<Event>>>,
}

impl MemoryChainStorage {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `events`, as if read from disk.
    #[must_use]
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: RwLock::new(events),
            backup: RwLock::new(None),
        }
    }

    /// The preserved backup, if one was taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn backup(&self) -> ChainResult<Option<Vec<Event>>> {
        let backup = self.backup.read().map_err(poisoned)?;
        Ok(backup.clone())
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> ChainError {
    ChainError::StorageError(e.to_string())
}

impl ChainStorage for MemoryChainStorage {
    fn load(&self) -> ChainResult<LoadedChain> {
        let events = self.events.read().map_err(poisoned)?.clone();
        let health = if events.is_empty() {
            StoreHealth::Empty
        } else {
            StoreHealth::Healthy
        };
        Ok(LoadedChain::new(events, health, StoreShape::Array))
    }

    fn append(&self, event: &Event) -> ChainResult<()> {
        self.events.write().map_err(poisoned)?.push(event.clone());
        Ok(())
    }

    fn replace_all(&self, events: &[Event]) -> ChainResult<()> {
        *self.events.write().map_err(poisoned)? = events.to_vec();
        Ok(())
    }

    fn preserve_backup(&self) -> ChainResult<BackupStatus> {
        let events = self.events.read().map_err(poisoned)?;
        if events.is_empty() {
            return Ok(BackupStatus::NotNeeded);
        }
        let mut backup = self.backup.write().map_err(poisoned)?;
        if backup.is_some() {
            return Ok(BackupStatus::AlreadyPresent(None));
        }
        *backup = Some(events.clone());
        Ok(BackupStatus::Created(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: &str) -> Event {
        Event::try_from(json!({"event_id": id})).unwrap()
    }

    #[test]
    fn test_append_and_read() {
        let store = MemoryChainStorage::new();
        assert_eq!(store.load().unwrap().health, StoreHealth::Empty);

        store.append(&event("a")).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.events.len(), 1);
        assert_eq!(loaded.health, StoreHealth::Healthy);
    }

    #[test]
    fn test_backup_taken_once() {
        let store = MemoryChainStorage::with_events(vec![event("a")]);
        assert_eq!(store.preserve_backup().unwrap(), BackupStatus::Created(None));

        store.replace_all(&[event("b")]).unwrap();
        assert_eq!(
            store.preserve_backup().unwrap(),
            BackupStatus::AlreadyPresent(None)
        );

        let backup = store.backup().unwrap().unwrap();
        assert_eq!(backup[0].event_id(), Some("a"));
        assert_eq!(store.read_all().unwrap()[0].event_id(), Some("b"));
    }

    #[test]
    fn test_empty_store_needs_no_backup() {
        assert_eq!(
            MemoryChainStorage::new().preserve_backup().unwrap(),
            BackupStatus::NotNeeded
        );
    }
}
