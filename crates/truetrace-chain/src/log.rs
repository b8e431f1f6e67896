//! Chain log - main interface for appending to and inspecting a chain.
//!
//! [`ChainLog`] is the single writer: it serializes appends within the
//! process and takes the storage write lock so the tip read, seal and
//! persist happen as one step.

use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, info, warn};
use truetrace_crypto::EventSigner;

use crate::canonical::event_hash_hex;
use crate::diagnostics::{
    DiagnosticsReport, HealthReport, VerificationListing, diagnose_chain, health, verify_events,
};
use crate::error::{ChainError, ChainResult};
use crate::event::{Event, EventDefaults, NewEvent};
use crate::recompute::recompute_chain;
use crate::seal::seal_event;
use crate::store::{
    BackupStatus, ChainStorage, JsonFileChainStorage, LoadedChain, MemoryChainStorage,
};
use crate::validation::{ValidationReport, Validator};

/// Append-only event chain over a storage backend.
pub struct ChainLog {
    storage: Box<dyn ChainStorage>,
    signer: Option<Box<dyn EventSigner>>,
    validator: Validator,
    defaults: EventDefaults,
    write_gate: Mutex<()>,
}

impl ChainLog {
    /// Create a chain log with a custom storage backend.
    #[must_use]
    pub fn with_storage(storage: Box<dyn ChainStorage>) -> Self {
        Self {
            storage,
            signer: None,
            validator: Validator::default(),
            defaults: EventDefaults::default(),
            write_gate: Mutex::new(()),
        }
    }

    /// Create a chain log persisted to a JSON file.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_storage(Box::new(JsonFileChainStorage::new(path.as_ref())))
    }

    /// Create an in-memory chain log (for testing).
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_storage(Box::new(MemoryChainStorage::new()))
    }

    /// Sign appended events with `signer`. Without one, events are hashed
    /// but unsigned.
    #[must_use]
    pub fn with_signer(mut self, signer: Box<dyn EventSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Use a specific validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Use specific event defaults for [`create`](Self::create).
    #[must_use]
    pub fn with_defaults(mut self, defaults: EventDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// The validator used for appends and diagnostics.
    #[must_use]
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Public key of the configured signer, as hex.
    #[must_use]
    pub fn signer_public_key_hex(&self) -> Option<String> {
        self.signer.as_ref().map(|s| s.public_key_hex())
    }

    /// Build a fresh event and append it.
    ///
    /// # Errors
    ///
    /// Same as [`append`](Self::append).
    pub fn create(&self, new_event: NewEvent) -> ChainResult<Event> {
        self.append(new_event.build(&self.defaults))
    }

    /// Seal `event` onto the tip of the chain and persist it.
    ///
    /// Any `hash`, `signature`, `pubkey` or `prev_hash` already on the event
    /// is replaced. The sealed event is validated before it is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Rejected`] if the sealed event fails
    /// validation, or a storage or signing error. The store is unchanged in
    /// every error case.
    pub fn append(&self, mut event: Event) -> ChainResult<Event> {
        let _gate = self
            .write_gate
            .lock()
            .map_err(|e| ChainError::StorageError(e.to_string()))?;
        let _lock = self.storage.lock_writes()?;

        let events = self.storage.read_all()?;
        let prev_hash = events.last().map(tip_hash).unwrap_or_default();

        event.set_prev_hash(prev_hash);
        let hash = seal_event(&mut event, self.signer.as_deref())?;

        let report = self.validator.validate(&event);
        if !report.is_valid() {
            warn!(
                event_id = event.event_id().unwrap_or_default(),
                errors = ?report.error_codes(),
                "Rejected event"
            );
            return Err(ChainError::Rejected {
                errors: report.error_codes(),
            });
        }

        debug!(
            event_id = event.event_id().unwrap_or_default(),
            event_type = event.event_type().unwrap_or_default(),
            index = events.len(),
            hash = %hash,
            "Appending chain event"
        );

        self.storage.append(&event)?;
        Ok(event)
    }

    /// Every event with store health.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn load(&self) -> ChainResult<LoadedChain> {
        self.storage.load()
    }

    /// Every event in chain order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn read_all(&self) -> ChainResult<Vec<Event>> {
        self.storage.read_all()
    }

    /// Number of events.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn len(&self) -> ChainResult<usize> {
        Ok(self.storage.read_all()?.len())
    }

    /// Whether the chain has no events.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn is_empty(&self) -> ChainResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Event at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::EventNotFound`] if `index` is out of range.
    pub fn get(&self, index: usize) -> ChainResult<Event> {
        let mut events = self.storage.read_all()?;
        let len = events.len();
        if index >= len {
            return Err(ChainError::EventNotFound { index, len });
        }
        Ok(events.swap_remove(index))
    }

    /// The most recent event, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn latest(&self) -> ChainResult<Option<Event>> {
        Ok(self.storage.read_all()?.pop())
    }

    /// Events whose JSON text contains `query`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn search(&self, query: &str) -> ChainResult<Vec<Event>> {
        Ok(self
            .storage
            .read_all()?
            .into_iter()
            .filter(|e| e.matches(query))
            .collect())
    }

    /// Validate a single event with this log's validator.
    #[must_use]
    pub fn validate(&self, event: &Event) -> ValidationReport {
        self.validator.validate(event)
    }

    /// Full diagnostics over the stored chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn diagnose(&self) -> ChainResult<DiagnosticsReport> {
        Ok(diagnose_chain(&self.storage.read_all()?, &self.validator))
    }

    /// Per-event verdicts over the stored chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn verify_events(&self) -> ChainResult<VerificationListing> {
        Ok(verify_events(&self.storage.read_all()?, &self.validator))
    }

    /// Quick check of the latest event.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn health(&self) -> ChainResult<HealthReport> {
        Ok(health(&self.storage.read_all()?, &self.validator))
    }

    /// Rebuild the stored chain under `signer`.
    ///
    /// The chain is recomputed first; the backup is then preserved and the
    /// new chain written. Nothing is written if recomputing fails.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Recompute`] with the failing index, or a
    /// storage error from the backup or the rewrite.
    pub fn resign(&self, signer: &dyn EventSigner) -> ChainResult<ResignOutcome> {
        let _gate = self
            .write_gate
            .lock()
            .map_err(|e| ChainError::StorageError(e.to_string()))?;
        let _lock = self.storage.lock_writes()?;

        let events = self.storage.read_all()?;
        if events.is_empty() {
            info!("Chain is empty; nothing to re-sign");
            return Ok(ResignOutcome {
                events_resigned: 0,
                backup: BackupStatus::NotNeeded,
                public_key: signer.public_key_hex(),
            });
        }

        let rebuilt = recompute_chain(&events, signer)?;
        let backup = self.storage.preserve_backup()?;
        self.storage.replace_all(&rebuilt)?;

        info!(
            events = rebuilt.len(),
            key_id = %signer.public_key().key_id_hex(),
            backup = %backup,
            "Chain re-signed"
        );

        Ok(ResignOutcome {
            events_resigned: rebuilt.len(),
            backup,
            public_key: signer.public_key_hex(),
        })
    }
}

// The stored hash if there is one, otherwise the recomputed one.
fn tip_hash(event: &Event) -> String {
    match event.hash() {
        Some(hash) if !hash.is_empty() => hash.to_string(),
        _ => event_hash_hex(event),
    }
}

impl std::fmt::Debug for ChainLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainLog")
            .field(
                "signer_key_id",
                &self.signer.as_ref().map(|s| s.public_key().key_id_hex()),
            )
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

/// Result of [`ChainLog::resign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResignOutcome {
    /// Number of events rewritten.
    pub events_resigned: usize,
    /// What happened to the backup.
    pub backup: BackupStatus,
    /// Public key now carried by every event.
    pub public_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use truetrace_crypto::KeyPair;

    fn signed_log() -> ChainLog {
        ChainLog::in_memory().with_signer(Box::new(KeyPair::generate()))
    }

    #[test]
    fn test_create_and_retrieve() {
        let log = signed_log();
        let event = log.create(NewEvent::new("login", json!({"user": "ana"}))).unwrap();

        assert_eq!(event.prev_hash(), Some(""));
        assert!(event.signature().is_some());
        assert_eq!(log.len().unwrap(), 1);
        assert_eq!(log.get(0).unwrap(), event);
        assert_eq!(log.latest().unwrap(), Some(event));
    }

    #[test]
    fn test_sequential_appends_link() {
        let log = signed_log();
        for i in 0..5 {
            log.create(NewEvent::new("tick", json!({"index": i}))).unwrap();
        }

        let events = log.read_all().unwrap();
        for pair in events.windows(2) {
            assert_eq!(pair[1].prev_hash(), pair[0].hash());
        }
        assert!(log.diagnose().unwrap().is_ok());
    }

    #[test]
    fn test_append_replaces_author_supplied_seal() {
        let log = ChainLog::in_memory();
        let event = Event::try_from(json!({
            "event_id": "evt-x",
            "event_type": "t",
            "payload": {},
            "timestamp": 1,
            "prev_hash": "forged",
            "hash": "forged",
        }))
        .unwrap();

        let stored = log.append(event).unwrap();
        assert_eq!(stored.prev_hash(), Some(""));
        assert_ne!(stored.hash(), Some("forged"));
        assert!(!stored.contains("signature"));
    }

    #[test]
    fn test_invalid_event_is_rejected_and_not_stored() {
        let log = signed_log();
        let event = Event::try_from(json!({"event_type": "t", "payload": {}})).unwrap();

        let err = log.append(event).unwrap_err();
        match err {
            ChainError::Rejected { errors } => {
                assert!(errors.contains(&"missing_field:event_id".to_string()));
                assert!(errors.contains(&"missing_field:timestamp".to_string()));
            },
            other => panic!("unexpected error: {other}"),
        }
        assert!(log.is_empty().unwrap());
    }

    #[test]
    fn test_get_out_of_range() {
        let log = ChainLog::in_memory();
        assert!(matches!(
            log.get(3),
            Err(ChainError::EventNotFound { index: 3, len: 0 })
        ));
        assert_eq!(log.latest().unwrap(), None);
    }

    #[test]
    fn test_search() {
        let log = ChainLog::in_memory();
        log.create(NewEvent::new("door", json!({"state": "Opened"})))
            .unwrap();
        log.create(NewEvent::new("door", json!({"state": "closed"})))
            .unwrap();

        assert_eq!(log.search("opened").unwrap().len(), 1);
        assert_eq!(log.search("DOOR").unwrap().len(), 2);
        assert!(log.search("window").unwrap().is_empty());
    }

    #[test]
    fn test_resign_rotates_key_and_backs_up() {
        let storage = std::sync::Arc::new(MemoryChainStorage::new());
        let log = ChainLog::with_storage(Box::new(SharedStorage(storage.clone())))
            .with_signer(Box::new(KeyPair::generate()));
        for i in 0..3 {
            log.create(NewEvent::new("tick", json!({"index": i}))).unwrap();
        }
        let before = log.read_all().unwrap();

        let new_key = KeyPair::generate();
        let outcome = log.resign(&new_key).unwrap();
        assert_eq!(outcome.events_resigned, 3);
        assert_eq!(outcome.backup, BackupStatus::Created(None));
        assert_eq!(outcome.public_key, new_key.public_key_hex());

        let after = log.read_all().unwrap();
        assert!(after.iter().all(|e| e.pubkey() == Some(new_key.public_key_hex().as_str())));
        assert!(log.diagnose().unwrap().is_ok());
        assert_eq!(storage.backup().unwrap().unwrap(), before);

        let again = log.resign(&new_key).unwrap();
        assert_eq!(again.backup, BackupStatus::AlreadyPresent(None));
        assert_eq!(log.read_all().unwrap(), after);
    }

    #[test]
    fn test_resign_empty_chain() {
        let log = ChainLog::in_memory();
        let outcome = log.resign(&KeyPair::generate()).unwrap();
        assert_eq!(outcome.events_resigned, 0);
        assert_eq!(outcome.backup, BackupStatus::NotNeeded);
    }

    #[test]
    fn test_unsigned_log_hashes_only() {
        let log = ChainLog::in_memory();
        let event = log.create(NewEvent::new("t", json!({}))).unwrap();
        assert!(event.hash().is_some());
        assert!(event.pubkey().is_none());
        assert!(log.health().unwrap().status == crate::HealthStatus::Ok);
    }

    #[test]
    fn test_concurrent_appends_keep_chain_linked() {
        let dir = tempfile::tempdir().unwrap();
        let log = std::sync::Arc::new(
            ChainLog::open(dir.path().join("event_chain.json"))
                .with_signer(Box::new(KeyPair::generate())),
        );

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let log = std::sync::Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        log.create(NewEvent::new("tick", json!({"worker": worker, "index": i})))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len().unwrap(), 80);
        let report = log.diagnose().unwrap();
        assert!(report.is_ok(), "{report:?}");
    }

    struct SharedStorage(std::sync::Arc<MemoryChainStorage>);

    impl ChainStorage for SharedStorage {
        fn load(&self) -> ChainResult<LoadedChain> {
            self.0.load()
        }
        fn append(&self, event: &Event) -> ChainResult<()> {
            self.0.append(event)
        }
        fn replace_all(&self, events: &[Event]) -> ChainResult<()> {
            self.0.replace_all(events)
        }
        fn preserve_backup(&self) -> ChainResult<BackupStatus> {
            self.0.preserve_backup()
        }
    }
}
