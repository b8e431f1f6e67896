//! Shared fixtures for the chain scenarios.

use serde_json::json;
use tempfile::TempDir;
use truetrace_chain::{ChainLog, Event, NewEvent};
use truetrace_crypto::KeyPair;

/// A file-backed chain log in its own temporary directory.
#[allow(dead_code)]
pub struct FileChainHarness {
    /// The log under test.
    pub log: ChainLog,
    /// Key used to sign appended events.
    pub key: KeyPair,
    /// Held so the directory outlives the log.
    pub dir: TempDir,
}

#[allow(dead_code)]
impl FileChainHarness {
    /// Fresh harness with an empty chain at `<tmp>/chain/event_chain.json`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create tempdir");
        let key = KeyPair::generate();
        let signer = KeyPair::from_seed(&key.seed()[..])
            .expect("round-trip of generated key");
        let log = ChainLog::open(Self::chain_path_in(&dir)).with_signer(Box::new(signer));
        Self { log, key, dir }
    }

    /// Path of the chain document.
    pub fn chain_path(&self) -> std::path::PathBuf {
        Self::chain_path_in(&self.dir)
    }

    /// Path of the backup written by re-signing.
    pub fn backup_path(&self) -> std::path::PathBuf {
        let mut path = self.chain_path().into_os_string();
        path.push(".bak");
        path.into()
    }

    fn chain_path_in(dir: &TempDir) -> std::path::PathBuf {
        dir.path().join("chain").join("event_chain.json")
    }
}

/// Append `n` events with payload `{"index": i}` and return them.
#[allow(dead_code)]
pub fn append_indexed(log: &ChainLog, n: usize) -> Vec<Event> {
    (0..n)
        .map(|i| {
            log.create(NewEvent::new("test", json!({ "index": i })))
                .expect("append should succeed")
        })
        .collect()
}

/// A signed in-memory log holding `n` indexed events.
#[allow(dead_code)]
pub fn signed_memory_chain(n: usize) -> Vec<Event> {
    let log = ChainLog::in_memory().with_signer(Box::new(KeyPair::generate()));
    append_indexed(&log, n)
}
