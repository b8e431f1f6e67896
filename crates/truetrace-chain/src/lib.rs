//! TrueTrace Chain - tamper-evident, hash-linked event chain.
//!
//! This crate provides:
//! - Events as open JSON objects with a fixed set of well-known fields
//! - A canonical byte encoding that every hash and signature covers
//! - Sealing (hash, optional Ed25519 signature) and per-event validation
//! - JSON file and in-memory chain storage
//! - Whole-chain diagnostics and the re-sign procedure
//!
//! # Security Model
//!
//! Each event carries the SHA-256 of its canonical form in `hash` and the
//! hash of its predecessor in `prev_hash`. Editing any historical event
//! changes its recomputed hash, which then no longer matches the stored
//! `hash` nor the successor's `prev_hash`. Signatures bind the canonical
//! bytes to a public key carried on the event itself.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use truetrace_chain::{ChainLog, NewEvent};
//! use truetrace_crypto::KeyPair;
//!
//! let log = ChainLog::in_memory().with_signer(Box::new(KeyPair::generate()));
//!
//! let first = log.create(NewEvent::new("login", json!({"user": "ana"}))).unwrap();
//! let second = log.create(NewEvent::new("logout", json!({"user": "ana"}))).unwrap();
//! assert_eq!(second.prev_hash(), first.hash());
//!
//! let report = log.diagnose().unwrap();
//! assert!(report.is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod canonical;
pub mod prelude;
pub mod validation;

mod diagnostics;
mod error;
mod event;
mod log;
mod recompute;
mod seal;
mod store;

pub use diagnostics::{
    ChainIssue, DiagnosticsReport, DiagnosticsStatus, EventDiagnostics, EventVerdict,
    HealthReport, HealthStatus, VerificationListing, diagnose_chain, health, verify_events,
};
pub use error::{ChainError, ChainResult};
pub use event::{Event, EventDefaults, NewEvent, fields, generate_event_id};
pub use log::{ChainLog, ResignOutcome};
pub use recompute::recompute_chain;
pub use seal::{seal_event, signature_is_valid};
pub use store::{
    BackupStatus, ChainStorage, JsonFileChainStorage, LoadedChain, MemoryChainStorage,
    StoreHealth, StoreShape, WriteLock,
};
pub use validation::{
    RulePolicy, RuleSet, SecurityRule, ValidationError, ValidationReport, Validator,
};
