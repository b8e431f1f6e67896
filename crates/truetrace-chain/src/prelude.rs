//! Prelude module - commonly used types for convenient import.
//!
//! Use `use truetrace_chain::prelude::*;` to import all essential types.

// Errors
pub use crate::{ChainError, ChainResult};

// Events
pub use crate::{Event, EventDefaults, NewEvent, fields};

// Chain
pub use crate::{ChainLog, ResignOutcome};

// Storage
pub use crate::{BackupStatus, ChainStorage, JsonFileChainStorage, MemoryChainStorage, StoreHealth};

// Validation
pub use crate::{RulePolicy, ValidationError, ValidationReport, Validator};

// Diagnostics
pub use crate::{DiagnosticsReport, HealthReport, VerificationListing};
