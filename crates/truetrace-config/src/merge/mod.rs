//! Deep merge of TOML values with per-field source tracking.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from an overlay never resets the base value.

mod deep;
mod types;

pub use deep::{deep_merge, deep_merge_tracking, record_leaves};
pub use types::{ConfigLayer, FieldSources};
