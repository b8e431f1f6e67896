//! TrueTrace Telemetry - logging setup for the TrueTrace tools.
//!
//! Library crates only emit `tracing` events. This crate installs the
//! subscriber that renders them, in one of four formats, to stdout, stderr
//! or a log directory.
//!
//! # Example
//!
//! ```rust,no_run
//! use truetrace_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), truetrace_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("truetrace_chain=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LOG_FILE_PREFIX, LogConfig, LogFormat, LogTarget, setup_logging};
