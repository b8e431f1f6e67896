//! Library half of the `truetrace` binary.
//!
//! Exposes the conversions from resolved configuration into chain and
//! telemetry types so other crates build a chain the same way the CLI does.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
