//! Cross-crate tests for TrueTrace.
//!
//! This crate exists only to host the scenarios under `tests/`. It has no
//! public API.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
