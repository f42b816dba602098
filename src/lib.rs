//! wasmbox-test-launcher library
//!
//! This crate provides the pieces of the one-shot test launcher:
//! - Host environment identification
//! - Lockfile parsing and wheel resolution
//! - Sandbox capability trait and the process-backed runtime driver
//! - Home-snapshot fetch/unpack and test invocation

pub mod error;
pub mod host;
pub mod invoke;
pub mod launch;
pub mod lockfile;
pub mod resolve;
pub mod sandbox;
pub mod snapshot;
pub mod transport;
