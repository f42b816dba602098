//! Runtime protocol message types.
//!
//! Length-prefixed JSON protocol between the launcher and the sandbox
//! runtime process. Messages are framed as: [4-byte BE length][JSON payload]

use serde::{Deserialize, Serialize};

/// Request sent from launcher to runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeRequest {
    /// Install packages into the sandbox as one batch. Wheel paths and
    /// plain package names are both accepted; the runtime resolves them.
    Install { packages: Vec<String> },
    /// Execute interpreter source inside the sandbox.
    RunSource { source: String },
    /// Graceful shutdown.
    Shutdown,
}

/// Response sent from runtime to launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeResponse {
    /// Runtime booted and ready to accept requests (sent once on startup).
    Ready,
    /// Request completed without raising.
    Ok,
    /// Request failed; `message` carries the interpreter's rendered error.
    Error { message: String },
}
