//! Failure taxonomy for the launch pipeline.
//!
//! Nothing here is recovered: every variant is logged once where it arises
//! and then propagated until it terminates the process. The launcher is a
//! one-shot CI step, so there is no retry logic anywhere.

use thiserror::Error;

/// Everything that can abort a launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Lockfile missing, unreadable, or malformed.
    #[error("invalid launch configuration: {0}")]
    Config(String),

    /// No usable wheel for the interpreter target.
    #[error("wheel resolution failed: {0}")]
    Resolution(String),

    /// Home snapshot could not be fetched.
    #[error("snapshot fetch failed: {0}")]
    Network(String),

    /// Home snapshot archive is corrupt or unsafe to unpack.
    #[error("snapshot archive unusable: {0}")]
    Archive(String),

    /// One or more tests failed inside the sandbox.
    #[error("test suite failed: {0}")]
    TestFailure(String),

    /// Any other failure inside the sandbox runtime.
    #[error("sandbox runtime error: {0}")]
    Sandbox(String),
}
