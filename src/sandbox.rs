//! Sandbox capability trait and implementations.
//!
//! The embedded interpreter is a black box behind this trait: the launcher
//! only installs packages into it, populates its home directory, and runs
//! source inside it. The real implementation drives an external runtime
//! process; tests substitute a recording mock.

mod process;

pub use process::ProcessSandbox;

use async_trait::async_trait;

use crate::error::LaunchError;

/// Mount point of the sandbox home directory, as seen from inside the
/// sandbox. The test suite lives under this tree.
pub const HOME_MOUNT: &str = "/home/wasmbox";

/// Archive formats understood by [`Sandbox::unpack_archive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Zip, the format the home snapshot ships in.
    Zip,
}

/// One embedded interpreter session.
///
/// Single-use and exclusively owned: created once, driven through the full
/// bootstrap-and-test sequence, then discarded. Packages must be installed
/// before the home snapshot is unpacked or source is run.
#[async_trait]
pub trait Sandbox: Send {
    /// Install packages into the sandbox as one batched, all-or-nothing
    /// step. No partial-install recovery is attempted.
    async fn install(&mut self, packages: &[String]) -> Result<(), LaunchError>;

    /// Unpack an archive into the sandbox's filesystem root, byte for byte.
    fn unpack_archive(&mut self, bytes: &[u8], format: ArchiveFormat) -> Result<(), LaunchError>;

    /// Run interpreter source inside the sandbox.
    ///
    /// A raised interpreter exception surfaces as [`LaunchError::Sandbox`]
    /// carrying the rendered exception text.
    async fn run_source(&mut self, source: &str) -> Result<(), LaunchError>;
}
