//! The launch pipeline: lockfile, wheel, install, home snapshot, test run.
//!
//! Strictly linear and single-pass. Every step is awaited in sequence on
//! one logical thread and any failure aborts the run; no step retries.

use std::path::PathBuf;

use tracing::info;

use crate::error::LaunchError;
use crate::invoke;
use crate::lockfile::Lockfile;
use crate::resolve::{self, MultipleMatchPolicy};
use crate::sandbox::Sandbox;
use crate::snapshot;

/// Test framework installed alongside the wheel under test.
const TEST_FRAMEWORK: &str = "pytest";

/// Numeric dependency the suite imports.
const NUMERIC_DEP: &str = "numpy";

/// Everything a run needs besides the sandbox itself.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    /// Wheel distribution under test (first component of the wheel name).
    pub distribution: String,

    /// Lockfile describing the interpreter target.
    pub lockfile: PathBuf,

    /// Directory holding the built wheels.
    pub wheel_dir: PathBuf,

    /// URL of the home-directory snapshot archive.
    pub snapshot_url: String,

    /// Policy when several wheels match the compatibility pattern.
    pub on_multiple: MultipleMatchPolicy,
}

/// Run the full bootstrap-and-test sequence against `sandbox`.
///
/// The sandbox must be freshly created; this consumes its one session.
pub async fn run<S: Sandbox>(plan: &LaunchPlan, sandbox: &mut S) -> Result<(), LaunchError> {
    let lockfile = Lockfile::load(&plan.lockfile)?;
    info!(
        language_version = %lockfile.info.language_version,
        abi_version = %lockfile.info.abi_version,
        arch = %lockfile.info.arch,
        "Loaded lockfile"
    );

    let pattern = resolve::wheel_pattern(&plan.distribution, &lockfile.info)?;
    let names = resolve::list_wheel_dir(&plan.wheel_dir)?;
    let wheel = resolve::select_wheel(&pattern, &names, plan.on_multiple)?;
    info!(wheel = %wheel, "Resolved wheel");

    let wheel_path = plan.wheel_dir.join(&wheel);
    let packages = vec![
        wheel_path.to_string_lossy().into_owned(),
        TEST_FRAMEWORK.to_string(),
        NUMERIC_DEP.to_string(),
    ];
    info!(packages = ?packages, "Installing into sandbox");
    sandbox.install(&packages).await?;

    info!(url = %plan.snapshot_url, "Loading home snapshot");
    snapshot::load_home_snapshot(sandbox, &plan.snapshot_url).await?;

    invoke::run_test_suite(sandbox).await
}
