//! wasmbox-test-launcher
//!
//! One-shot launcher: boots the sandbox runtime, installs the wheel under
//! test plus pytest and numpy, unpacks the remote home snapshot, and runs
//! the suite. Any failure at any stage is fatal and exits non-zero.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use wasmbox_test_launcher::host::{describe_host, SystemProbe};
use wasmbox_test_launcher::launch::{self, LaunchPlan};
use wasmbox_test_launcher::lockfile::LOCKFILE_NAME;
use wasmbox_test_launcher::resolve::MultipleMatchPolicy;
use wasmbox_test_launcher::sandbox::ProcessSandbox;

/// How long the runtime may take to boot its interpreter.
const READY_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Parser, Debug)]
#[command(name = "wasmbox-test-launcher")]
#[command(about = "Run a distribution's test suite inside a wasm sandbox runtime")]
struct Args {
    /// Wheel distribution under test (first component of the wheel name)
    #[arg(long)]
    distribution: String,

    /// Lockfile describing the interpreter target
    #[arg(long, default_value = LOCKFILE_NAME)]
    lockfile: PathBuf,

    /// Directory holding the built wheels
    #[arg(long, default_value = ".")]
    wheel_dir: PathBuf,

    /// URL of the home-directory snapshot archive
    #[arg(long, default_value = "http://localhost:8000/home.zip")]
    snapshot_url: String,

    /// Sandbox runtime executable
    #[arg(long, default_value = "wasmbox-runtime")]
    runtime: String,

    /// Policy when several wheels match the compatibility pattern
    #[arg(long, value_enum, default_value_t = MultipleMatchPolicy::First)]
    on_multiple_wheels: MultipleMatchPolicy,

    /// Per-request timeout in seconds (install, test run)
    #[arg(long, default_value_t = 600)]
    timeout_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging goes to stderr; stdout belongs to the test framework's report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(host = %describe_host(&SystemProbe), "Starting test launch");

    let plan = LaunchPlan {
        distribution: args.distribution,
        lockfile: args.lockfile,
        wheel_dir: args.wheel_dir,
        snapshot_url: args.snapshot_url,
        on_multiple: args.on_multiple_wheels,
    };

    let request_timeout = Duration::from_secs(args.timeout_seconds);
    let outcome = match ProcessSandbox::spawn(&args.runtime, request_timeout, READY_TIMEOUT).await {
        Ok(mut sandbox) => {
            let outcome = launch::run(&plan, &mut sandbox).await;
            if let Err(e) = sandbox.shutdown().await {
                warn!(error = %e, "Sandbox shutdown failed");
            }
            outcome
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            info!("Test suite passed");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Fatal: test launch failed");
            Err(e.into())
        }
    }
}
