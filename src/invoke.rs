//! Test invocation inside the sandbox.
//!
//! Builds the fixed interpreter fragment that runs the suite and raises a
//! named condition on failure, then executes it and classifies the outcome.

use tracing::info;

use crate::error::LaunchError;
use crate::sandbox::{Sandbox, HOME_MOUNT};

/// Named condition the fragment raises when the suite reports failures. The
/// runtime renders a raise as error text, so the name is how a failing suite
/// is told apart from a broken sandbox.
const FAILURE_CONDITION: &str = "TestRunFailed";

/// Location of the test suite inside the sandbox home.
fn suite_path() -> String {
    format!("{HOME_MOUNT}/lib/test")
}

/// Interpreter fragment: run pytest against the suite, raise on failure.
fn test_fragment() -> String {
    format!(
        r#"import pytest


class {FAILURE_CONDITION}(Exception):
    pass


exit_code = pytest.main(["{path}"])
if exit_code != 0:
    raise {FAILURE_CONDITION}(f"pytest exited with {{exit_code}}")
"#,
        path = suite_path()
    )
}

/// Run the test suite inside the sandbox.
///
/// A sandbox error naming the failure condition becomes
/// [`LaunchError::TestFailure`]; any other sandbox error propagates as-is.
pub async fn run_test_suite<S: Sandbox>(sandbox: &mut S) -> Result<(), LaunchError> {
    info!(suite = %suite_path(), "Running test suite");

    match sandbox.run_source(&test_fragment()).await {
        Err(LaunchError::Sandbox(message)) if message.contains(FAILURE_CONDITION) => {
            Err(LaunchError::TestFailure(message))
        }
        other => other,
    }
}
