//! Stdio pipe to the sandbox runtime process.
//!
//! Owns the spawned runtime child, communicates via length-prefixed JSON on
//! the child's stdin (requests) and stdout (responses). The child's stderr
//! is inherited so the test framework's report streams straight to the
//! console. The launcher drives the pipe from a single logical thread, so
//! no locking is needed.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tracing::{debug, warn};

use super::protocol::{RuntimeRequest, RuntimeResponse};
use super::{recv_message, send_message};

/// Pipe transport to a spawned sandbox runtime.
///
/// The runtime process is spawned once and kept alive for the whole
/// bootstrap-and-test sequence.
pub struct RuntimePipe {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
}

impl RuntimePipe {
    /// Spawn the runtime executable and wait for its `Ready` message.
    ///
    /// `env_vars` are handed to the child for runtime home mounting.
    /// `ready_timeout` bounds how long the interpreter may take to boot.
    pub async fn spawn(
        exec: &str,
        env_vars: &[(String, String)],
        ready_timeout: Duration,
    ) -> Result<Self> {
        debug!(exec = %exec, "Spawning sandbox runtime");

        let mut cmd = tokio::process::Command::new(exec);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn sandbox runtime: {exec}"))?;

        let stdin = child.stdin.take().context("Failed to take runtime stdin")?;
        let mut stdout = child
            .stdout
            .take()
            .context("Failed to take runtime stdout")?;

        await_ready(&mut stdout, ready_timeout).await?;
        debug!("Runtime is ready");

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }

    /// Send a request and wait for the response.
    ///
    /// If `deadline` passes before the runtime answers, the child is killed
    /// and the request fails.
    pub async fn request(
        &mut self,
        req: &RuntimeRequest,
        deadline: Duration,
    ) -> Result<RuntimeResponse> {
        let req_bytes = serde_json::to_vec(req).context("Failed to serialize request")?;

        let stdin = &mut self.stdin;
        let stdout = &mut self.stdout;
        let exchange = async move {
            send_message(stdin, &req_bytes)
                .await
                .context("Failed to send request to runtime")?;
            recv_message(stdout)
                .await
                .context("Failed to read response from runtime")
        };

        let resp_bytes = if let Ok(result) = tokio::time::timeout(deadline, exchange).await {
            result?
        } else {
            let _ = self.child.kill().await;
            anyhow::bail!("Runtime did not respond within {deadline:?}");
        };

        let resp: RuntimeResponse =
            serde_json::from_slice(&resp_bytes).context("Failed to parse runtime response")?;

        Ok(resp)
    }

    /// Gracefully shut down the runtime, then kill it to ensure cleanup.
    pub async fn shutdown(mut self) -> Result<()> {
        let shutdown_bytes =
            serde_json::to_vec(&RuntimeRequest::Shutdown).context("Failed to serialize shutdown")?;
        if let Err(e) = send_message(&mut self.stdin, &shutdown_bytes).await {
            warn!(error = %e, "Graceful shutdown failed, killing runtime");
        }

        let _ = self.child.kill().await;
        let _ = self.child.wait().await;

        debug!("Sandbox runtime shut down");
        Ok(())
    }
}

/// Block until the freshly spawned runtime announces itself.
///
/// The first message on the child's stdout must be `Ready`; anything else,
/// or silence past `ready_timeout`, means the interpreter failed to boot.
async fn await_ready(stdout: &mut ChildStdout, ready_timeout: Duration) -> Result<()> {
    let bytes = tokio::time::timeout(ready_timeout, recv_message(stdout))
        .await
        .map_err(|_| anyhow::anyhow!("Runtime did not send Ready within {ready_timeout:?}"))?
        .context("Failed to read runtime Ready message")?;

    match serde_json::from_slice(&bytes).context("Failed to parse runtime Ready message")? {
        RuntimeResponse::Ready => Ok(()),
        other => anyhow::bail!("Expected Ready message, got: {other:?}"),
    }
}
