//! External probe invocation.
//!
//! Spawns the system `traceroute` utility once per call and captures its
//! stdout. The child is killed and reaped on every exit path, including an
//! elapsed timeout.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Path-tracing command invoked for every probe run
const PROBE_COMMAND: &str = "traceroute";
/// Fixed flags: ICMP echo probes, the invocation this tool's output format targets
const PROBE_ARGS: &[&str] = &["-I"];

/// A probe invocation that could not produce output
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The command could not be spawned (missing binary, permissions)
    #[error("failed to launch `traceroute {destination}`: {source}")]
    Launch {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    /// The probe ran but exited abnormally
    #[error("`traceroute {destination}` failed ({status}): {stderr}")]
    Failed {
        destination: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The bounded wait elapsed before the probe finished
    #[error("`traceroute {destination}` did not finish within {limit:?}")]
    Timeout {
        destination: String,
        limit: Duration,
    },
}

/// Build the probe command for a destination
fn probe_command(destination: &str) -> Command {
    let mut command = Command::new(PROBE_COMMAND);
    command
        .args(PROBE_ARGS)
        .arg(destination)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    command
}

/// Run the external probe once and return its raw stdout.
///
/// Exactly one child process is spawned per call; a failure is surfaced
/// immediately, never retried here. Without a `timeout` the call blocks for
/// as long as the probe runs.
pub async fn run_probe(
    destination: &str,
    timeout: Option<Duration>,
) -> Result<String, ProbeError> {
    let mut command = probe_command(destination);
    debug!(destination, "spawning {}", PROBE_COMMAND);

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, command.output())
            .await
            .map_err(|_| ProbeError::Timeout {
                destination: destination.to_string(),
                limit,
            })?,
        None => command.output().await,
    };
    let output = output.map_err(|source| ProbeError::Launch {
        destination: destination.to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(ProbeError::Failed {
            destination: destination.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
