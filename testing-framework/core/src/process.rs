use std::{
    io,
    process::{Output, Stdio},
    time::Duration,
};

use thiserror::Error;
use tokio::{process::Command, time::timeout};
use tracing::{debug, warn};

/// Errors returned from external tool invocations (`docker`, `terraform`).
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with status {status:?}\nstderr:\n{stderr}\nstdout:\n{stdout}")]
    Failed {
        command: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Run a prepared command to completion, capturing its output.
///
/// The child is killed if the returned future is dropped or the timeout
/// elapses.
pub async fn run_command(
    mut cmd: Command,
    timeout_duration: Duration,
    description: &str,
) -> Result<Output, CommandError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(command = description, timeout = ?timeout_duration, "running external command");

    let output = match timeout(timeout_duration, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(CommandError::Spawn {
                command: description.to_owned(),
                source,
            });
        }
        Err(_) => {
            warn!(command = description, timeout = ?timeout_duration, "external command timed out");
            return Err(CommandError::Timeout {
                command: description.to_owned(),
                timeout: timeout_duration,
            });
        }
    };

    if output.status.success() {
        Ok(output)
    } else {
        Err(CommandError::Failed {
            command: description.to_owned(),
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
