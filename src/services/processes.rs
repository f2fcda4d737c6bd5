// Author: Dustin Pilgrim
// License: MIT

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

#[derive(Debug)]
pub enum ProcessError {
    EmptyCommand,
    Timeout,
    SpawnFailed(std::io::Error),
    PidNotAvailable,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::EmptyCommand => write!(f, "Empty command"),
            ProcessError::Timeout => write!(f, "Command timed out"),
            ProcessError::SpawnFailed(e) => write!(f, "Failed to spawn process: {}", e),
            ProcessError::PidNotAvailable => write!(f, "Failed to get child PID"),
        }
    }
}

impl std::error::Error for ProcessError {}

impl From<std::io::Error> for ProcessError {
    fn from(err: std::io::Error) -> Self {
        ProcessError::SpawnFailed(err)
    }
}

/// Run a shell command to completion, silently, and return its exit status.
pub async fn run_command_status(cmd: &str, limit: Duration) -> Result<ExitStatus, ProcessError> {
    if cmd.trim().is_empty() {
        return Err(ProcessError::EmptyCommand);
    }

    let fut = async {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let status = child.wait().await?;
        Ok::<ExitStatus, ProcessError>(status)
    };

    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ProcessError::Timeout)?
}

/// Run a command detached in its own process group and return its PID.
pub fn run_command_detached(command: &str) -> Result<u32, ProcessError> {
    if command.trim().is_empty() {
        return Err(ProcessError::EmptyCommand);
    }

    let child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()?;

    let pid = child.id().ok_or(ProcessError::PidNotAvailable)?;
    tracing::debug!("spawned detached process: pid={} cmd={}", pid, command);

    Ok(pid)
}
