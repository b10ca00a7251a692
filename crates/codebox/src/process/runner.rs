//! Process spawning with merged output and a wall-clock timeout

use std::io::PipeReader;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, instrument, warn};

use crate::process::command::ProcessCommand;
use crate::process::{ProcessError, resolve_program};

/// How a process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Exited normally with the given code
    Exited(i32),

    /// Killed by a signal it did not handle
    Signaled(Option<i32>),

    /// Killed after running past the given limit
    TimedOut(Duration),
}

/// Captured result of one process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Combined stdout and stderr, one `\n`-terminated line at a time
    pub output: String,

    /// How the process ended
    pub status: ProcessStatus,

    /// Wall time from spawn to exit (or kill)
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// Check if the process exited with code 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, ProcessStatus::Exited(0))
    }

    /// Exit code if the process exited normally
    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            ProcessStatus::Exited(code) => Some(code),
            _ => None,
        }
    }

    /// Replace every occurrence of `from` in the captured output
    pub fn replace_in_output(self, from: &str, to: &str) -> Self {
        if from.is_empty() || !self.output.contains(from) {
            return self;
        }
        Self {
            output: self.output.replace(from, to),
            ..self
        }
    }
}

/// Run a command, merging stdout and stderr, killing it after `timeout`.
///
/// Both output streams of the process are the write end of one pipe, so the
/// captured output keeps the order in which the process wrote it. The process
/// is started in its own process group with stdin closed; on timeout the
/// whole group is killed so that children of the process cannot keep running
/// (or keep the pipe open).
#[instrument(skip(command), fields(program = ?command.program()))]
pub async fn run(
    command: &ProcessCommand,
    timeout: Duration,
) -> Result<ProcessOutput, ProcessError> {
    let program = command.program().ok_or(ProcessError::EmptyCommand)?;
    let resolved = resolve_program(program, command.working_dir())?;

    let (reader, writer) = std::io::pipe()?;

    let mut cmd = Command::new(&resolved);
    cmd.args(command.args())
        .current_dir(command.working_dir())
        .envs(command.env_vars())
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer)
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    debug!(args = ?command.build(), ?resolved, "spawning process");

    let started = Instant::now();
    let spawned = cmd.spawn();
    // Closes the parent's write ends, so the reader sees EOF once the
    // process tree exits
    drop(cmd);
    let mut child = spawned.map_err(|source| ProcessError::SpawnFailed {
        program: program.to_owned(),
        source,
    })?;
    let reader = merged_reader(reader)?;

    let collected = tokio::time::timeout(timeout, collect(&mut child, reader)).await;
    match collected {
        Ok(result) => {
            let (output, status) = result?;
            let elapsed = started.elapsed();
            debug!(?status, ?elapsed, len = output.len(), "process finished");
            Ok(ProcessOutput {
                output,
                status,
                elapsed,
            })
        }
        Err(_) => {
            warn!(?timeout, "process timed out, killing process group");
            terminate(&mut child).await;
            Ok(ProcessOutput {
                output: String::new(),
                status: ProcessStatus::TimedOut(timeout),
                elapsed: started.elapsed(),
            })
        }
    }
}

#[cfg(unix)]
fn merged_reader(reader: PipeReader) -> std::io::Result<tokio::net::unix::pipe::Receiver> {
    tokio::net::unix::pipe::Receiver::from_owned_fd(reader.into())
}

#[cfg(not(unix))]
fn merged_reader(reader: PipeReader) -> std::io::Result<tokio::fs::File> {
    let handle = std::os::windows::io::OwnedHandle::from(reader);
    Ok(tokio::fs::File::from_std(std::fs::File::from(handle)))
}

/// Decode one raw line and terminate it with a single `\n`
///
/// Invalid UTF-8 is replaced rather than ending the stream.
fn into_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let mut line = String::from_utf8_lossy(raw).into_owned();
    line.push('\n');
    line
}

/// Read merged output line by line until the pipe closes, then reap the
/// process
async fn collect(
    child: &mut Child,
    stream: impl AsyncRead + Unpin,
) -> Result<(String, ProcessStatus), ProcessError> {
    let mut reader = BufReader::new(stream);
    let mut output = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        output.push_str(&into_line(&buf));
    }

    let status = child.wait().await?;
    Ok((output, exit_status(status)))
}

fn exit_status(status: std::process::ExitStatus) -> ProcessStatus {
    if let Some(code) = status.code() {
        return ProcessStatus::Exited(code);
    }

    #[cfg(unix)]
    let signal = std::os::unix::process::ExitStatusExt::signal(&status);
    #[cfg(not(unix))]
    let signal = None;

    ProcessStatus::Signaled(signal)
}

/// Kill the process group led by `child`, then the child itself
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            debug!(pid, error = %e, "failed to kill process group");
        }
    }

    // Also reaps the child so it does not linger as a zombie
    if let Err(e) = child.kill().await {
        debug!(error = %e, "failed to kill process");
    }
}
