//! Running external tools with a timeout.
//!
//! [`run_with_timeout`] spawns a command, drains its stdout and stderr on helper threads so a
//! chatty child can never block on a full pipe, and polls for exit until a deadline. A child
//! still running at the deadline, or still holding its output open through a descendant, is
//! killed together with its process group.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use thiserror::Error;

/// Interval between exit checks while waiting for a child.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Failure running an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The executable could not be started
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        /// The program that was invoked
        program: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// I/O failed while talking to or waiting for the child
    #[error("I/O error while running '{program}': {source}")]
    Io {
        /// The program that was invoked
        program: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The child exited unsuccessfully
    #[error("'{program}' exited with {status}: {stderr}")]
    Exit {
        /// The program that was invoked
        program: String,
        /// Exit status
        status: ExitStatus,
        /// Captured standard error, lossily decoded
        stderr: String,
    },

    /// The child did not finish in time and was killed
    #[error("'{program}' did not finish within {timeout:?} and was killed")]
    Timeout {
        /// The program that was invoked
        program: String,
        /// The timeout that elapsed
        timeout: Duration,
    },
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Standard output.
    pub stdout: Vec<u8>,
    /// Standard error.
    pub stderr: Vec<u8>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl ToolOutput {
    /// Standard output decoded lossily.
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error decoded lossily.
    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// A program plus arguments, kept as plain data so it can be logged before it is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Executable name or path.
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl ToolInvocation {
    /// Creates an invocation with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Display name of the program.
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// The command line as a single string, for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program_name()).chain(self.args.iter().cloned()).collect::<Vec<_>>().join(" ")
    }
}

/// Which output stream a drain thread read.
#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

type Drained = (Stream, std::io::Result<Vec<u8>>);

fn drain<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<Drained>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = pipe.read_to_end(&mut buf).map(|_| buf);
        // The receiver is gone once the run has timed out.
        let _ = tx.send((stream, result));
    });
}

/// Kills every process in the child's process group, then reaps the child.
fn kill_tree(child: &mut Child) {
    kill_group(child.id());
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: kill(2) takes no pointers; a negative pid addresses a process group.
    let _ = unsafe { libc::kill(-pgid, libc::SIGKILL) };
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

/// Runs `invocation`, capturing its output, and kills it if it runs longer than `timeout`.
///
/// The deadline covers both the child's exit and the end of its output: a descendant that
/// inherited the pipes and keeps them open past the deadline also times the run out. On
/// Unix the child leads its own process group and the whole group is killed on timeout.
///
/// # Errors
///
/// Returns a [`ToolError`] if the program cannot be started, exits unsuccessfully, cannot be
/// waited on, or exceeds the timeout.
pub fn run_with_timeout(invocation: &ToolInvocation, timeout: Duration) -> Result<ToolOutput, ToolError> {
    let program = invocation.program_name();
    debug!("Running: {}", invocation.command_line());

    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let start = Instant::now();
    let mut child =
        command.spawn().map_err(|source| ToolError::Spawn { program: program.clone(), source })?;

    let (tx, rx) = mpsc::channel();
    let mut pending = 0;
    if let Some(pipe) = child.stdout.take() {
        drain(pipe, Stream::Stdout, tx.clone());
        pending += 1;
    }
    if let Some(pipe) = child.stderr.take() {
        drain(pipe, Stream::Stderr, tx.clone());
        pending += 1;
    }
    drop(tx);

    let deadline = start + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                kill_tree(&mut child);
                return Err(ToolError::Timeout { program, timeout });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                kill_tree(&mut child);
                return Err(ToolError::Io { program, source });
            }
        }
    };

    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    while pending > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((stream, result)) => {
                pending -= 1;
                let buf = result.map_err(|source| ToolError::Io { program: program.clone(), source })?;
                match stream {
                    Stream::Stdout => stdout = buf,
                    Stream::Stderr => stderr = buf,
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                debug!("'{program}' exited but its output was still open at the deadline");
                kill_group(child.id());
                return Err(ToolError::Timeout { program, timeout });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ToolError::Io {
                    program,
                    source: std::io::Error::other("output reader thread exited without a result"),
                });
            }
        }
    }
    let elapsed = start.elapsed();
    debug!("'{program}' finished with {status} in {elapsed:?}");

    if status.success() {
        Ok(ToolOutput { stdout, stderr, elapsed })
    } else {
        Err(ToolError::Exit { program, status, stderr: String::from_utf8_lossy(&stderr).trim().to_string() })
    }
}
