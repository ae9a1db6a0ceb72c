//! Child-process runner backed by `std::process`.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::command::{CommandOutput, CommandSpec};
use crate::runner::{CommandRunner, ExecError};

/// Interval between exit-status polls while a child is running.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs commands as real child processes.
///
/// Stdout and stderr are drained on background threads so a chatty child can
/// never block on a full pipe while we poll for its exit. When the spec has a
/// timeout, the child is killed and reaped once the deadline passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        tracing::debug!(command = %spec, "Spawning process");
        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match spec.timeout {
            Some(timeout) => wait_with_deadline(&mut child, timeout).map_err(|e| match e {
                WaitError::Io(e) => ExecError::Io(e),
                WaitError::Expired => ExecError::Timeout {
                    program: spec.program.clone(),
                    timeout,
                },
            })?,
            None => child.wait()?,
        };

        let output = CommandOutput {
            exit_code: status.code(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        };

        tracing::debug!(
            program = %spec.program_name(),
            exit_code = ?output.exit_code,
            elapsed_ms = start.elapsed().as_millis(),
            "Process finished"
        );

        Ok(output)
    }
}

enum WaitError {
    Io(std::io::Error),
    Expired,
}

/// Poll the child until it exits or `timeout` elapses.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, WaitError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    tracing::warn!(
                        pid = child.id(),
                        timeout_secs = timeout.as_secs(),
                        "Process timed out, terminating"
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(WaitError::Expired);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(WaitError::Io(e)),
        }
    }
}

/// Read a pipe to the end on a background thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
