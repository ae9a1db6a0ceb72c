//! Runner trait and error types.

use std::path::PathBuf;
use std::time::Duration;

use crate::command::{CommandOutput, CommandSpec};

/// Executes [`CommandSpec`]s.
///
/// A non-zero exit status is reported through [`CommandOutput::exit_code`],
/// not as an error: whether it is fatal is the caller's decision. Errors are
/// reserved for processes that could not be started or did not finish.
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion (or until its timeout expires).
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

/// Process execution error.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The executable could not be spawned.
    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        /// Executable that failed to start.
        program: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The process exceeded its deadline and was killed.
    #[error("{} timed out after {}s", program.display(), timeout.as_secs())]
    Timeout {
        /// Executable that timed out.
        program: PathBuf,
        /// Deadline that was exceeded.
        timeout: Duration,
    },

    /// I/O error while waiting for the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecError {
    /// Whether retrying the same command may succeed.
    ///
    /// Only timeouts are transient; spawn failures mean a missing or
    /// non-executable tool.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
