//! Mock runner implementation for testing.
//!
//! Provides [`MockRunner`] for unit testing without spawning processes.

use std::sync::RwLock;

use crate::command::{CommandOutput, CommandSpec};
use crate::runner::{CommandRunner, ExecError};

type Handler = Box<dyn Fn(&CommandSpec) -> Result<CommandOutput, ExecError> + Send + Sync>;

/// Mock runner for testing.
///
/// Records every command it is asked to run and answers through a handler.
/// The default handler reports success with empty output.
///
/// # Example
///
/// ```ignore
/// use mdword_exec::{CommandOutput, CommandRunner, CommandSpec, MockRunner};
///
/// let runner = MockRunner::new()
///     .with_handler(|_| Ok(CommandOutput::failed(1, "syntax error")));
///
/// let output = runner.run(&CommandSpec::new("mmdc")).unwrap();
/// assert!(!output.success());
/// assert_eq!(runner.invocation_count("mmdc"), 1);
/// ```
pub struct MockRunner {
    handler: Handler,
    invocations: RwLock<Vec<CommandSpec>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self {
            handler: Box::new(|_| Ok(CommandOutput::ok(""))),
            invocations: RwLock::new(Vec::new()),
        }
    }
}

impl std::fmt::Debug for MockRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRunner")
            .field("invocations", &self.invocations)
            .finish_non_exhaustive()
    }
}

impl MockRunner {
    /// Create a mock runner where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the handler that produces results.
    #[must_use]
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CommandSpec) -> Result<CommandOutput, ExecError> + Send + Sync + 'static,
    {
        self.handler = Box::new(handler);
        self
    }

    /// All commands run so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.read().unwrap().clone()
    }

    /// Number of commands run whose executable name is `program`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn invocation_count(&self, program: &str) -> usize {
        self.invocations
            .read()
            .unwrap()
            .iter()
            .filter(|spec| spec.program_name() == program)
            .count()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        self.invocations.write().unwrap().push(spec.clone());
        (self.handler)(spec)
    }
}
