//! External process execution for mdword.
//!
//! The conversion pipeline drives two external compilers (a document compiler
//! and a diagram compiler). This crate models each invocation as a typed
//! [`CommandSpec`] and runs it through the [`CommandRunner`] trait, which
//! enables:
//!
//! - **Unit testing** of the pipeline without spawning real processes
//! - **Uniform timeouts** for every child process
//! - **Captured diagnostics** (stdout, stderr, exit status) for error reporting
//!
//! # Architecture
//!
//! The crate provides:
//! - [`CommandSpec`] describing executable, arguments, working directory and timeout
//! - [`CommandRunner`] trait with a single `run()` method
//! - [`SystemRunner`] spawning real child processes with deadline enforcement
//! - [`MockRunner`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use mdword_exec::{CommandRunner, CommandSpec, SystemRunner};
//!
//! let spec = CommandSpec::new("pandoc")
//!     .arg("--version")
//!     .timeout(Duration::from_secs(5));
//! let output = SystemRunner::new().run(&spec)?;
//! assert!(output.success());
//! ```

mod command;
#[cfg(feature = "mock")]
mod mock;
mod runner;
mod system;

pub use command::{CommandOutput, CommandSpec};
#[cfg(feature = "mock")]
pub use mock::MockRunner;
pub use runner::{CommandRunner, ExecError};
pub use system::SystemRunner;
