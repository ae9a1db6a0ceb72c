//! Command descriptor and captured output.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Typed description of one external process invocation.
///
/// Built fluently; nothing is spawned until the spec is handed to a
/// [`CommandRunner`](crate::CommandRunner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable path or name.
    pub program: PathBuf,
    /// Arguments in order.
    pub args: Vec<OsString>,
    /// Working directory (`None` inherits the parent's).
    pub current_dir: Option<PathBuf>,
    /// Maximum wall-clock time before the child is killed.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    /// Create a spec for the given executable with no arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// File name of the executable, used as a short label in logs and errors.
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map_or_else(
                || self.program.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            )
    }

    /// Value following the first occurrence of `flag`, if any.
    ///
    /// Handy for callers (and mocks) that need to find e.g. the `-o` path.
    #[must_use]
    pub fn flag_value(&self, flag: &str) -> Option<&Path> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(Path::new)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (`None` if the process was terminated by a signal).
    pub exit_code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    #[must_use]
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_collects_args_in_order() {
        let spec = CommandSpec::new("/usr/bin/pandoc")
            .arg("in.md")
            .args(["-t", "docx"])
            .current_dir("/tmp")
            .timeout(Duration::from_secs(3));

        assert_eq!(
            spec.args,
            vec![
                OsString::from("in.md"),
                OsString::from("-t"),
                OsString::from("docx")
            ]
        );
        assert_eq!(spec.current_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(spec.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_program_name() {
        assert_eq!(CommandSpec::new("/opt/tools/mmdc").program_name(), "mmdc");
        assert_eq!(CommandSpec::new("pandoc").program_name(), "pandoc");
    }

    #[test]
    fn test_flag_value() {
        let spec = CommandSpec::new("mmdc").args(["-i", "a.mmd", "-o", "b.png"]);

        assert_eq!(spec.flag_value("-o"), Some(Path::new("b.png")));
        assert_eq!(spec.flag_value("-i"), Some(Path::new("a.mmd")));
        assert_eq!(spec.flag_value("-x"), None);
    }

    #[test]
    fn test_flag_value_missing_operand() {
        let spec = CommandSpec::new("mmdc").arg("-o");
        assert_eq!(spec.flag_value("-o"), None);
    }

    #[test]
    fn test_display_quotes_whitespace() {
        let spec = CommandSpec::new("pandoc").args(["my file.md", "-o", "out.docx"]);
        assert_eq!(spec.to_string(), "pandoc \"my file.md\" -o out.docx");
    }

    #[test]
    fn test_output_success() {
        assert!(CommandOutput::ok("").success());
        assert!(!CommandOutput::failed(2, "boom").success());
        assert!(
            !CommandOutput {
                exit_code: None,
                ..Default::default()
            }
            .success()
        );
    }
}
