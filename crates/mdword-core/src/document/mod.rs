//! Word document compilation.

mod style;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mdword_exec::{CommandRunner, CommandSpec};

pub use style::{DocumentStyle, PageMargins, StyleError};

use crate::error::ConvertError;
use crate::math::{self, MathSpan};
use crate::toolchain::Toolchain;
use crate::workdir::WorkDir;

/// Input format: Markdown with `$...$` and `\(...\)` math.
const INPUT_FORMAT: &str = "markdown+tex_math_dollars+tex_math_single_backslash";

/// Compiles Markdown to DOCX through the external document compiler.
pub struct DocumentConverter {
    pandoc: PathBuf,
    timeout: Duration,
    work_dir: WorkDir,
    runner: Arc<dyn CommandRunner>,
    style: DocumentStyle,
}

impl DocumentConverter {
    /// Create a converter writing into `work_dir`.
    #[must_use]
    pub fn new(toolchain: &Toolchain, work_dir: WorkDir, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            pandoc: toolchain.pandoc.clone(),
            timeout: toolchain.timeout,
            work_dir,
            runner,
            style: DocumentStyle::default(),
        }
    }

    /// Compile `text` to a styled DOCX in the work directory.
    ///
    /// Math placeholders in `text` are restored from `spans` first. Image
    /// references resolve against the work directory. The intermediate
    /// Markdown file is removed on every exit path.
    ///
    /// # Errors
    ///
    /// - [`ConvertError::DocumentCompile`] with the compiler's stderr if it
    ///   exits with a failure status
    /// - [`ConvertError::Exec`] if it cannot be started or times out
    /// - [`ConvertError::Style`] if the produced file cannot be restyled
    pub fn compile(&self, text: &str, spans: &[MathSpan]) -> Result<PathBuf, ConvertError> {
        let markdown = math::restore(text, spans);

        let mut input = tempfile::Builder::new()
            .prefix("input_")
            .suffix(".md")
            .tempfile_in(self.work_dir.path())?;
        input.write_all(markdown.as_bytes())?;
        input.flush()?;

        let output = self.work_dir.unique_path("output", "docx");
        // The compiler runs inside the work directory, so both files are
        // passed by name.
        let spec = CommandSpec::new(&self.pandoc)
            .arg(file_name(input.path()))
            .args(["-f", INPUT_FORMAT, "-t", "docx", "-o"])
            .arg(file_name(&output))
            .current_dir(self.work_dir.path())
            .timeout(self.timeout);

        let result = self.runner.run(&spec)?;
        if !result.success() {
            let diagnostics = if result.stderr.trim().is_empty() {
                format!("{} exited with status {:?}", spec.program_name(), result.exit_code)
            } else {
                result.stderr
            };
            return Err(ConvertError::DocumentCompile { diagnostics });
        }
        if !output.is_file() {
            return Err(ConvertError::MissingOutput(output));
        }

        self.style.apply(&output)?;
        tracing::debug!(output = %output.display(), "Document compiled");
        Ok(output)
    }
}

fn file_name(path: &std::path::Path) -> std::ffi::OsString {
    path.file_name()
        .map_or_else(|| path.as_os_str().to_owned(), ToOwned::to_owned)
}
