//! Conversion error types.

use mdword_exec::ExecError;

use crate::document::StyleError;

/// Error converting a Markdown document.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Input was empty or whitespace only.
    #[error("Markdown content is empty")]
    EmptyInput,

    /// Document compiler exited with a failure status.
    #[error("Document compilation failed: {diagnostics}")]
    DocumentCompile {
        /// Compiler standard error, verbatim.
        diagnostics: String,
    },

    /// Document compiler reported success but wrote no output file.
    #[error("Document compiler produced no output at {0}")]
    MissingOutput(std::path::PathBuf),

    /// External process could not be run or timed out.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Applying document styles failed.
    #[error("Failed to apply document styles: {0}")]
    Style(#[from] StyleError),

    /// Filesystem error in the work directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Whether the error is the caller's fault rather than the system's.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}
