//! Parallel diagram compilation through the external diagram compiler.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mdword_exec::{CommandRunner, CommandSpec, ExecError};
use rayon::prelude::*;

use super::{DiagramOutcome, DiagramResults, diagram_blocks};
use crate::toolchain::Toolchain;
use crate::workdir::WorkDir;

/// Maximum stderr characters kept in a failure message.
const STDERR_EXCERPT: usize = 500;

/// Error rendering a single diagram.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    /// Writing the diagram source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Compiler could not be run or timed out.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Compiler exited with a failure status.
    #[error("diagram compiler exited with {}: {stderr}", exit_code.map_or_else(|| "signal".to_owned(), |c| c.to_string()))]
    Compiler {
        /// Exit code (`None` if killed by a signal).
        exit_code: Option<i32>,
        /// Excerpt of standard error.
        stderr: String,
    },

    /// Compiler exited successfully but wrote no image.
    #[error("diagram compiler produced no image at {}", .0.display())]
    MissingImage(PathBuf),
}

/// Renders diagram blocks to PNG images.
pub struct DiagramRenderer {
    mermaid: PathBuf,
    timeout: Duration,
    work_dir: WorkDir,
    runner: Arc<dyn CommandRunner>,
}

impl DiagramRenderer {
    /// Create a renderer writing into `work_dir`.
    #[must_use]
    pub fn new(toolchain: &Toolchain, work_dir: WorkDir, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            mermaid: toolchain.mermaid.clone(),
            timeout: toolchain.timeout,
            work_dir,
            runner,
        }
    }

    /// Render every distinct diagram source in `text`.
    ///
    /// Sources render in parallel on the global rayon pool. A failing source
    /// is recorded as [`DiagramOutcome::Failed`] and never affects the others.
    #[must_use]
    pub fn render(&self, text: &str) -> DiagramResults {
        let mut seen = HashSet::new();
        let sources: Vec<&str> = diagram_blocks(text)
            .into_iter()
            .map(|block| block.body)
            .filter(|body| seen.insert(*body))
            .collect();

        if sources.is_empty() {
            return DiagramResults::new();
        }

        tracing::debug!(count = sources.len(), "Rendering diagrams");

        sources
            .par_iter()
            .map(|source| ((*source).to_owned(), self.render_one(source)))
            .collect()
    }

    fn render_one(&self, source: &str) -> DiagramOutcome {
        match self.try_render(source) {
            Ok(path) => {
                tracing::debug!(image = %path.display(), "Diagram rendered");
                DiagramOutcome::Rendered(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Diagram rendering failed");
                DiagramOutcome::Failed(e.to_string())
            }
        }
    }

    fn try_render(&self, source: &str) -> Result<PathBuf, DiagramError> {
        let mut source_file = tempfile::Builder::new()
            .prefix("diagram_")
            .suffix(".mmd")
            .tempfile_in(self.work_dir.path())?;
        source_file.write_all(source.as_bytes())?;
        source_file.flush()?;

        let image = self.work_dir.unique_path("diagram", "png");
        let spec = CommandSpec::new(&self.mermaid)
            .arg("-i")
            .arg(source_file.path())
            .arg("-o")
            .arg(&image)
            .timeout(self.timeout);

        let output = self.runner.run(&spec)?;
        if !output.success() {
            return Err(DiagramError::Compiler {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().chars().take(STDERR_EXCERPT).collect(),
            });
        }
        if !image.is_file() {
            return Err(DiagramError::MissingImage(image));
        }

        Ok(image)
    }
}
