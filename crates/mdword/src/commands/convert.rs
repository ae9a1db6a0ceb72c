//! `mdword convert` command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use mdword_core::{Converter, Toolchain, WorkDir};
use mdword_exec::SystemRunner;

use super::ToolArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Markdown file to convert.
    input: PathBuf,

    /// Output DOCX path (default: input path with a `.docx` extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the preview HTML to this file.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Wrap bare math notation (Greek letters, subscripts) before converting.
    #[arg(long)]
    auto_wrap: bool,

    #[command(flatten)]
    tools: ToolArgs,

    /// Enable verbose output (log every conversion stage).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, a tool is missing or the
    /// conversion fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.tools.load_config(None, None)?;
        let toolchain = Toolchain::resolve(&config.tools_resolved)?;

        let markdown = std::fs::read_to_string(&self.input)?;
        let converter = Converter::new(
            &toolchain,
            WorkDir::new(config.output_resolved.work_dir.clone()),
            Arc::new(SystemRunner::new()),
        )
        .auto_wrap(self.auto_wrap || config.math.auto_wrap);

        output.info(&format!("Converting {}", self.input.display()));
        let result = converter.convert(&markdown)?;

        let target = self
            .output
            .unwrap_or_else(|| default_output_path(&self.input));
        std::fs::copy(&result.document_path, &target)?;
        output.success(&format!("Wrote {}", target.display()));

        if let Some(html) = self.html {
            std::fs::write(&html, &result.preview_html)?;
            output.success(&format!("Wrote {}", html.display()));
        }

        Ok(())
    }
}

/// `notes/paper.md` becomes `notes/paper.docx`.
fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("docx")
}
