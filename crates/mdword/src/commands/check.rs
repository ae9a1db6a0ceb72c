//! `mdword check` command implementation.

use clap::Args;
use mdword_core::Toolchain;

use super::ToolArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    tools: ToolArgs,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or a tool is missing.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.tools.load_config(None, None)?;
        let tools = &config.tools_resolved;
        let availability = Toolchain::probe(tools);

        for (name, configured, found) in [
            ("pandoc", &tools.pandoc, &availability.pandoc),
            ("mermaid", &tools.mermaid, &availability.mermaid),
        ] {
            match found {
                Some(path) => output.success(&format!("{name}: {}", path.display())),
                None => output.error(&format!("{name}: not found ({})", configured.display())),
            }
        }

        if availability.all_available() {
            Ok(())
        } else {
            Err(CliError::Validation(
                "Required external tools are missing".to_owned(),
            ))
        }
    }
}
