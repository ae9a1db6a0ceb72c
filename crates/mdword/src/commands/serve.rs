//! `mdword serve` command implementation.

use clap::Args;
use mdword_core::Toolchain;
use mdword_server::{run_server, server_config_from_mdword_config};

use super::ToolArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    tools: ToolArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (log every conversion stage).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, a tool is missing or the
    /// server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.tools.load_config(self.host, self.port)?;

        // Fail before binding if a compiler is missing
        let toolchain = Toolchain::resolve(&config.tools_resolved)?;

        output.highlight(&format!(
            "Starting server on http://{}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!("Pandoc: {}", toolchain.pandoc.display()));
        output.info(&format!("Mermaid CLI: {}", toolchain.mermaid.display()));
        output.info(&format!(
            "Work directory: {}",
            config.output_resolved.work_dir.display()
        ));
        if config.math.auto_wrap {
            output.info("Math auto-wrap: enabled");
        }

        let server_config = server_config_from_mdword_config(&config);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
