//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod convert;
pub(crate) mod serve;

use std::path::PathBuf;

use clap::Args;
use mdword_config::{CliSettings, Config};

pub(crate) use check::CheckArgs;
pub(crate) use convert::ConvertArgs;
pub(crate) use serve::ServeArgs;

use crate::error::CliError;

/// Configuration and tool overrides shared by all commands.
#[derive(Args, Debug, Default)]
pub(crate) struct ToolArgs {
    /// Path to configuration file (default: auto-discover mdword.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pandoc executable (overrides config).
    #[arg(long, env = "MDWORD_PANDOC")]
    pandoc: Option<PathBuf>,

    /// Mermaid CLI (`mmdc`) executable (overrides config).
    #[arg(long, env = "MDWORD_MERMAID")]
    mermaid: Option<PathBuf>,

    /// Directory for diagrams and generated documents (overrides config).
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

impl ToolArgs {
    /// Load configuration with these overrides plus any server overrides.
    pub(crate) fn load_config(
        &self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            host,
            port,
            pandoc: self.pandoc.clone(),
            mermaid: self.mermaid.clone(),
            work_dir: self.work_dir.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}
