//! CLI error types.

use mdword_config::ConfigError;
use mdword_core::{ConvertError, ToolchainError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Toolchain(#[from] ToolchainError),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Validation(String),
}
