//! mdword CLI - Markdown to Word converter.
//!
//! Provides commands for:
//! - `serve`: Start the editor and conversion server
//! - `convert`: Convert one Markdown file to DOCX
//! - `check`: Report whether pandoc and the Mermaid CLI are installed

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, ConvertArgs, ServeArgs};
use error::CliError;
use output::Output;

/// mdword - Markdown to Word converter.
#[derive(Parser)]
#[command(name = "mdword", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the editor and conversion server.
    Serve(ServeArgs),
    /// Convert a Markdown file to DOCX.
    Convert(ConvertArgs),
    /// Check that the external tools are installed.
    Check(CheckArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Serve(args) => args.verbose,
            Self::Convert(args) => args.verbose,
            Self::Check(_) => false,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute())),
        Commands::Convert(args) => args.execute(),
        Commands::Check(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
