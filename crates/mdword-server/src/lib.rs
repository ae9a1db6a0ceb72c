//! HTTP server for the mdword converter.
//!
//! This crate provides a native Rust HTTP server using axum, serving:
//! - the single-page editor with live preview
//! - the conversion API returning preview HTML and a DOCX download link
//! - generated documents and rendered diagram images
//! - a health endpoint reporting external tool availability
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use mdword_config::ToolsConfig;
//! use mdword_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_owned(),
//!         port: 5678,
//!         tools: ToolsConfig::default(),
//!         work_dir: PathBuf::from(".mdword/work"),
//!         auto_wrap: false,
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► Rust axum server (mdword-server)
//!                        │
//!                        ├─► POST /api/convert ──► spawn_blocking ──► Converter
//!                        │                                              │
//!                        │                              pandoc / mmdc ◄─┘
//!                        │
//!                        ├─► GET /api/download, /api/images ──► work directory
//!                        │
//!                        └─► GET / (embedded editor page)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;
mod static_files;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use mdword_config::ToolsConfig;
use mdword_core::{Converter, Toolchain, WorkDir};
use mdword_exec::SystemRunner;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// External tool locations and timeout.
    pub tools: ToolsConfig,
    /// Directory for diagrams and generated documents.
    pub work_dir: PathBuf,
    /// Wrap bare math notation before conversion.
    pub auto_wrap: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 5678,
            tools: ToolsConfig::default(),
            work_dir: PathBuf::from(".mdword/work"),
            auto_wrap: false,
        }
    }
}

/// Run the server.
///
/// Both external tools must be present; the server refuses to start
/// otherwise.
///
/// # Errors
///
/// Returns an error if a tool is missing, the work directory cannot be
/// created, or the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let toolchain = Toolchain::resolve(&config.tools)?;
    tracing::info!(
        pandoc = %toolchain.pandoc.display(),
        mermaid = %toolchain.mermaid.display(),
        "Toolchain resolved"
    );

    let work_dir = WorkDir::new(config.work_dir.clone());
    work_dir.ensure()?;

    let converter = Converter::new(&toolchain, work_dir, Arc::new(SystemRunner::new()))
        .auto_wrap(config.auto_wrap);

    let state = Arc::new(AppState {
        converter: Arc::new(converter),
        tools: config.tools.clone(),
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from mdword config.
#[must_use]
pub fn server_config_from_mdword_config(config: &mdword_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        tools: config.tools_resolved.clone(),
        work_dir: config.output_resolved.work_dir.clone(),
        auto_wrap: config.math.auto_wrap,
    }
}
