//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use mdword_config::ToolsConfig;
use mdword_core::{Converter, WorkDir};

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Conversion pipeline, shared with blocking tasks.
    pub(crate) converter: Arc<Converter>,
    /// Configured tool locations, probed by the health endpoint.
    pub(crate) tools: ToolsConfig,
}

impl AppState {
    /// Directory holding generated documents and diagram images.
    pub(crate) fn work_dir(&self) -> &WorkDir {
        self.converter.work_dir()
    }
}
