//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use mdword_core::{ToolAvailability, Toolchain};
use serde::Serialize;

use crate::state::AppState;

/// Response for GET /api/health.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HealthResponse {
    /// Always `"ok"` while the server answers.
    status: &'static str,
    /// Whether the document compiler is present.
    pandoc_available: bool,
    /// Whether the diagram compiler is present.
    mermaid_available: bool,
}

impl From<&ToolAvailability> for HealthResponse {
    fn from(tools: &ToolAvailability) -> Self {
        Self {
            status: "ok",
            pandoc_available: tools.pandoc_available(),
            mermaid_available: tools.mermaid_available(),
        }
    }
}

/// Handle GET /api/health.
///
/// Availability is a filesystem presence check, re-run on every request.
pub(crate) async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let tools = Toolchain::probe(&state.tools);
    Json(HealthResponse::from(&tools))
}
