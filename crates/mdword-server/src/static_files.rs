//! Static file serving.
//!
//! The editor is a single self-contained page embedded in the binary.
//! Anything outside the API and the page itself is a 404.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;

use crate::state::AppState;

/// Editor page with live preview.
const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Create router for the editor page with a not-found fallback.
pub(crate) fn static_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .fallback(not_found)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({"error": "Not found"})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_html_embedded() {
        assert!(INDEX_HTML.contains("/api/convert"));
        assert!(INDEX_HTML.contains("cdn.jsdelivr.net/npm/mathjax"));
    }
}
