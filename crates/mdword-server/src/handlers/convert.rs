//! Conversion API endpoint.
//!
//! Runs the whole pipeline for one document and returns the preview HTML
//! together with the download link of the generated DOCX.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

/// Request body for POST /api/convert.
#[derive(Deserialize)]
pub(crate) struct ConvertRequest {
    /// Markdown source. A missing field is treated as empty input.
    #[serde(default)]
    markdown: String,
}

/// Response for POST /api/convert.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConvertResponse {
    /// Styled preview HTML.
    html: String,
    /// Download URL of the generated document.
    docx_url: String,
    /// Always `null`; PDF export is not produced.
    pdf_url: Option<String>,
}

/// Handle POST /api/convert.
///
/// The pipeline blocks on external processes, so it runs on the blocking
/// thread pool.
pub(crate) async fn convert(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<ConvertResponse>, ServerError> {
    let Json(request) = payload.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;

    let converter = Arc::clone(&state.converter);
    let result = tokio::task::spawn_blocking(move || converter.convert(&request.markdown))
        .await??;

    Ok(Json(ConvertResponse {
        html: result.preview_html,
        docx_url: result.document_url,
        pdf_url: result.pdf_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_convert_response_serialization() {
        let response = ConvertResponse {
            html: "<p>x</p>".to_owned(),
            docx_url: "/api/download/output_1.docx".to_owned(),
            pdf_url: None,
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["html"], "<p>x</p>");
        assert_eq!(json["docxUrl"], "/api/download/output_1.docx");
        assert!(json["pdfUrl"].is_null());
        assert!(json.as_object().unwrap().contains_key("pdfUrl"));
    }

    #[test]
    fn test_convert_request_missing_markdown_is_empty() {
        let request: ConvertRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.markdown, "");
    }
}
