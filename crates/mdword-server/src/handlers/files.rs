//! Generated file endpoints.
//!
//! Documents are served as attachments, diagram images inline. Both look
//! names up directly in the work directory; anything that is not a plain
//! file name is treated as missing.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /api/download/{filename}.
pub(crate) async fn download(
    Path(filename): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServerError> {
    let path = state
        .work_dir()
        .resolve_existing(&filename)
        .ok_or_else(|| ServerError::FileNotFound(filename.clone()))?;

    let content = tokio::fs::read(&path).await?;
    tracing::debug!(file = %filename, bytes = content.len(), "Serving download");

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&filename)),
            (header::CONTENT_DISPOSITION, attachment(&filename)),
        ],
        content,
    ))
}

/// Handle GET /api/images/{filename}.
pub(crate) async fn image(
    Path(filename): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServerError> {
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(ServerError::FileNotFound(filename));
    }

    let path = state
        .work_dir()
        .resolve_existing(&filename)
        .ok_or_else(|| ServerError::FileNotFound(filename.clone()))?;

    let content = tokio::fs::read(&path).await?;
    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "private, max-age=3600".to_owned()),
        ],
        content,
    ))
}

fn content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

/// `Content-Disposition` value with quotes stripped from the name.
fn attachment(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename.replace('"', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_docx_content_type() {
        assert_eq!(
            content_type("output_20250101_120000_abcd1234.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(content_type("unknown.zzz"), "application/octet-stream");
    }

    #[test]
    fn test_attachment_header() {
        assert_eq!(attachment("a.docx"), "attachment; filename=\"a.docx\"");
        assert_eq!(attachment("a\".docx"), "attachment; filename=\"a.docx\"");
    }
}
