//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mdword_core::ConvertError;
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// Request body could not be read as a conversion request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No generated file with the given name.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Conversion pipeline failure.
    #[error("{0}")]
    Convert(#[from] ConvertError),

    /// Blocking conversion task panicked or was cancelled.
    #[error("Conversion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::Convert(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Convert(_) | Self::Task(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = match &self {
            Self::FileNotFound(name) => json!({"error": "File not found", "filename": name}),
            _ => json!({"error": self.to_string()}),
        };

        (status, axum::Json(body)).into_response()
    }
}
