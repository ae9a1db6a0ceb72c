//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/convert", post(handlers::convert::convert))
        .route("/api/download/{filename}", get(handlers::files::download))
        .route("/api/images/{filename}", get(handlers::files::image))
        .route("/api/health", get(handlers::health::health));

    Router::new()
        .merge(api_routes)
        .merge(static_files::static_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::path::PathBuf;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use mdword_config::ToolsConfig;
    use mdword_core::{Converter, Toolchain, WorkDir};
    use mdword_exec::{CommandOutput, CommandSpec, ExecError, MockRunner};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p/><w:sectPr/></w:body></w:document>"#;

    fn docx() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in [("word/styles.xml", STYLES), ("word/document.xml", DOCUMENT)] {
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// `pandoc` writes a DOCX unless the input mentions `fail`; `mmdc`
    /// writes a PNG.
    fn handler(spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        match spec.program_name().as_str() {
            "pandoc" => {
                let dir = spec.current_dir.clone().unwrap();
                let input = std::fs::read_to_string(dir.join(&spec.args[0]))?;
                if input.contains("fail") {
                    return Ok(CommandOutput::failed(64, "pandoc: could not parse input"));
                }
                std::fs::write(dir.join(spec.flag_value("-o").unwrap()), docx())?;
                Ok(CommandOutput::ok(""))
            }
            "mmdc" => {
                std::fs::write(spec.flag_value("-o").unwrap(), b"\x89PNG")?;
                Ok(CommandOutput::ok(""))
            }
            other => panic!("unexpected program {other}"),
        }
    }

    struct Fixture {
        temp: TempDir,
        runner: Arc<MockRunner>,
        router: Router,
    }

    impl Fixture {
        /// Router over a temp work dir; `installed` tools exist on disk.
        fn new(installed: &[&str]) -> Self {
            let temp = TempDir::new().unwrap();
            let bin = temp.path().join("bin");
            std::fs::create_dir_all(&bin).unwrap();
            for tool in installed {
                std::fs::write(bin.join(tool), b"").unwrap();
            }

            let tools = ToolsConfig {
                pandoc: bin.join("pandoc"),
                mermaid: bin.join("mmdc"),
                timeout: Duration::from_secs(5),
            };
            let runner = Arc::new(MockRunner::new().with_handler(handler));
            let converter = Converter::new(
                &Toolchain::unchecked(&tools),
                WorkDir::new(temp.path().join("work")),
                runner.clone(),
            );
            let state = Arc::new(AppState {
                converter: Arc::new(converter),
                tools,
            });

            Self {
                temp,
                runner,
                router: create_router(state),
            }
        }

        fn work_dir(&self) -> PathBuf {
            self.temp.path().join("work")
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn post_json(&self, uri: &str, body: &str) -> Response {
            let request = Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_owned()))
                .unwrap();
            self.send(request).await
        }
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn header_value<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
        response.headers()[name].to_str().unwrap()
    }

    fn file_name(url: &str) -> &str {
        url.rsplit('/').next().unwrap()
    }

    #[tokio::test]
    async fn test_convert_returns_preview_and_download() {
        let fixture = Fixture::new(&["pandoc", "mmdc"]);

        let response = fixture
            .post_json(
                "/api/convert",
                r##"{"markdown": "# Title\n\nEuler \\(e^{i\\pi}\\)\n\n```mermaid\nA-->B\n```"}"##,
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        let html = body["html"].as_str().unwrap();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains(r"Euler \(e^{i\pi}\)"));
        assert!(html.contains(r#"<img src="/api/images/diagram_"#));
        assert!(body["pdfUrl"].is_null());

        let docx_url = body["docxUrl"].as_str().unwrap();
        assert!(docx_url.starts_with("/api/download/output_"));
        assert!(fixture.work_dir().join(file_name(docx_url)).is_file());
    }

    #[tokio::test]
    async fn test_convert_empty_input_is_bad_request() {
        let fixture = Fixture::new(&["pandoc", "mmdc"]);

        for body in [r#"{"markdown": "  \n "}"#, "{}"] {
            let response = fixture.post_json("/api/convert", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json(response).await["error"], "Markdown content is empty");
        }
        assert!(fixture.runner.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_convert_malformed_body_is_bad_request() {
        let fixture = Fixture::new(&["pandoc", "mmdc"]);

        let response = fixture.post_json("/api/convert", "{not json").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_convert_compile_failure_is_server_error() {
        let fixture = Fixture::new(&["pandoc", "mmdc"]);

        let response = fixture
            .post_json("/api/convert", r#"{"markdown": "this will fail"}"#)
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error = json(response).await["error"].as_str().unwrap().to_owned();
        assert!(error.contains("pandoc: could not parse input"));
    }

    #[tokio::test]
    async fn test_download_serves_attachment() {
        let fixture = Fixture::new(&["pandoc", "mmdc"]);
        let body = json(
            fixture
                .post_json("/api/convert", r#"{"markdown": "hello"}"#)
                .await,
        )
        .await;
        let docx_url = body["docxUrl"].as_str().unwrap();

        let response = fixture.get(docx_url).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_value(&response, header::CONTENT_TYPE),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(
            header_value(&response, header::CONTENT_DISPOSITION),
            format!("attachment; filename=\"{}\"", file_name(docx_url))
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_download_unknown_file_is_not_found() {
        let fixture = Fixture::new(&["pandoc", "mmdc"]);
        std::fs::create_dir_all(fixture.work_dir()).unwrap();

        let response = fixture.get("/api/download/missing.docx").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert_eq!(body["error"], "File not found");
        assert_eq!(body["filename"], "missing.docx");
    }

    #[tokio::test]
    async fn test_download_rejects_traversal() {
        let fixture = Fixture::new(&["pandoc", "mmdc"]);
        std::fs::create_dir_all(fixture.work_dir()).unwrap();
        std::fs::write(fixture.temp.path().join("secret.txt"), b"secret").unwrap();

        for uri in [
            "/api/download/..%2Fsecret.txt",
            "/api/download/..",
            "/api/download/%2Fetc%2Fpasswd",
        ] {
            let response = fixture.get(uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_image_served_inline() {
        let fixture = Fixture::new(&["pandoc", "mmdc"]);
        std::fs::create_dir_all(fixture.work_dir()).unwrap();
        std::fs::write(fixture.work_dir().join("diagram_1.png"), b"\x89PNG").unwrap();
        std::fs::write(fixture.work_dir().join("notes.md"), b"text").unwrap();

        let response = fixture.get("/api/images/diagram_1.png").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_value(&response, header::CONTENT_TYPE), "image/png");

        let response = fixture.get("/api/images/notes.md").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_reports_tools() {
        let fixture = Fixture::new(&["pandoc"]);

        let response = fixture.get("/api/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json(response).await,
            serde_json::json!({
                "status": "ok",
                "pandocAvailable": true,
                "mermaidAvailable": false,
            })
        );
    }

    #[tokio::test]
    async fn test_index_page_with_security_headers() {
        let fixture = Fixture::new(&[]);

        let response = fixture.get("/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(header_value(&response, header::CONTENT_TYPE).starts_with("text/html"));
        assert_eq!(header_value(&response, header::X_CONTENT_TYPE_OPTIONS), "nosniff");
        assert_eq!(header_value(&response, header::X_FRAME_OPTIONS), "DENY");
        assert!(
            header_value(&response, header::CONTENT_SECURITY_POLICY)
                .contains("https://cdn.jsdelivr.net")
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let fixture = Fixture::new(&[]);

        let response = fixture.get("/nope").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
