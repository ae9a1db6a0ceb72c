//! End-to-end conversion of one Markdown document.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use mdword_exec::CommandRunner;

use crate::diagram::{DiagramRenderer, inline_diagrams};
use crate::document::DocumentConverter;
use crate::error::ConvertError;
use crate::math::MathProtector;
use crate::preview::{PreviewRenderer, restore_math};
use crate::toolchain::Toolchain;
use crate::workdir::WorkDir;

/// URL prefix under which generated documents are downloadable.
pub const DOWNLOAD_URL_PREFIX: &str = "/api/download/";

/// URL prefix under which rendered diagram images are served.
pub const IMAGE_URL_PREFIX: &str = "/api/images/";

/// Output of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Styled preview HTML with math in its original notation.
    pub preview_html: String,
    /// Download URL of the generated document.
    pub document_url: String,
    /// Download URL of a PDF rendition (never produced).
    pub pdf_url: Option<String>,
    /// Generated document on disk.
    pub document_path: PathBuf,
}

/// Markdown to DOCX and preview converter.
///
/// One instance serves any number of conversions, including concurrent ones:
/// every conversion owns its math spans, and artifacts in the shared work
/// directory carry unique names.
pub struct Converter {
    protector: MathProtector,
    diagrams: DiagramRenderer,
    document: DocumentConverter,
    preview: PreviewRenderer,
    work_dir: WorkDir,
}

impl Converter {
    /// Create a converter using `toolchain`, writing into `work_dir`.
    #[must_use]
    pub fn new(toolchain: &Toolchain, work_dir: WorkDir, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            protector: MathProtector::new(),
            diagrams: DiagramRenderer::new(toolchain, work_dir.clone(), Arc::clone(&runner)),
            document: DocumentConverter::new(toolchain, work_dir.clone(), runner),
            preview: PreviewRenderer::new().image_base_url(IMAGE_URL_PREFIX),
            work_dir,
        }
    }

    /// Enable wrapping of bare math notation before protection.
    #[must_use]
    pub fn auto_wrap(mut self, enabled: bool) -> Self {
        self.protector = self.protector.auto_wrap(enabled);
        self
    }

    /// Work directory holding generated artifacts.
    #[must_use]
    pub fn work_dir(&self) -> &WorkDir {
        &self.work_dir
    }

    /// Convert `markdown` to a styled DOCX and a preview.
    ///
    /// Stages: protect math, render and inline diagrams, then on independent
    /// copies compile the document and project the preview. Diagram failures
    /// are shown in the output and never fail the conversion.
    ///
    /// # Errors
    ///
    /// - [`ConvertError::EmptyInput`] for empty or whitespace-only input,
    ///   before any process runs
    /// - any document compilation error
    pub fn convert(&self, markdown: &str) -> Result<ConversionResult, ConvertError> {
        let markdown = normalize_newlines(markdown);
        if markdown.trim().is_empty() {
            return Err(ConvertError::EmptyInput);
        }

        let started = Instant::now();
        self.work_dir.ensure()?;

        let protected = self.protector.protect(&markdown);
        tracing::debug!(spans = protected.spans.len(), "Math protected");

        let results = self.diagrams.render(&protected.text);
        let text = inline_diagrams(&protected.text, &results);
        let failed = results.values().filter(|r| r.image().is_none()).count();
        tracing::debug!(diagrams = results.len(), failed, "Diagrams inlined");

        let document_path = self.document.compile(&text, &protected.spans)?;
        let preview_html = restore_math(&self.preview.to_html(&text), &protected.spans);

        let file_name = document_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::info!(
            document = %file_name,
            diagrams = results.len(),
            failed_diagrams = failed,
            elapsed_ms = started.elapsed().as_millis(),
            "Conversion completed"
        );

        Ok(ConversionResult {
            preview_html,
            document_url: format!("{DOWNLOAD_URL_PREFIX}{file_name}"),
            pdf_url: None,
            document_path,
        })
    }
}

/// Convert `\r\n` and lone `\r` line endings to `\n`.
fn normalize_newlines(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_owned()
    }
}
