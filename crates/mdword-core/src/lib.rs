//! Markdown to Word conversion pipeline.
//!
//! Turns author-written Markdown with LaTeX math and Mermaid diagrams into a
//! styled DOCX file and an HTML preview. The pipeline is a sequence of text
//! rewriting passes:
//!
//! 1. [`math`] cuts every math span out behind an opaque placeholder
//! 2. [`diagram`] renders Mermaid blocks and inlines images or warnings
//! 3. the text then branches:
//!    - [`document`] restores math and compiles a DOCX, then restyles it
//!    - [`preview`] projects the text to HTML, then math is restored into it
//!
//! [`Converter`] runs the whole sequence for one document.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mdword_core::{Converter, Toolchain, WorkDir};
//! use mdword_exec::SystemRunner;
//!
//! let toolchain = Toolchain::resolve(&config.tools_resolved)?;
//! let converter = Converter::new(
//!     &toolchain,
//!     WorkDir::new(".mdword/work"),
//!     Arc::new(SystemRunner::new()),
//! );
//! let result = converter.convert("# Title\n\nEuler: \\(e^{i\\pi} + 1 = 0\\)")?;
//! println!("{}", result.document_url);
//! ```

pub mod diagram;
pub mod document;
mod error;
mod fence;
pub mod math;
mod pipeline;
pub mod preview;
mod toolchain;
mod workdir;

pub use error::ConvertError;
pub use fence::{FencedBlock, fenced_blocks};
pub use pipeline::{ConversionResult, Converter, DOWNLOAD_URL_PREFIX, IMAGE_URL_PREFIX};
pub use preview::PreviewRenderer;
pub use toolchain::{ToolAvailability, Toolchain, ToolchainError};
pub use workdir::{WorkDir, unique_name};
