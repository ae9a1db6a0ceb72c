//! Mermaid diagram rendering and inlining.
//!
//! Diagram blocks are fenced blocks tagged `mermaid`. A block is identified by
//! its source text, not its position: identical blocks render once and share
//! the resulting image.
//!
//! - [`DiagramRenderer`] compiles each distinct source to a PNG in the work
//!   directory.
//! - [`inline_diagrams`] swaps every block for an image reference or, when
//!   rendering failed, a visible warning with the source kept in a plain fence.

mod inline;
mod render;

use std::collections::HashMap;
use std::path::PathBuf;

pub use inline::inline_diagrams;
pub use render::{DiagramError, DiagramRenderer};

use crate::fence::{FencedBlock, fenced_blocks};

/// Language tag marking a diagram block.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

/// Outcome of rendering one diagram source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramOutcome {
    /// Rendered image in the work directory.
    Rendered(PathBuf),
    /// Rendering failed; the message is for logs only.
    Failed(String),
}

impl DiagramOutcome {
    /// Rendered image path, if any.
    #[must_use]
    pub fn image(&self) -> Option<&PathBuf> {
        match self {
            Self::Rendered(path) => Some(path),
            Self::Failed(_) => None,
        }
    }
}

/// Rendering outcome per distinct diagram source.
pub type DiagramResults = HashMap<String, DiagramOutcome>;

/// Closed fenced blocks tagged as diagrams, in document order.
pub(crate) fn diagram_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    fenced_blocks(text)
        .into_iter()
        .filter(|block| block.closed && block.language() == DIAGRAM_LANGUAGE)
        .collect()
}
