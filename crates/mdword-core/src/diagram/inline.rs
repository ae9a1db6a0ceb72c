//! Replacement of diagram blocks with their rendered form.

use super::{DiagramOutcome, DiagramResults, diagram_blocks};
use crate::fence::FENCE;

/// Alt text of inlined diagram images.
const IMAGE_ALT: &str = "mermaid diagram";

/// Warning shown in place of a diagram that failed to render.
const FAILURE_NOTICE: &str = "> ⚠️ Mermaid diagram failed to render";

/// Replace every diagram block in `text` according to `results`.
///
/// Rendered blocks become an image reference to the image's file name;
/// failed blocks become a warning line followed by the source in a plain
/// fence. Blocks with no entry in `results` are kept as they are.
#[must_use]
pub fn inline_diagrams(text: &str, results: &DiagramResults) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for block in diagram_blocks(text) {
        let Some(outcome) = results.get(block.body) else {
            continue;
        };
        out.push_str(&text[cursor..block.range.start]);
        out.push_str(&replacement(block.body, outcome));
        cursor = block.range.end;
    }
    out.push_str(&text[cursor..]);

    out
}

fn replacement(source: &str, outcome: &DiagramOutcome) -> String {
    match outcome {
        DiagramOutcome::Rendered(image) => {
            let name = image
                .file_name()
                .map_or_else(|| image.to_string_lossy(), |n| n.to_string_lossy());
            format!("![{IMAGE_ALT}]({name})\n")
        }
        DiagramOutcome::Failed(_) => format!("{FAILURE_NOTICE}\n{FENCE}\n{source}\n{FENCE}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn rendered(source: &str, image: &str) -> DiagramResults {
        DiagramResults::from([(
            source.to_owned(),
            DiagramOutcome::Rendered(PathBuf::from(image)),
        )])
    }

    #[test]
    fn test_rendered_block_becomes_image() {
        let text = "# Flow\n```mermaid\nA-->B\n```\nafter";
        let results = rendered("A-->B", "/work/diagram_1_abcd1234.png");

        assert_eq!(
            inline_diagrams(text, &results),
            "# Flow\n![mermaid diagram](diagram_1_abcd1234.png)\n\nafter"
        );
    }

    #[test]
    fn test_identical_blocks_both_replaced() {
        let text = "```mermaid\nA-->B\n```\nmid\n```mermaid\nA-->B\n```";
        let results = rendered("A-->B", "/w/x.png");

        let out = inline_diagrams(text, &results);

        assert_eq!(out.matches("![mermaid diagram](x.png)").count(), 2);
        assert!(!out.contains("```"));
    }

    #[test]
    fn test_failed_block_keeps_source() {
        let text = "intro\n\n```mermaid\ngraph TD\n  A-->\n```\n\n## Next\n";
        let results = DiagramResults::from([(
            "graph TD\n  A-->".to_owned(),
            DiagramOutcome::Failed("parse error".to_owned()),
        )]);

        assert_eq!(
            inline_diagrams(text, &results),
            "intro\n\n> ⚠️ Mermaid diagram failed to render\n```\ngraph TD\n  A-->\n```\n\n\n## Next\n"
        );
    }

    #[test]
    fn test_other_blocks_untouched() {
        let text = "```rust\nA-->B\n```\n```mermaid\nC\n```";
        let results = rendered("A-->B", "/w/x.png");

        assert_eq!(inline_diagrams(text, &results), text);
    }
}
