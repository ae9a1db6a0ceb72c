//! Fenced code block scanning.
//!
//! A fence opens on a line whose trimmed content starts with three backticks
//! and closes on the next such line. Everything the pipeline does to prose
//! (math protection, auto-wrapping) must leave fenced regions byte-for-byte
//! intact, and diagram extraction needs the exact block text for
//! substitution, so both are served from this one scanner.

use std::ops::Range;

/// Fence marker.
pub(crate) const FENCE: &str = "```";

/// A fenced block found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Info string after the opening marker (trimmed), e.g. `mermaid`.
    pub info: &'a str,
    /// Lines between the fences, without the newline before the closing fence.
    pub body: &'a str,
    /// Full block text from the opening marker line through the closing
    /// marker line (exclusive of the closing line's newline).
    pub raw: &'a str,
    /// Byte range of `raw` in the scanned text.
    pub range: Range<usize>,
    /// Whether a closing fence was found (unclosed blocks run to end of text).
    pub closed: bool,
}

impl FencedBlock<'_> {
    /// First word of the info string (the language tag).
    #[must_use]
    pub fn language(&self) -> &str {
        self.info.split_whitespace().next().unwrap_or("")
    }
}

/// Whether a line opens or closes a fence.
pub(crate) fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with(FENCE)
}

/// Find every fenced block in `text`, in document order.
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    // (line start, info) of the currently open fence
    let mut open: Option<(usize, &str)> = None;
    let mut body_start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.strip_suffix('\n').unwrap_or(line);

        if !is_fence_line(content) {
            continue;
        }

        match open.take() {
            None => {
                let info = content.trim_start()[FENCE.len()..].trim();
                open = Some((start, info));
                body_start = offset;
            }
            Some((open_start, info)) => {
                let end = start + content.len();
                // Body excludes the newline that precedes the closing fence
                let body_end = start.saturating_sub(1).max(body_start);
                blocks.push(FencedBlock {
                    info,
                    body: &text[body_start..body_end],
                    raw: &text[open_start..end],
                    range: open_start..end,
                    closed: true,
                });
            }
        }
    }

    if let Some((open_start, info)) = open {
        blocks.push(FencedBlock {
            info,
            body: &text[body_start.min(text.len())..],
            raw: &text[open_start..],
            range: open_start..text.len(),
            closed: false,
        });
    }

    blocks
}

/// Apply `f` to every region of `text` outside fenced blocks.
///
/// Fenced blocks (including unclosed ones) are copied through unchanged.
pub(crate) fn map_prose<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for block in fenced_blocks(text) {
        if block.range.start > cursor {
            out.push_str(&f(&text[cursor..block.range.start]));
        }
        out.push_str(block.raw);
        cursor = block.range.end;
    }
    if cursor < text.len() {
        out.push_str(&f(&text[cursor..]));
    }

    out
}
