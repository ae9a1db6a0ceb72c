//! Line-oriented Markdown to HTML projection for the live preview.
//!
//! The projector is deliberately shallow. It handles what the preview needs
//! to look right (headings, emphasis, code, tables, blockquotes, images,
//! display math blocks) and passes everything else through as paragraphs.
//! Math placeholders are opaque single-line tokens here; callers put them
//! back with [`restore_math`], which escapes them for HTML.
//!
//! Paragraph text is not escaped, so inline HTML written by the author is
//! kept. Code blocks and code spans are escaped.

mod inline;
mod table;

use std::sync::LazyLock;

use regex::Regex;

use self::inline::{escape_html, render_inline};
use self::table::{CELL_SEPARATOR, render_table};
use crate::fence::{FENCE, is_fence_line};
use crate::math::{MathSpan, restore_with};

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6}) +(.*?)\s*$").expect("invalid heading regex"));

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^!\[(?P<alt>[^\]]*)\]\((?P<src>[^)\s]+)\)$").expect("invalid image regex")
});

const CONTAINER_OPEN: &str =
    r#"<div style="font-family: 'Microsoft YaHei', sans-serif; line-height: 1.6; padding: 20px;">"#;

const STYLESHEET: &str = "<style>
h1, h2, h3, h4, h5, h6 { color: #333; margin-top: 20px; }
code { background-color: #f4f4f4; padding: 2px 6px; border-radius: 3px; }
pre { background-color: #f4f4f4; padding: 10px; border-radius: 5px; overflow-x: auto; }
pre code { padding: 0; }
blockquote { border-left: 4px solid #ddd; margin-left: 0; padding-left: 10px; color: #666; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
img { max-width: 100%; height: auto; }
</style>";

/// Display math delimiters accepted on their own line, as (open, close).
const DISPLAY_MATH_TOKENS: [(&str, &str); 2] = [(r"\[", r"\]"), ("$$", "$$")];

/// Projector state between lines.
enum Mode<'a> {
    Normal,
    CodeFence {
        language: &'a str,
        lines: Vec<&'a str>,
    },
    DisplayMath {
        open: &'static str,
        close: &'static str,
        lines: Vec<&'a str>,
    },
    Table {
        rows: Vec<&'a str>,
    },
}

/// Markdown to HTML projector for the preview pane.
///
/// # Example
///
/// ```
/// use mdword_core::PreviewRenderer;
///
/// let html = PreviewRenderer::new().to_html("# Title\n\nSome **bold** text.");
/// assert!(html.contains("<h1>Title</h1>"));
/// assert!(html.contains("<p>Some <strong>bold</strong> text.</p>"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PreviewRenderer {
    image_base_url: String,
}

impl PreviewRenderer {
    /// Create a renderer that leaves image sources as written.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix for relative image sources (e.g. `/api/images/`).
    #[must_use]
    pub fn image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = url.into();
        self
    }

    /// Project `text` to HTML inside the styled preview container.
    #[must_use]
    pub fn to_html(&self, text: &str) -> String {
        let mut blocks: Vec<String> = Vec::new();
        self.project_lines(text.split('\n'), &mut blocks);

        format!(
            "{CONTAINER_OPEN}\n{}\n{STYLESHEET}\n</div>",
            blocks.join("\n")
        )
    }

    /// Run the block state machine over `lines`, appending to `blocks`.
    fn project_lines<'a>(
        &self,
        lines: impl IntoIterator<Item = &'a str>,
        blocks: &mut Vec<String>,
    ) {
        let mut mode = Mode::Normal;

        for line in lines {
            mode = match mode {
                Mode::CodeFence { language, mut lines } => {
                    if is_fence_line(line) {
                        blocks.push(code_block(language, &lines));
                        Mode::Normal
                    } else {
                        lines.push(line);
                        Mode::CodeFence { language, lines }
                    }
                }
                Mode::DisplayMath { open, close, mut lines } => {
                    if line.trim() == close {
                        blocks.push(display_math(open, &lines, close));
                        Mode::Normal
                    } else {
                        lines.push(line);
                        Mode::DisplayMath { open, close, lines }
                    }
                }
                Mode::Table { mut rows } if line.contains(CELL_SEPARATOR) => {
                    rows.push(line);
                    Mode::Table { rows }
                }
                Mode::Table { rows } => {
                    blocks.push(render_table(&rows));
                    self.normal_line(line, blocks)
                }
                Mode::Normal => self.normal_line(line, blocks),
            };
        }

        match mode {
            Mode::Normal => {}
            Mode::CodeFence { language, lines } => blocks.push(code_block(language, &lines)),
            // An opener that is never closed is literal text; the lines it
            // buffered are projected as ordinary content
            Mode::DisplayMath { open, lines, .. } => {
                blocks.push(self.line_html(open, open));
                self.project_lines(lines, blocks);
            }
            Mode::Table { rows } => blocks.push(render_table(&rows)),
        }
    }

    /// Handle a line outside any block, returning the next mode.
    fn normal_line<'a>(&self, line: &'a str, blocks: &mut Vec<String>) -> Mode<'a> {
        let trimmed = line.trim();

        if is_fence_line(line) {
            let language = trimmed[FENCE.len()..].split_whitespace().next().unwrap_or("");
            return Mode::CodeFence {
                language,
                lines: Vec::new(),
            };
        }
        if let Some(&(open, close)) = DISPLAY_MATH_TOKENS.iter().find(|(open, _)| trimmed == *open) {
            return Mode::DisplayMath {
                open,
                close,
                lines: Vec::new(),
            };
        }
        if line.contains(CELL_SEPARATOR) {
            return Mode::Table { rows: vec![line] };
        }

        blocks.push(self.line_html(line, trimmed));
        Mode::Normal
    }

    fn line_html(&self, line: &str, trimmed: &str) -> String {
        if trimmed.is_empty() {
            return "<br>".to_owned();
        }
        if let Some(caps) = HEADING.captures(line) {
            let level = caps[1].len();
            return format!("<h{level}>{}</h{level}>", render_inline(&caps[2]));
        }
        if let Some(quoted) = trimmed.strip_prefix('>') {
            return format!("<blockquote>{}</blockquote>", render_inline(quoted.trim_start()));
        }
        if let Some(caps) = IMAGE.captures(trimmed) {
            return format!(
                r#"<p><img src="{}" alt="{}"></p>"#,
                escape_html(&self.image_src(&caps["src"])),
                escape_html(&caps["alt"])
            );
        }
        format!("<p>{}</p>", render_inline(line))
    }

    fn image_src(&self, src: &str) -> String {
        let absolute = src.starts_with('/') || src.starts_with("data:") || src.contains("://");
        if absolute || self.image_base_url.is_empty() {
            src.to_owned()
        } else {
            format!("{}{src}", self.image_base_url)
        }
    }
}

/// Put math spans back into projected HTML.
///
/// Span sources are escaped, so `a<b` in math reaches the browser as text
/// for the typesetter instead of being parsed as markup.
#[must_use]
pub fn restore_math(html: &str, spans: &[MathSpan]) -> String {
    restore_with(html, spans, |span| escape_html(&span.source))
}

fn code_block(language: &str, lines: &[&str]) -> String {
    let code = escape_html(&lines.join("\n"));
    if language.is_empty() {
        format!("<pre><code>{code}</code></pre>")
    } else {
        format!(
            r#"<pre><code class="language-{}">{code}</code></pre>"#,
            escape_html(language)
        )
    }
}

fn display_math(open: &str, lines: &[&str], close: &str) -> String {
    let mut out = format!("<p>{open}\n");
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(close);
    out.push_str("</p>");
    out
}
