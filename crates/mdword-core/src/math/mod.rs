//! Math span protection.
//!
//! Math notation is fragile under Markdown rewriting: underscores in
//! subscripts look like emphasis, `|` looks like a table cell, `*` looks like
//! bold. Before any other pass touches the document, every math span is cut
//! out and replaced with an opaque placeholder; the spans are put back
//! verbatim by [`restore`] once the rewriting is done.
//!
//! # Notations
//!
//! Spans are recognized in four notations, scanned in this order (each pass
//! only sees text where earlier matches are already placeholders):
//!
//! 1. `\[ ... \]` display math, may span lines
//! 2. `\( ... \)` inline math, may span lines
//! 3. `$ ... $` inline math, single line, no `$` inside
//! 4. `$$ ... $$` display math, may span lines
//!
//! Fenced code blocks are never scanned. Unterminated delimiters are left as
//! literal text.
//!
//! # Placeholders
//!
//! A placeholder is `U+E000 MDWMATH <index> END U+E001`: private-use
//! sentinels around ASCII letters and digits. It contains no Markdown or
//! LaTeX metacharacters and never spans a line, even when the span it stands
//! for does.

mod autowrap;

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::fence::map_prose;

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

static DISPLAY_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[.*?\\\]").expect("invalid display bracket regex"));

static INLINE_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\(.*?\\\)").expect("invalid inline bracket regex"));

// The `\$\$` alternative consumes dollar pairs so they are left for the
// display pass instead of being split into two inline spans. Neither dollar
// form may run across a placeholder left by an earlier pass.
static DOLLAR_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|\$[^$\n\x{E000}]+?\$").expect("invalid inline dollar regex")
});

static DOLLAR_DISPLAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$[^$\x{E000}]+?\$\$").expect("invalid display dollar regex")
});

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("\u{E000}MDWMATH([0-9]+)END\u{E001}").expect("invalid placeholder regex")
});

/// Math notation of a protected span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathKind {
    /// `\[ ... \]`
    DisplayBracket,
    /// `\( ... \)`
    InlineBracket,
    /// `$ ... $`
    DollarInline,
    /// `$$ ... $$`
    DollarDisplay,
}

impl MathKind {
    /// Whether the notation is block-level.
    #[must_use]
    pub fn is_display(self) -> bool {
        matches!(self, Self::DisplayBracket | Self::DollarDisplay)
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::DisplayBracket => &DISPLAY_BRACKET,
            Self::InlineBracket => &INLINE_BRACKET,
            Self::DollarInline => &DOLLAR_INLINE,
            Self::DollarDisplay => &DOLLAR_DISPLAY,
        }
    }
}

/// Scan order; earlier kinds take precedence.
const PASSES: [MathKind; 4] = [
    MathKind::DisplayBracket,
    MathKind::InlineBracket,
    MathKind::DollarInline,
    MathKind::DollarDisplay,
];

/// A math expression cut out of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSpan {
    /// Notation the span was written in.
    pub kind: MathKind,
    /// Original text including delimiters.
    pub source: String,
}

/// Text with math spans replaced by placeholders.
///
/// `spans[i]` is the span behind placeholder `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedText {
    /// Rewritten text.
    pub text: String,
    /// Protected spans in placeholder index order.
    pub spans: Vec<MathSpan>,
}

impl ProtectedText {
    /// Put the spans back into the protected text.
    #[must_use]
    pub fn restore(&self) -> String {
        restore(&self.text, &self.spans)
    }
}

/// Placeholder token for span `index`.
#[must_use]
pub fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_OPEN}MDWMATH{index}END{PLACEHOLDER_CLOSE}")
}

/// Whether `text` still contains a placeholder.
#[must_use]
pub fn contains_placeholder(text: &str) -> bool {
    text.contains(PLACEHOLDER_OPEN)
}

/// Replace every placeholder in `text` with its span.
///
/// Placeholders with no matching span are left in place. `spans` is not
/// consumed, so independent copies of a protected text can each be restored
/// against the same sequence.
#[must_use]
pub fn restore(text: &str, spans: &[MathSpan]) -> String {
    restore_with(text, spans, |span| span.source.clone())
}

/// Replace every placeholder in `text` with `render(span)`.
pub(crate) fn restore_with(
    text: &str,
    spans: &[MathSpan],
    render: impl Fn(&MathSpan) -> String,
) -> String {
    if !contains_placeholder(text) {
        return text.to_owned();
    }
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| spans.get(i))
                .map_or_else(|| caps[0].to_owned(), &render)
        })
        .into_owned()
}

/// Protects math spans in Markdown text.
///
/// # Example
///
/// ```
/// use mdword_core::math::{MathKind, MathProtector};
///
/// let protected = MathProtector::new().protect(r"Euler: \(e^{i\pi} + 1 = 0\)");
/// assert_eq!(protected.spans.len(), 1);
/// assert_eq!(protected.spans[0].kind, MathKind::InlineBracket);
/// assert_eq!(protected.restore(), r"Euler: \(e^{i\pi} + 1 = 0\)");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MathProtector {
    auto_wrap: bool,
}

impl MathProtector {
    /// Create a protector that only protects existing math notation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable wrapping of bare math-looking notation before protection.
    ///
    /// Off by default. Recognized forms are single letters with sub or
    /// superscripts (`x_i`, `k_{i+1}`), math alphabets (`\mathcal{W}`), LaTeX
    /// Greek letters and operators (`\alpha`, `\leq`), and Unicode Greek
    /// letters.
    #[must_use]
    pub fn auto_wrap(mut self, enabled: bool) -> Self {
        self.auto_wrap = enabled;
        self
    }

    /// Replace every math span in `text` with a placeholder.
    #[must_use]
    pub fn protect(&self, text: &str) -> ProtectedText {
        let wrapped;
        let text = if self.auto_wrap {
            wrapped = autowrap::wrap_bare_math(text);
            wrapped.as_str()
        } else {
            text
        };

        let mut spans = Vec::new();
        let text = map_prose(text, |segment| protect_segment(segment, &PASSES, &mut spans));
        ProtectedText { text, spans }
    }
}

/// Run the given passes over one prose segment, appending to `spans`.
fn protect_segment(segment: &str, passes: &[MathKind], spans: &mut Vec<MathSpan>) -> String {
    let mut text = segment.to_owned();
    for &kind in passes {
        text = protect_kind(&text, kind, spans);
    }
    text
}

fn protect_kind(text: &str, kind: MathKind, spans: &mut Vec<MathSpan>) -> String {
    kind.pattern()
        .replace_all(text, |caps: &Captures<'_>| {
            let matched = &caps[0];
            if kind == MathKind::DollarInline && matched == "$$" {
                return matched.to_owned();
            }
            // A match may enclose placeholders from earlier passes
            let source = restore(matched, spans);
            spans.push(MathSpan { kind, source });
            placeholder(spans.len() - 1)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn protect(text: &str) -> ProtectedText {
        MathProtector::new().protect(text)
    }

    fn kinds(protected: &ProtectedText) -> Vec<MathKind> {
        protected.spans.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_text_without_math_is_unchanged() {
        let text = "# Title\n\nPlain **text** with a_b and | pipes |.\n";
        let protected = protect(text);

        assert!(protected.spans.is_empty());
        assert_eq!(protected.text, text);
        assert_eq!(protected.restore(), text);
    }

    #[test]
    fn test_each_notation_is_recognized() {
        let text = r"a \[x\] b \(y\) c $z$ d $$w$$";
        let protected = protect(text);

        assert_eq!(
            kinds(&protected),
            vec![
                MathKind::DisplayBracket,
                MathKind::InlineBracket,
                MathKind::DollarInline,
                MathKind::DollarDisplay,
            ]
        );
        assert_eq!(protected.spans[3].source, "$$w$$");
        assert_eq!(protected.restore(), text);
    }

    #[test]
    fn test_display_bracket_spans_lines_but_placeholder_does_not() {
        let text = "before\n\\[\n\\sum_{i=1}^n x_i\n\\]\nafter";
        let protected = protect(text);

        assert_eq!(protected.spans.len(), 1);
        assert_eq!(protected.text, format!("before\n{}\nafter", placeholder(0)));
        assert!(!placeholder(0).contains('\n'));
        assert_eq!(protected.restore(), text);
    }

    #[test]
    fn test_inline_brackets_are_non_greedy() {
        let text = r"\(a\) and \(b\)";
        let protected = protect(text);

        assert_eq!(protected.spans.len(), 2);
        assert_eq!(protected.spans[0].source, r"\(a\)");
        assert_eq!(protected.spans[1].source, r"\(b\)");
        assert_eq!(
            protected.text,
            format!("{} and {}", placeholder(0), placeholder(1))
        );
    }

    #[test]
    fn test_dollar_inside_bracket_span_is_not_rematched() {
        let text = r"price \(\$5 + $x\) and more $ text";
        let protected = protect(text);

        assert_eq!(kinds(&protected), vec![MathKind::InlineBracket]);
        assert_eq!(protected.spans[0].source, r"\(\$5 + $x\)");
        assert_eq!(protected.restore(), text);
    }

    #[test]
    fn test_currency_dollars_do_not_swallow_bracket_math() {
        let text = r"It costs $5 and \(x\) and $6 more";
        let protected = protect(text);

        assert_eq!(kinds(&protected), vec![MathKind::InlineBracket]);
        assert_eq!(protected.spans[0].source, r"\(x\)");
        let restored = protected.restore();
        assert!(!contains_placeholder(&restored));
        assert_eq!(restored, text);
    }

    #[test]
    fn test_enclosing_span_stores_literal_source() {
        let text = r"see \( a \[b\] c \) here";
        let protected = protect(text);

        assert_eq!(
            kinds(&protected),
            vec![MathKind::DisplayBracket, MathKind::InlineBracket]
        );
        assert_eq!(protected.spans[1].source, r"\( a \[b\] c \)");
        assert!(
            protected
                .spans
                .iter()
                .all(|span| !contains_placeholder(&span.source))
        );
        assert_eq!(protected.restore(), text);
    }

    #[test]
    fn test_inline_dollar_is_single_line() {
        let text = "cost $5\nand $6 more";
        let protected = protect(text);

        assert!(protected.spans.is_empty());
        assert_eq!(protected.text, text);
    }

    #[test]
    fn test_multiline_dollar_display() {
        let text = "$$\nE = mc^2\n$$";
        let protected = protect(text);

        assert_eq!(kinds(&protected), vec![MathKind::DollarDisplay]);
        assert_eq!(protected.text, placeholder(0));
    }

    #[test]
    fn test_dollar_display_is_not_split_by_inline_pass() {
        let protected = protect("see $$a+b$$ and $c$");

        assert_eq!(
            kinds(&protected),
            vec![MathKind::DollarInline, MathKind::DollarDisplay]
        );
        assert_eq!(protected.spans[0].source, "$c$");
        assert_eq!(protected.spans[1].source, "$$a+b$$");
    }

    #[test]
    fn test_unterminated_delimiters_pass_through() {
        let text = r"stray \( open and \[ another";
        let protected = protect(text);

        assert!(protected.spans.is_empty());
        assert_eq!(protected.text, text);
    }

    #[test]
    fn test_fenced_code_is_not_protected() {
        let text = "Inline $x$\n```bash\necho $HOME $PATH\n```\nafter \\(y\\)";
        let protected = protect(text);

        assert_eq!(protected.spans.len(), 2);
        assert!(protected.text.contains("echo $HOME $PATH"));
        assert_eq!(protected.restore(), text);
    }

    #[test]
    fn test_span_indices_are_global_across_segments() {
        let text = "$a$\n```\ncode\n```\n$b$";
        let protected = protect(text);

        assert_eq!(protected.spans[0].source, "$a$");
        assert_eq!(protected.spans[1].source, "$b$");
        assert!(protected.text.ends_with(&placeholder(1)));
    }

    #[test]
    fn test_restore_is_repeatable_on_independent_copies() {
        let protected = protect(r"x \(a_1\) y");
        let copy_a = protected.text.clone();
        let copy_b = format!("<p>{}</p>", protected.text);

        assert_eq!(restore(&copy_a, &protected.spans), r"x \(a_1\) y");
        assert_eq!(
            restore(&copy_b, &protected.spans),
            r"<p>x \(a_1\) y</p>"
        );
    }

    #[test]
    fn test_restore_leaves_unknown_placeholder() {
        let text = format!("a {} b", placeholder(7));
        assert_eq!(restore(&text, &[]), text);
    }

    #[test]
    fn test_restore_after_restore_is_noop() {
        let protected = protect(r"\(a\)");
        let once = protected.restore();
        assert_eq!(restore(&once, &protected.spans), once);
    }

    #[test]
    fn test_balanced_inline_spans_round_trip() {
        let samples = [
            r"\(a\)\(b\)",
            "line one \\(x\nspans\\) line two",
            r"nested-looking \( \left( x \right) \) ok",
            r"设 \( \mathbf{y} = \{y_1, \dots, y_N\} \)，其中 \( y_i \in \{0, 1\} \)",
        ];
        for text in samples {
            let protected = protect(text);
            assert!(
                protected
                    .spans
                    .iter()
                    .all(|s| s.kind == MathKind::InlineBracket)
            );
            assert_eq!(protected.restore(), text, "round trip failed for {text:?}");
        }
    }

    #[test]
    fn test_math_kind_is_display() {
        assert!(MathKind::DisplayBracket.is_display());
        assert!(MathKind::DollarDisplay.is_display());
        assert!(!MathKind::InlineBracket.is_display());
        assert!(!MathKind::DollarInline.is_display());
    }

    #[test]
    fn test_contains_placeholder() {
        assert!(contains_placeholder(&format!("x{}y", placeholder(0))));
        assert!(!contains_placeholder("MDWMATH0END"));
    }
}
