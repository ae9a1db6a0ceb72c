//! Inline markup within a single line.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::math::contains_placeholder;

static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("invalid code span regex"));

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("invalid bold regex"));

static ITALIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<pre>^|[^\w])_(?P<body>[^_\s](?:[^_]*[^_\s])?)_").expect("invalid italic regex")
});

/// Escape text for HTML content and attribute values.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Apply code spans, bold and italic to one line.
///
/// Code span contents are escaped and never see emphasis. Italic is skipped
/// for the whole line when it still holds a math placeholder, since
/// underscores near math are usually subscripts.
pub(crate) fn render_inline(line: &str) -> String {
    let italic = !contains_placeholder(line);
    let mut out = String::with_capacity(line.len() + 16);
    let mut cursor = 0;

    for caps in CODE_SPAN.captures_iter(line) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&emphasis(&line[cursor..whole.start()], italic));
        out.push_str("<code>");
        out.push_str(&escape_html(code.as_str()));
        out.push_str("</code>");
        cursor = whole.end();
    }
    out.push_str(&emphasis(&line[cursor..], italic));

    out
}

fn emphasis(text: &str, italic: bool) -> String {
    let text = BOLD.replace_all(text, "<strong>$1</strong>");
    if !italic {
        return text.into_owned();
    }

    ITALIC
        .replace_all(&text, |caps: &Captures<'_>| {
            let end = caps.get(0).map_or(text.len(), |m| m.end());
            // `_a_b` is an identifier, not emphasis
            let continues = text[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if continues {
                caps[0].to_owned()
            } else {
                format!("{}<em>{}</em>", &caps["pre"], &caps["body"])
            }
        })
        .into_owned()
}
