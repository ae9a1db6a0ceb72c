//! Wrapping of bare math-looking notation in `\( ... \)`.
//!
//! Recognized forms, applied in this order:
//!
//! - math alphabets with an argument: `\mathcal{W}`, `\mathbb{R}_n`
//! - a single letter with sub/superscripts: `x_i`, `k_{i+1}`, `θ^2`, `s_{i}^{j}`
//! - LaTeX Greek letters and common operators: `\alpha`, `\leq`, `\infty`
//! - Unicode Greek letters: `α`, `Δ`
//!
//! Existing math spans are protected first, and every span wrapped by one
//! pattern is protected before the next runs, so wrapping never nests.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{MathKind, MathSpan, PASSES, placeholder, protect_segment, restore};
use crate::fence::map_prose;

const SUB: &str = r"_(?:\{[^}\n]+\}|[A-Za-z0-9])";
const SUP: &str = r"\^(?:\{[^}\n]+\}|[A-Za-z0-9+*-])";

const GREEK: &str = "alpha|beta|gamma|delta|epsilon|varepsilon|zeta|eta|theta|vartheta|iota|kappa\
|lambda|mu|nu|xi|pi|rho|sigma|tau|upsilon|phi|varphi|chi|psi|omega\
|Gamma|Delta|Theta|Lambda|Xi|Pi|Sigma|Upsilon|Phi|Psi|Omega";

const OPERATORS: &str = "dots|ldots|cdots|vdots|ddots\
|le|ge|leq|geq|ne|neq|approx|equiv|sim\
|in|notin|subset|subseteq|supset|supseteq\
|cup|cap|setminus|times|div|pm|mp\
|to|rightarrow|leftarrow|leftrightarrow|Rightarrow|Leftarrow|Leftrightarrow\
|partial|nabla|infty|emptyset|exists|forall\
|lfloor|rfloor|lceil|rceil|langle|rangle";

static WRAP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let scripts = format!("(?:{SUB}(?:{SUP})?|{SUP}(?:{SUB})?)");
    [
        format!(
            r"(?P<pre>^|[^\\])(?P<m>\\(?:mathcal|mathbb|mathbf|mathfrak|mathsf|mathrm)\{{[^}}\n]+\}}{scripts}?)"
        ),
        format!(r"(?P<pre>^|[^A-Za-z0-9_\\])(?P<m>[A-Za-zα-ωΑ-Ω]{scripts})"),
        format!(r"(?P<pre>^|[^\\])(?P<m>\\(?:{GREEK}|{OPERATORS})\b{scripts}?)"),
        "(?P<pre>)(?P<m>[α-ωΑ-Ω])".to_owned(),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("invalid auto-wrap regex"))
    .collect()
});

/// Wrap bare math notation in every prose region of `text`.
pub(super) fn wrap_bare_math(text: &str) -> String {
    map_prose(text, wrap_segment)
}

fn wrap_segment(segment: &str) -> String {
    let mut spans = Vec::new();
    let mut text = protect_segment(segment, &PASSES, &mut spans);
    for pattern in WRAP_PATTERNS.iter() {
        text = wrap_pattern(&text, pattern, &mut spans);
    }
    restore(&text, &spans)
}

fn wrap_pattern(text: &str, pattern: &Regex, spans: &mut Vec<MathSpan>) -> String {
    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            let end = caps.get(0).map_or(text.len(), |m| m.end());
            // `x_ij` or `\alpha_1b` continue into a word; leave them alone
            let continues = text[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if continues {
                return caps[0].to_owned();
            }

            spans.push(MathSpan {
                kind: MathKind::InlineBracket,
                source: format!(r"\({}\)", restore(&caps["m"], spans)),
            });
            format!("{}{}", &caps["pre"], placeholder(spans.len() - 1))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_subscripts_and_superscripts() {
        assert_eq!(wrap_bare_math("where x_i is"), r"where \(x_i\) is");
        assert_eq!(wrap_bare_math("k_{i+1} next"), r"\(k_{i+1}\) next");
        assert_eq!(wrap_bare_math("area r^2."), r"area \(r^2\).");
        assert_eq!(wrap_bare_math("s_{i}^{j}"), r"\(s_{i}^{j}\)");
    }

    #[test]
    fn test_identifiers_are_not_wrapped() {
        let text = "call snake_case or my_var and x_ij here";
        assert_eq!(wrap_bare_math(text), text);
    }

    #[test]
    fn test_greek_letters() {
        assert_eq!(wrap_bare_math("angle θ"), r"angle \(θ\)");
        assert_eq!(wrap_bare_math("weight θ_j"), r"weight \(θ_j\)");
        assert_eq!(wrap_bare_math(r"rate \alpha ok"), r"rate \(\alpha\) ok");
        assert_eq!(wrap_bare_math(r"\alpha_1 first"), r"\(\alpha_1\) first");
    }

    #[test]
    fn test_operators_need_word_boundary() {
        assert_eq!(wrap_bare_math(r"x \in S"), r"x \(\in\) S");
        assert_eq!(wrap_bare_math(r"to \infty"), r"to \(\infty\)");
        assert_eq!(wrap_bare_math(r"\inside"), r"\inside");
    }

    #[test]
    fn test_math_alphabets() {
        assert_eq!(
            wrap_bare_math(r"set \mathcal{W} of"),
            r"set \(\mathcal{W}\) of"
        );
        assert_eq!(wrap_bare_math(r"\mathbb{R}^n"), r"\(\mathbb{R}^n\)");
    }

    #[test]
    fn test_existing_math_is_not_rewrapped() {
        let text = r"given \(x_i \in \mathcal{D}\) and $\alpha$";
        assert_eq!(wrap_bare_math(text), text);
    }

    #[test]
    fn test_fenced_code_is_not_wrapped() {
        let text = "```python\nx_i = alpha\n```";
        assert_eq!(wrap_bare_math(text), text);
    }

    #[test]
    fn test_protector_with_auto_wrap() {
        let protected = crate::math::MathProtector::new()
            .auto_wrap(true)
            .protect("value x_i here");

        assert_eq!(protected.spans.len(), 1);
        assert_eq!(protected.spans[0].source, r"\(x_i\)");
        assert_eq!(protected.restore(), r"value \(x_i\) here");
    }
}
