use std::sync::LazyLock;

use regex::Regex;

/// A run of text in one weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    fn new(text: &str, bold: bool) -> Self {
        Self {
            text: text.to_string(),
            bold,
        }
    }
}

// Three or more line breaks, allowing whitespace-only lines in between.
static BLANK_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n[ \t]*){3,}").unwrap());

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

/// Collapse every gap of 3+ line breaks to a single blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_GAP_RE.replace_all(text, "\n\n").into_owned()
}

/// Split one line into plain and bold spans.
///
/// `**x**` becomes bold `x`; any `*` left over is dropped.
pub fn parse_line(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;
    for caps in BOLD_RE.captures_iter(line) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        push_span(&mut spans, &line[last..whole.start], false);
        push_span(&mut spans, &caps[1], true);
        last = whole.end;
    }
    push_span(&mut spans, &line[last..], false);
    spans
}

fn push_span(spans: &mut Vec<Span>, text: &str, bold: bool) {
    let text = text.replace('*', "");
    if !text.is_empty() {
        spans.push(Span::new(&text, bold));
    }
}

/// Summary text as paragraphs of spans, one per source line.
/// Blank lines come back as empty paragraphs.
pub fn paragraphs(text: &str) -> Vec<Vec<Span>> {
    collapse_blank_lines(text.trim())
        .lines()
        .map(|line| parse_line(line.trim_end()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_spans_strip_markers() {
        assert_eq!(
            parse_line("Player **2** won the **net** battle"),
            vec![
                Span::new("Player ", false),
                Span::new("2", true),
                Span::new(" won the ", false),
                Span::new("net", true),
                Span::new(" battle", false),
            ]
        );
    }

    #[test]
    fn unpaired_markers_are_removed() {
        assert_eq!(parse_line("* rally *length* was long"), vec![Span::new(" rally length was long", false)]);
        assert_eq!(
            parse_line("**Smash** count**"),
            vec![Span::new("Smash", true), Span::new(" count", false)]
        );
    }

    #[test]
    fn triple_star_keeps_bold_text_only() {
        assert_eq!(parse_line("***key***"), vec![Span::new("key", true)]);
    }

    #[test]
    fn collapses_long_gaps() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n  \n\t\nb"), "a\n\nb");
        // Two breaks are already a single paragraph gap.
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn paragraphs_keep_single_blank_line() {
        let paras = paragraphs("First\n\n\n\nSecond **bold**\n");
        assert_eq!(paras.len(), 3);
        assert!(paras[1].is_empty());
        assert_eq!(paras[2][1], Span::new("bold", true));
    }
}
