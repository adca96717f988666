//! HTML to markdown conversion for fetched pages.
//!
//! This is a lossy, regex-driven conversion aimed at giving a model readable
//! text: structure that matters for reading (headings, links, emphasis, lists,
//! paragraphs) survives, everything else is stripped.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static DROPPED_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<head\b[^>]*>.*?</head\s*>|<noscript\b[^>]*>.*?</noscript\s*>|<!--.*?-->",
    )
    .expect("valid regex")
});
static HEADINGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").expect("valid regex")
});
static LINKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)
        .expect("valid regex")
});
static STRONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:strong|b)\b[^>]*>(.*?)</(?:strong|b)\s*>").expect("valid regex")
});
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:em|i)\b[^>]*>(.*?)</(?:em|i)\s*>").expect("valid regex")
});
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<code\b[^>]*>(.*?)</code\s*>").expect("valid regex"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<li\b[^>]*>").expect("valid regex"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</?tr\b[^>]*>").expect("valid regex"));
static BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|ul|ol|table|section|article|header|footer|nav|main|aside|blockquote|pre|hr)\b[^>]*>",
    )
    .expect("valid regex")
});
static CELLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:td|th)\b[^>]*>").expect("valid regex"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid regex"));
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid regex"));
static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\f]+").expect("valid regex"));
static SPACE_AROUND_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *\n *").expect("valid regex"));
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Convert an HTML document into markdown-flavoured text.
///
/// Newlines inside text nodes are kept, so callers that care about blank
/// lines should follow up with [`collapse_blank_lines`].
pub fn html_to_markdown(html: &str) -> String {
    let text = DROPPED_BLOCKS.replace_all(html, "");

    let text = HEADINGS.replace_all(&text, |caps: &Captures| {
        let level: usize = caps[1].parse().unwrap_or(1);
        let title = single_line(&TAGS.replace_all(&caps[2], ""));
        format!("\n\n{} {}\n\n", "#".repeat(level), title)
    });

    let text = LINKS.replace_all(&text, |caps: &Captures| {
        let label = single_line(&TAGS.replace_all(&caps[2], ""));
        if label.is_empty() {
            String::new()
        } else {
            format!("[{}]({})", label, &caps[1])
        }
    });

    let text = STRONG.replace_all(&text, "**$1**");
    let text = EMPHASIS.replace_all(&text, "*$1*");
    let text = CODE.replace_all(&text, "`$1`");
    let text = LIST_ITEM.replace_all(&text, "\n* ");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = BLOCKS.replace_all(&text, "\n\n");
    let text = CELLS.replace_all(&text, " ");
    let text = TAGS.replace_all(&text, "");

    let text = decode_entities(&text);
    let text = INLINE_SPACE.replace_all(&text, " ");
    SPACE_AROUND_NEWLINE.replace_all(&text, "\n").into_owned()
}

/// Replace every run of three or more newlines with exactly two.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n\n").into_owned()
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    let text = NUMERIC_ENTITY.replace_all(text, |caps: &Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // &amp; last so "&amp;lt;" decodes to "&lt;" and not "<"
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
