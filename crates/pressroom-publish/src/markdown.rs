//! Markdown rendering and text helpers for outgoing posts.

use std::sync::LazyLock;

use comrak::{markdown_to_html, Options};
use regex::Regex;

const WORDS_PER_MINUTE: usize = 200;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tag regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Renders GitHub-flavoured Markdown to HTML.
///
/// Raw HTML in the source is not passed through; comrak replaces it with
/// an "omitted" comment.
#[must_use]
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.render.r#unsafe = false;

    markdown_to_html(markdown, &options)
}

/// Plain text of `markdown`, cut at a word boundary to at most
/// `max_chars` characters plus a trailing `…`.
#[must_use]
pub fn plain_text_excerpt(markdown: &str, max_chars: usize) -> String {
    let text = plain_text(markdown);
    if text.chars().count() <= max_chars {
        return text;
    }

    let mut cut: String = text.chars().take(max_chars).collect();
    if let Some(idx) = cut.rfind(' ') {
        cut.truncate(idx);
    }
    let trimmed = cut.trim_end_matches([',', ';', ':', '.', ' ']).len();
    cut.truncate(trimmed);
    cut.push('…');
    cut
}

/// Estimated reading time at 200 words per minute, never less than 1.
#[must_use]
pub fn reading_time_minutes(markdown: &str) -> u32 {
    let words = plain_text(markdown).split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Removes a leading `# {title}` heading (and the blank lines after it)
/// when it repeats the article title; platforms render the title themselves.
#[must_use]
pub fn strip_leading_title(markdown: &str, title: &str) -> String {
    let trimmed = markdown.trim_start();
    let (first_line, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));

    match first_line.trim().strip_prefix("# ") {
        Some(heading) if heading.trim().eq_ignore_ascii_case(title.trim()) => {
            rest.trim_start_matches(['\n', '\r']).to_owned()
        }
        _ => markdown.to_owned(),
    }
}

fn plain_text(markdown: &str) -> String {
    let html = render_html(markdown);
    let without_tags = HTML_TAG.replace_all(&html, " ");
    let decoded = without_tags
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}
