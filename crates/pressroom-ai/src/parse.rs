//! Turns raw model output into a [`GeneratedArticle`].
//!
//! Models are asked for a bare JSON object but regularly wrap it in a code
//! fence or a sentence of prose, and occasionally ignore the format and
//! answer in Markdown. All of those are accepted.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

const MAX_EXCERPT_CHARS: usize = 280;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[a-zA-Z]*\s*\n(.*?)```").expect("valid fence regex")
});
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub tags: Vec<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArticle {
    title: String,
    excerpt: String,
    #[serde(alias = "body", alias = "content")]
    body_markdown: String,
    tags: Vec<String>,
    seo_title: Option<String>,
    seo_description: Option<String>,
}

/// Parses model output into an article.
///
/// # Errors
///
/// Returns [`AiError::Parse`] when no title or body can be recovered.
pub fn parse_generated_article(text: &str) -> Result<GeneratedArticle, AiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AiError::Parse("model output is empty".into()));
    }

    if let Some(raw) = json_candidates(text)
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<RawArticle>(candidate).ok())
    {
        return finish(raw);
    }

    finish(from_markdown(text))
}

/// Whole text, then each fenced block, then first `{` to last `}`.
fn json_candidates(text: &str) -> Vec<&str> {
    let mut candidates = vec![text];
    candidates.extend(
        FENCED_BLOCK
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim()),
    );
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            candidates.push(&text[start..=end]);
        }
    }
    candidates
}

fn from_markdown(text: &str) -> RawArticle {
    let mut title = String::new();
    let mut body_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if title.is_empty() {
            if let Some(heading) = line.trim_start().strip_prefix("# ") {
                title = heading.trim().to_owned();
                continue;
            }
        }
        body_lines.push(line);
    }

    if title.is_empty() {
        return RawArticle::default();
    }

    RawArticle {
        title,
        body_markdown: body_lines.join("\n"),
        ..RawArticle::default()
    }
}

fn finish(raw: RawArticle) -> Result<GeneratedArticle, AiError> {
    let title = raw.title.trim().trim_matches('"').to_owned();
    if title.is_empty() {
        return Err(AiError::Parse("generated article has no title".into()));
    }
    let body_markdown = raw.body_markdown.trim().to_owned();
    if body_markdown.is_empty() {
        return Err(AiError::Parse("generated article has no body".into()));
    }

    let excerpt = match raw.excerpt.trim() {
        "" => excerpt_from_body(&body_markdown),
        given => given.to_owned(),
    };

    let mut tags: Vec<String> = Vec::new();
    for tag in raw.tags.iter().map(|t| t.trim().trim_start_matches('#')) {
        if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_owned());
        }
    }

    Ok(GeneratedArticle {
        title,
        excerpt,
        body_markdown,
        tags,
        seo_title: non_empty(raw.seo_title),
        seo_description: non_empty(raw.seo_description),
    })
}

/// First paragraph that is not a heading, flattened to one line.
fn excerpt_from_body(body: &str) -> String {
    let paragraph = body
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#'))
        .unwrap_or_default();
    let flat = WHITESPACE.replace_all(paragraph, " ");
    let flat = flat.replace(['*', '_', '`'], "");

    if flat.chars().count() <= MAX_EXCERPT_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_EXCERPT_CHARS).collect();
    if let Some(idx) = cut.rfind(' ') {
        cut.truncate(idx);
    }
    cut.push('…');
    cut
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
