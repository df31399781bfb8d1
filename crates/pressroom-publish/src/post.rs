//! The platform-neutral post handed to every publisher.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::markdown::{plain_text_excerpt, reading_time_minutes, render_html, strip_leading_title};

const EXCERPT_CHARS: usize = 160;

/// Stored article fields needed to build a [`PublishPost`].
#[derive(Debug, Clone, Default)]
pub struct ArticleContent<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub body_markdown: &'a str,
    pub excerpt: Option<&'a str>,
    pub tags: &'a [String],
    pub featured_image_url: Option<&'a str>,
    pub author_name: Option<&'a str>,
    /// Canonical URL of the original, for syndication targets such as Medium.
    pub canonical_url: Option<&'a str>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishPost {
    pub title: String,
    pub slug: String,
    /// Body without a leading heading that repeats the title.
    pub body_markdown: String,
    pub body_html: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub featured_image_url: Option<String>,
    pub author_name: Option<String>,
    pub canonical_url: Option<String>,
    /// Send as a draft instead of publishing live.
    pub draft: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub reading_time_minutes: u32,
}

impl PublishPost {
    #[must_use]
    pub fn from_article(article: &ArticleContent<'_>, draft: bool) -> Self {
        let body_markdown = strip_leading_title(article.body_markdown, article.title);
        let excerpt = article
            .excerpt
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map_or_else(
                || plain_text_excerpt(&body_markdown, EXCERPT_CHARS),
                str::to_owned,
            );

        let mut tags: Vec<String> = Vec::new();
        for tag in article.tags.iter().map(|t| t.trim()) {
            if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                tags.push(tag.to_owned());
            }
        }

        Self {
            title: article.title.trim().to_owned(),
            slug: article.slug.to_owned(),
            body_html: render_html(&body_markdown),
            reading_time_minutes: reading_time_minutes(&body_markdown),
            body_markdown,
            excerpt,
            tags,
            featured_image_url: non_empty(article.featured_image_url),
            author_name: non_empty(article.author_name),
            canonical_url: non_empty(article.canonical_url),
            draft,
            published_at: if draft { None } else { article.published_at },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}
