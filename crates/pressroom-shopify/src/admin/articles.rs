//! Mapping from CMS articles to the Admin API article schema.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

const DEFAULT_AUTHOR: &str = "Pressroom";

/// The CMS fields needed to build an [`ArticleInput`].
#[derive(Debug, Clone)]
pub struct CmsArticle<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    /// Rendered HTML body.
    pub body_html: &'a str,
    /// Rendered HTML summary, shown on blog listings.
    pub summary_html: Option<&'a str>,
    pub tags: &'a [String],
    pub author_name: Option<&'a str>,
    pub featured_image_url: Option<&'a str>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleImageInput {
    pub url: String,
    pub alt_text: String,
}

/// `ArticleCreateInput` / `ArticleUpdateInput` as sent to `articleCreate` and
/// `articleUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_id: Option<String>,
    pub title: String,
    pub handle: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub author: AuthorInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ArticleImageInput>,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
}

impl ArticleInput {
    /// Builds the Admin API input for a CMS article.
    ///
    /// A blank summary is left out, a featured image is sent with the title
    /// as alt text, and `publishDate` is only set for published articles
    /// (defaulting to now).
    #[must_use]
    pub fn from_cms(blog_id: Option<&str>, article: &CmsArticle<'_>) -> Self {
        let summary = article
            .summary_html
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_owned);

        let image = article
            .featured_image_url
            .filter(|u| !u.trim().is_empty())
            .map(|url| ArticleImageInput {
                url: url.to_owned(),
                alt_text: article.title.to_owned(),
            });

        let publish_date = article.published.then(|| {
            article
                .published_at
                .unwrap_or_else(Utc::now)
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        });

        Self {
            blog_id: blog_id.map(str::to_owned),
            title: article.title.to_owned(),
            handle: article.slug.to_owned(),
            body: article.body_html.to_owned(),
            summary,
            tags: article.tags.to_vec(),
            author: AuthorInput {
                name: article
                    .author_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(DEFAULT_AUTHOR)
                    .to_owned(),
            },
            image,
            is_published: article.published,
            publish_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn cms<'a>(tags: &'a [String]) -> CmsArticle<'a> {
        CmsArticle {
            title: "Cold Brew Hojicha",
            slug: "cold-brew-hojicha",
            body_html: "<p>Steep overnight.</p>",
            summary_html: Some("<p>Roasted &amp; smooth</p>\n"),
            tags,
            author_name: None,
            featured_image_url: Some("https://cdn.example.com/hojicha.jpg"),
            published: true,
            published_at: Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()),
        }
    }

    #[test]
    fn maps_cms_fields_to_camel_case_input() {
        let tags = vec!["tea".to_owned(), "summer".to_owned()];
        let input = ArticleInput::from_cms(Some("gid://shopify/Blog/1"), &cms(&tags));
        let json = serde_json::to_value(&input).unwrap();

        assert_eq!(json["blogId"], "gid://shopify/Blog/1");
        assert_eq!(json["handle"], "cold-brew-hojicha");
        assert_eq!(json["summary"], "<p>Roasted &amp; smooth</p>");
        assert_eq!(json["author"]["name"], "Pressroom");
        assert_eq!(json["image"]["altText"], "Cold Brew Hojicha");
        assert_eq!(json["isPublished"], true);
        assert_eq!(json["publishDate"], "2026-03-01T09:30:00Z");
        assert_eq!(json["tags"][1], "summer");
    }

    #[test]
    fn drafts_have_no_publish_date_and_optional_fields_are_omitted() {
        let tags: Vec<String> = vec![];
        let mut article = cms(&tags);
        article.published = false;
        article.summary_html = Some("   ");
        article.featured_image_url = None;
        article.author_name = Some("Mei");

        let input = ArticleInput::from_cms(None, &article);
        let json = serde_json::to_value(&input).unwrap();

        assert!(json.get("blogId").is_none());
        assert!(json.get("summary").is_none());
        assert!(json.get("image").is_none());
        assert!(json.get("publishDate").is_none());
        assert_eq!(json["author"]["name"], "Mei");
        assert_eq!(json["isPublished"], false);
    }
}
