use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Maximum slug length. Longer slugs are cut at this length and any
/// trailing dash left by the cut is removed.
pub const MAX_SLUG_LEN: usize = 96;

/// Maximum title length in characters, measured after trimming.
pub const MAX_TITLE_LEN: usize = 200;

/// Editorial lifecycle of a CMS article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Scheduled,
    Published,
    Archived,
}

impl ArticleStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Scheduled => "scheduled",
            ArticleStatus::Published => "published",
            ArticleStatus::Archived => "archived",
        }
    }

    /// Returns `true` if an article in `self` may move to `next`.
    ///
    /// Moving to the same status is not a transition and returns `false`.
    #[must_use]
    pub fn can_transition_to(self, next: ArticleStatus) -> bool {
        use ArticleStatus::{Archived, Draft, Published, Scheduled};
        matches!(
            (self, next),
            (Draft, Scheduled | Published | Archived)
                | (Scheduled, Draft | Published | Archived)
                | (Published, Archived)
                | (Archived, Draft)
        )
    }

    /// Validates a transition, returning `CoreError::InvalidTransition` when
    /// it is not allowed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] if `next` is not reachable.
    pub fn transition_to(self, next: ArticleStatus) -> Result<ArticleStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(ArticleStatus::Draft),
            "scheduled" => Ok(ArticleStatus::Scheduled),
            "published" => Ok(ArticleStatus::Published),
            "archived" => Ok(ArticleStatus::Archived),
            _ => Err(unknown("article status", s)),
        }
    }
}

/// A publishing destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Shopify,
    WordPress,
    Ghost,
    Medium,
    Webflow,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Shopify,
        Platform::WordPress,
        Platform::Ghost,
        Platform::Medium,
        Platform::Webflow,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Shopify => "shopify",
            Platform::WordPress => "wordpress",
            Platform::Ghost => "ghost",
            Platform::Medium => "medium",
            Platform::Webflow => "webflow",
        }
    }

    /// Human-readable name, e.g. `"WordPress"`.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Shopify => "Shopify",
            Platform::WordPress => "WordPress",
            Platform::Ghost => "Ghost",
            Platform::Medium => "Medium",
            Platform::Webflow => "Webflow",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shopify" => Ok(Platform::Shopify),
            "wordpress" => Ok(Platform::WordPress),
            "ghost" => Ok(Platform::Ghost),
            "medium" => Ok(Platform::Medium),
            "webflow" => Ok(Platform::Webflow),
            _ => Err(unknown("platform", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl AiProvider {
    pub const ALL: [AiProvider; 3] = [AiProvider::OpenAi, AiProvider::Anthropic, AiProvider::Gemini];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Anthropic => "anthropic",
            AiProvider::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "anthropic" => Ok(AiProvider::Anthropic),
            "gemini" => Ok(AiProvider::Gemini),
            _ => Err(unknown("AI provider", s)),
        }
    }
}

/// State of one article on one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Pending,
    Published,
    Failed,
}

impl PublicationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PublicationStatus::Pending => "pending",
            PublicationStatus::Published => "published",
            PublicationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PublicationStatus::Pending),
            "published" => Ok(PublicationStatus::Published),
            "failed" => Ok(PublicationStatus::Failed),
            _ => Err(unknown("publication status", s)),
        }
    }
}

fn unknown(kind: &'static str, value: &str) -> CoreError {
    CoreError::UnknownVariant {
        kind,
        value: value.to_string(),
    }
}

/// Generate a URL-safe slug from an article title.
///
/// ASCII alphanumerics are lowercased and kept; every run of other
/// characters becomes a single `-`. The result never starts or ends with a
/// dash and is at most [`MAX_SLUG_LEN`] characters.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    slug
}

/// Trim and validate an article title.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTitle`] if the trimmed title is empty or
/// longer than [`MAX_TITLE_LEN`] characters.
pub fn validate_title(title: &str) -> Result<String, CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidTitle("title must not be empty".to_string()));
    }
    let len = trimmed.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(CoreError::InvalidTitle(format!(
            "title is {len} characters; maximum is {MAX_TITLE_LEN}"
        )));
    }
    Ok(trimmed.to_string())
}
