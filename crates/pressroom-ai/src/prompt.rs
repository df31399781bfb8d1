//! Prompt construction for article generation.

use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::LazyLock;

use pressroom_core::NormalizedProduct;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

pub const MIN_WORD_COUNT: u32 = 300;
pub const MAX_WORD_COUNT: u32 = 3000;
pub const DEFAULT_WORD_COUNT: u32 = 900;

const MAX_DESCRIPTION_CHARS: usize = 1200;
const MAX_KEYWORDS: usize = 12;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tag regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Informative,
    Conversational,
    Persuasive,
    Professional,
}

impl Tone {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Informative => "informative",
            Tone::Conversational => "conversational",
            Tone::Persuasive => "persuasive",
            Tone::Professional => "professional",
        }
    }

    fn guidance(self) -> &'static str {
        match self {
            Tone::Informative => {
                "Teach the reader. Prefer concrete facts and practical steps over hype."
            }
            Tone::Conversational => {
                "Write as if talking to a friend: second person, short sentences, light humour."
            }
            Tone::Persuasive => {
                "Make a clear case for the product or idea and close with a call to action."
            }
            Tone::Professional => {
                "Keep a measured, authoritative voice suitable for a business audience."
            }
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "informative" => Ok(Tone::Informative),
            "conversational" => Ok(Tone::Conversational),
            "persuasive" => Ok(Tone::Persuasive),
            "professional" => Ok(Tone::Professional),
            other => Err(AiError::InvalidRequest(format!("unknown tone '{other}'"))),
        }
    }
}

/// Product facts the article should be written around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductContext {
    pub title: String,
    /// Display string, e.g. `"$12.99 – $24.99"`.
    pub price_range: Option<String>,
    /// Plain text, already stripped of markup.
    pub description: Option<String>,
    pub url: Option<String>,
}

impl ProductContext {
    #[must_use]
    pub fn from_product(product: &NormalizedProduct) -> Self {
        Self {
            title: product.title.clone(),
            price_range: product.price_range().map(|r| r.display()),
            description: product
                .description_html
                .as_deref()
                .map(html_to_text)
                .filter(|t| !t.is_empty()),
            url: product.source_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub target_word_count: Option<u32>,
    #[serde(default)]
    pub product: Option<ProductContext>,
}

impl GenerationRequest {
    /// Target length clamped to `300..=3000`; 900 when unset.
    #[must_use]
    pub fn word_count(&self) -> u32 {
        self.target_word_count
            .unwrap_or(DEFAULT_WORD_COUNT)
            .clamp(MIN_WORD_COUNT, MAX_WORD_COUNT)
    }

    fn keywords(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for keyword in self.keywords.iter().map(|k| k.trim()) {
            if !keyword.is_empty() && !seen.iter().any(|s| s.eq_ignore_ascii_case(keyword)) {
                seen.push(keyword);
            }
        }
        seen.truncate(MAX_KEYWORDS);
        seen
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds the system and user prompt for `request`.
///
/// # Errors
///
/// Returns [`AiError::InvalidRequest`] when the topic is blank.
pub fn build_prompt(request: &GenerationRequest) -> Result<Prompt, AiError> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(AiError::InvalidRequest("topic must not be empty".into()));
    }

    let system = format!(
        "You are an experienced e-commerce content writer producing blog articles for an \
         online store. {tone_guidance}\n\n\
         Respond with a single JSON object and nothing else, using exactly these keys:\n\
         {{\"title\": string, \"excerpt\": string, \"body_markdown\": string, \
         \"tags\": [string], \"seo_title\": string, \"seo_description\": string}}\n\
         The body is GitHub-flavoured Markdown without a top-level `#` heading. \
         The excerpt is one or two sentences. seo_title is at most 60 characters and \
         seo_description at most 155 characters.",
        tone_guidance = request.tone.guidance()
    );

    let mut user = format!(
        "Write a {tone} blog article of about {words} words on the topic: {topic}",
        tone = request.tone,
        words = request.word_count()
    );

    let keywords = request.keywords();
    if !keywords.is_empty() {
        let _ = write!(
            user,
            "\n\nWork these keywords in naturally: {}.",
            keywords.join(", ")
        );
    }

    if let Some(product) = &request.product {
        let _ = write!(user, "\n\nFeature this product:\n- Name: {}", product.title);
        if let Some(price) = &product.price_range {
            let _ = write!(user, "\n- Price: {price}");
        }
        if let Some(description) = &product.description {
            let _ = write!(
                user,
                "\n- Description: {}",
                truncate_chars(description, MAX_DESCRIPTION_CHARS)
            );
        }
        if let Some(url) = &product.url {
            let _ = write!(user, "\n- Link to it as: {url}");
        }
        user.push_str("\nDo not invent prices, ingredients, or claims beyond these facts.");
    }

    Ok(Prompt { system, user })
}

/// Strips tags and collapses whitespace.
pub(crate) fn html_to_text(html: &str) -> String {
    let without_tags = HTML_TAG.replace_all(html, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    if let Some(idx) = cut.rfind(' ') {
        cut.truncate(idx);
    }
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(topic: &str) -> GenerationRequest {
        GenerationRequest {
            topic: topic.to_owned(),
            ..GenerationRequest::default()
        }
    }

    #[test]
    fn word_count_is_clamped() {
        let mut req = request("tea");
        assert_eq!(req.word_count(), 900);
        req.target_word_count = Some(50);
        assert_eq!(req.word_count(), 300);
        req.target_word_count = Some(10_000);
        assert_eq!(req.word_count(), 3000);
        req.target_word_count = Some(1200);
        assert_eq!(req.word_count(), 1200);
    }

    #[test]
    fn blank_topic_is_rejected() {
        assert!(matches!(
            build_prompt(&request("   ")),
            Err(AiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn prompt_includes_tone_keywords_and_product() {
        let req = GenerationRequest {
            topic: "Cold brewing green tea".to_owned(),
            keywords: vec![
                "cold brew".to_owned(),
                "Cold Brew".to_owned(),
                " ".to_owned(),
                "sencha".to_owned(),
            ],
            tone: Tone::Conversational,
            target_word_count: Some(600),
            product: Some(ProductContext {
                title: "Sencha Tin".to_owned(),
                price_range: Some("$12.99".to_owned()),
                description: Some("Steamed leaves from Shizuoka.".to_owned()),
                url: Some("https://tea.example.com/products/sencha".to_owned()),
            }),
        };
        let prompt = build_prompt(&req).unwrap();

        assert!(prompt.system.contains("\"body_markdown\""));
        assert!(prompt.system.contains("second person"));
        assert!(prompt
            .user
            .starts_with("Write a conversational blog article of about 600 words"));
        assert!(prompt.user.contains("keywords in naturally: cold brew, sencha."));
        assert!(prompt.user.contains("- Name: Sencha Tin"));
        assert!(prompt.user.contains("- Price: $12.99"));
        assert!(prompt
            .user
            .contains("- Link to it as: https://tea.example.com/products/sencha"));
    }

    #[test]
    fn tone_parses_case_insensitively() {
        assert_eq!("Persuasive".parse::<Tone>().unwrap(), Tone::Persuasive);
        assert!("snarky".parse::<Tone>().is_err());
    }

    #[test]
    fn html_is_flattened_to_text() {
        assert_eq!(
            html_to_text("<p>Roasted  rice &amp; <b>green</b> tea.</p>\n<p>Nutty.</p>"),
            "Roasted rice & green tea. Nutty."
        );
    }

    #[test]
    fn long_descriptions_are_truncated_on_a_word() {
        let text = "word ".repeat(400);
        let cut = truncate_chars(text.trim(), 20);
        assert_eq!(cut, "word word word word…");
    }
}
