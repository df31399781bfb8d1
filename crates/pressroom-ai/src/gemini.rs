//! Gemini `generateContent` client.

use async_trait::async_trait;
use pressroom_core::AiProvider;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{error_from_response, AiError};
use crate::generator::{
    build_http_client, ClientSettings, Completion, ContentGenerator, TokenUsage,
    MAX_OUTPUT_TOKENS, TEMPERATURE,
};
use crate::prompt::Prompt;
use crate::retry::retry_with_backoff;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    settings: ClientSettings,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, settings: ClientSettings) -> Result<Self, AiError> {
        Ok(Self {
            client: build_http_client(settings)?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: GEMINI_API_URL.to_owned(),
            settings,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    async fn send(&self, prompt: &Prompt) -> Result<Completion, AiError> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part {
                    text: &prompt.system,
                }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: &prompt.user }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(AiProvider::Gemini, response).await);
        }

        let body = response.text().await?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|source| AiError::Deserialize {
                provider: AiProvider::Gemini,
                source,
            })?;

        // Blocked prompts come back as a candidate with no content.
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse {
                provider: AiProvider::Gemini,
            });
        }

        Ok(Completion {
            text,
            usage: parsed.usage_metadata.map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            }),
        })
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    fn provider(&self) -> AiProvider {
        AiProvider::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &Prompt) -> Result<Completion, AiError> {
        retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_secs,
            || self.send(prompt),
        )
        .await
    }
}
