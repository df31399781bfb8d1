//! Anthropic Messages API client.

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

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    settings: ClientSettings,
}

impl AnthropicClient {
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, settings: ClientSettings) -> Result<Self, AiError> {
        Ok(Self {
            client: build_http_client(settings)?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: ANTHROPIC_API_URL.to_owned(),
            settings,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    async fn send(&self, prompt: &Prompt) -> Result<Completion, AiError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            system: &prompt.system,
            messages: [Message {
                role: "user",
                content: &prompt.user,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(AiProvider::Anthropic, response).await);
        }

        let body = response.text().await?;
        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|source| AiError::Deserialize {
                provider: AiProvider::Anthropic,
                source,
            })?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse {
                provider: AiProvider::Anthropic,
            });
        }

        Ok(Completion {
            text,
            usage: parsed.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }
}

#[async_trait]
impl ContentGenerator for AnthropicClient {
    fn provider(&self) -> AiProvider {
        AiProvider::Anthropic
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
