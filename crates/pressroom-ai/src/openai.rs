//! OpenAI chat completions client.

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

const OPENAI_API_URL: &str = "https://api.openai.com";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    settings: ClientSettings,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, settings: ClientSettings) -> Result<Self, AiError> {
        Ok(Self {
            client: build_http_client(settings)?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: OPENAI_API_URL.to_owned(),
            settings,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    async fn send(&self, prompt: &Prompt) -> Result<Completion, AiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(AiProvider::OpenAi, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|source| AiError::Deserialize {
                provider: AiProvider::OpenAi,
                source,
            })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(AiError::EmptyResponse {
                provider: AiProvider::OpenAi,
            })?;

        Ok(Completion {
            text,
            usage: parsed.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[async_trait]
impl ContentGenerator for OpenAiClient {
    fn provider(&self) -> AiProvider {
        AiProvider::OpenAi
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
