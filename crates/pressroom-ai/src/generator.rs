use async_trait::async_trait;
use pressroom_core::AiProvider;
use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::prompt::Prompt;

/// Output cap sent with every completion request.
pub(crate) const MAX_OUTPUT_TOKENS: u32 = 4096;
pub(crate) const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// A text-completion backend.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn provider(&self) -> AiProvider;

    fn model(&self) -> &str;

    /// Sends `prompt` and returns the model's text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] on transport, auth, rate-limit, or API failure,
    /// and [`AiError::EmptyResponse`] when the model returns no text.
    async fn complete(&self, prompt: &Prompt) -> Result<Completion, AiError>;
}

/// Shared HTTP settings for provider clients.
#[derive(Debug, Clone, Copy)]
pub struct ClientSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 2,
            backoff_base_secs: 2,
        }
    }
}

pub(crate) fn build_http_client(settings: ClientSettings) -> Result<reqwest::Client, AiError> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(settings.timeout_secs))
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()?)
}
