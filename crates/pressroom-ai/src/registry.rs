use std::collections::HashMap;
use std::sync::Arc;

use pressroom_core::{AiProvider, AppConfig};

use crate::anthropic::AnthropicClient;
use crate::error::AiError;
use crate::gemini::GeminiClient;
use crate::generator::{ClientSettings, ContentGenerator};
use crate::openai::OpenAiClient;

/// The configured generators, keyed by provider.
#[derive(Clone)]
pub struct GeneratorRegistry {
    generators: HashMap<AiProvider, Arc<dyn ContentGenerator>>,
    default_provider: AiProvider,
}

impl GeneratorRegistry {
    #[must_use]
    pub fn new(default_provider: AiProvider) -> Self {
        Self {
            generators: HashMap::new(),
            default_provider,
        }
    }

    /// Builds a client for every provider that has an API key.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AiError> {
        let settings = ClientSettings {
            // Long-form generation routinely takes longer than the general
            // HTTP timeout.
            timeout_secs: config.http_timeout_secs.max(120),
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
        };

        let mut registry = Self::new(config.ai.default_provider);
        for provider in AiProvider::ALL {
            let Some((api_key, model)) = config.ai.credentials(provider) else {
                continue;
            };
            let generator: Arc<dyn ContentGenerator> = match provider {
                AiProvider::OpenAi => Arc::new(OpenAiClient::new(api_key, model, settings)?),
                AiProvider::Anthropic => {
                    Arc::new(AnthropicClient::new(api_key, model, settings)?)
                }
                AiProvider::Gemini => Arc::new(GeminiClient::new(api_key, model, settings)?),
            };
            registry.insert(generator);
        }

        if !registry.is_configured(registry.default_provider) {
            tracing::warn!(
                provider = %registry.default_provider,
                "default AI provider has no API key configured"
            );
        }
        Ok(registry)
    }

    /// Registers `generator`, replacing any existing one for its provider.
    pub fn insert(&mut self, generator: Arc<dyn ContentGenerator>) {
        self.generators.insert(generator.provider(), generator);
    }

    /// # Errors
    ///
    /// Returns [`AiError::NotConfigured`] if the provider has no client.
    pub fn get(&self, provider: AiProvider) -> Result<Arc<dyn ContentGenerator>, AiError> {
        self.generators
            .get(&provider)
            .cloned()
            .ok_or(AiError::NotConfigured(provider))
    }

    /// Resolves `requested`, falling back to the default provider.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::NotConfigured`] if the resolved provider has no client.
    pub fn resolve(
        &self,
        requested: Option<AiProvider>,
    ) -> Result<Arc<dyn ContentGenerator>, AiError> {
        self.get(requested.unwrap_or(self.default_provider))
    }

    #[must_use]
    pub fn default_provider(&self) -> AiProvider {
        self.default_provider
    }

    #[must_use]
    pub fn is_configured(&self, provider: AiProvider) -> bool {
        self.generators.contains_key(&provider)
    }

    /// Configured providers in [`AiProvider::ALL`] order.
    #[must_use]
    pub fn configured(&self) -> Vec<AiProvider> {
        AiProvider::ALL
            .into_iter()
            .filter(|p| self.is_configured(*p))
            .collect()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("configured", &self.configured())
            .field("default_provider", &self.default_provider)
            .finish()
    }
}
