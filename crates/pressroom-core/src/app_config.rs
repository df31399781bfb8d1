use std::net::SocketAddr;

use crate::articles::{AiProvider, Platform};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

fn redact<T>(value: Option<&T>) -> Option<&'static str> {
    value.map(|_| "[redacted]")
}

/// Shopify store credentials. Only built when both the store domain and the
/// Admin API token are present.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// e.g. `"example.myshopify.com"`
    pub store_domain: String,
    pub admin_access_token: String,
    pub api_version: String,
    /// Public storefront root used for the `products.json` feed.
    pub storefront_url: String,
    /// Admin GraphQL gid of the blog articles are published into.
    pub default_blog_id: Option<String>,
    /// ISO 4217 code applied to feed prices, which carry no currency.
    pub currency_code: String,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store_domain", &self.store_domain)
            .field("admin_access_token", &"[redacted]")
            .field("api_version", &self.api_version)
            .field("storefront_url", &self.storefront_url)
            .field("default_blog_id", &self.default_blog_id)
            .field("currency_code", &self.currency_code)
            .finish()
    }
}

#[derive(Clone)]
pub struct AiConfig {
    pub default_provider: AiProvider,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl AiConfig {
    /// Returns the API key and model for `provider`, if a key is configured.
    #[must_use]
    pub fn credentials(&self, provider: AiProvider) -> Option<(&str, &str)> {
        let (key, model) = match provider {
            AiProvider::OpenAi => (&self.openai_api_key, &self.openai_model),
            AiProvider::Anthropic => (&self.anthropic_api_key, &self.anthropic_model),
            AiProvider::Gemini => (&self.gemini_api_key, &self.gemini_model),
        };
        key.as_deref().map(|k| (k, model.as_str()))
    }
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("default_provider", &self.default_provider)
            .field("openai_api_key", &redact(self.openai_api_key.as_ref()))
            .field("openai_model", &self.openai_model)
            .field("anthropic_api_key", &redact(self.anthropic_api_key.as_ref()))
            .field("anthropic_model", &self.anthropic_model)
            .field("gemini_api_key", &redact(self.gemini_api_key.as_ref()))
            .field("gemini_model", &self.gemini_model)
            .finish()
    }
}

#[derive(Clone)]
pub struct WordPressConfig {
    pub base_url: String,
    pub username: String,
    pub app_password: String,
}

#[derive(Clone)]
pub struct GhostConfig {
    pub base_url: String,
    /// `{key_id}:{hex_secret}` as issued by Ghost for a custom integration.
    pub admin_api_key: String,
}

#[derive(Clone)]
pub struct MediumConfig {
    pub integration_token: String,
}

#[derive(Clone)]
pub struct WebflowConfig {
    pub api_token: String,
    pub collection_id: String,
}

/// Credentials for the non-Shopify blogging platforms. Each entry is `Some`
/// only when every variable for that platform is set.
#[derive(Clone, Default)]
pub struct PlatformsConfig {
    pub wordpress: Option<WordPressConfig>,
    pub ghost: Option<GhostConfig>,
    pub medium: Option<MediumConfig>,
    pub webflow: Option<WebflowConfig>,
}

impl std::fmt::Debug for PlatformsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformsConfig")
            .field(
                "wordpress",
                &self.wordpress.as_ref().map(|w| w.base_url.as_str()),
            )
            .field("ghost", &self.ghost.as_ref().map(|g| g.base_url.as_str()))
            .field("medium", &redact(self.medium.as_ref()))
            .field(
                "webflow",
                &self.webflow.as_ref().map(|w| w.collection_id.as_str()),
            )
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub admin_password: Option<String>,
    pub session_secret: Option<String>,
    pub session_ttl_hours: u64,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub inter_request_delay_ms: u64,
    pub publish_delay_ms: u64,
    pub reconcile_cron: String,
    pub scheduled_publish_cron: String,
    pub shopify: Option<ShopifyConfig>,
    pub ai: AiConfig,
    pub platforms: PlatformsConfig,
}

impl AppConfig {
    #[must_use]
    pub fn shopify(&self) -> Option<&ShopifyConfig> {
        self.shopify.as_ref()
    }

    /// Returns `true` when every credential the platform needs is present.
    #[must_use]
    pub fn platform_configured(&self, platform: Platform) -> bool {
        match platform {
            Platform::Shopify => self.shopify.is_some(),
            Platform::WordPress => self.platforms.wordpress.is_some(),
            Platform::Ghost => self.platforms.ghost.is_some(),
            Platform::Medium => self.platforms.medium.is_some(),
            Platform::Webflow => self.platforms.webflow.is_some(),
        }
    }

    #[must_use]
    pub fn configured_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.platform_configured(*p))
            .collect()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("admin_password", &redact(self.admin_password.as_ref()))
            .field("session_secret", &redact(self.session_secret.as_ref()))
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("publish_delay_ms", &self.publish_delay_ms)
            .field("reconcile_cron", &self.reconcile_cron)
            .field("scheduled_publish_cron", &self.scheduled_publish_cron)
            .field("shopify", &self.shopify)
            .field("ai", &self.ai)
            .field("platforms", &self.platforms)
            .finish()
    }
}
