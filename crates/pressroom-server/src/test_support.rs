//! Shared fixtures for the server's unit and router tests.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use pressroom_core::{AiConfig, AiProvider, AppConfig, Environment, PlatformsConfig, ShopifyConfig};

/// Test config with no integrations configured.
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 5,
        admin_password: None,
        session_secret: None,
        session_ttl_hours: 24,
        http_timeout_secs: 5,
        user_agent: "pressroom-test".to_string(),
        max_retries: 0,
        retry_backoff_base_secs: 0,
        inter_request_delay_ms: 0,
        publish_delay_ms: 0,
        reconcile_cron: "0 0 3 * * *".to_string(),
        scheduled_publish_cron: "0 */5 * * * *".to_string(),
        shopify: None,
        ai: AiConfig {
            default_provider: AiProvider::OpenAi,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            anthropic_api_key: None,
            anthropic_model: "claude-3-5-sonnet-latest".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
        },
        platforms: PlatformsConfig::default(),
    }
}

/// [`test_config`] with a storefront feed served from `storefront_url`.
pub(crate) fn config_with_storefront(storefront_url: &str) -> AppConfig {
    AppConfig {
        shopify: Some(ShopifyConfig {
            store_domain: "tea.myshopify.com".to_string(),
            admin_access_token: "shpat_test".to_string(),
            api_version: "2024-10".to_string(),
            storefront_url: storefront_url.to_string(),
            default_blog_id: None,
            currency_code: "USD".to_string(),
        }),
        ..test_config()
    }
}
