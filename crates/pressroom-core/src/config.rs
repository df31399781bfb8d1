use crate::app_config::{
    AiConfig, AppConfig, Environment, GhostConfig, MediumConfig, PlatformsConfig, ShopifyConfig,
    WebflowConfig, WordPressConfig,
};
use crate::articles::AiProvider;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    // Empty values are treated the same as unset ones.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("PRESSROOM_ENV", "development"));
    let bind_addr = parse_addr("PRESSROOM_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PRESSROOM_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("PRESSROOM_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("PRESSROOM_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("PRESSROOM_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let admin_password = optional("PRESSROOM_ADMIN_PASSWORD");
    let session_secret = optional("PRESSROOM_SESSION_SECRET");
    let session_ttl_hours = parse_u64("PRESSROOM_SESSION_TTL_HOURS", "168")?;
    if session_ttl_hours == 0 {
        return Err(invalid(
            "PRESSROOM_SESSION_TTL_HOURS",
            "must be at least 1; a zero TTL issues already-expired sessions".to_string(),
        ));
    }

    let http_timeout_secs = parse_u64("PRESSROOM_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PRESSROOM_USER_AGENT", "pressroom/0.1 (content-publishing)");
    let max_retries = parse_u32("PRESSROOM_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("PRESSROOM_RETRY_BACKOFF_BASE_SECS", "2")?;
    let inter_request_delay_ms = parse_u64("PRESSROOM_INTER_REQUEST_DELAY_MS", "250")?;
    let publish_delay_ms = parse_u64("PRESSROOM_PUBLISH_DELAY_MS", "1000")?;

    let reconcile_cron = or_default("PRESSROOM_RECONCILE_CRON", "0 0 3 * * *");
    let scheduled_publish_cron = or_default("PRESSROOM_SCHEDULED_PUBLISH_CRON", "0 */5 * * * *");

    let shopify = match (
        optional("SHOPIFY_STORE_DOMAIN"),
        optional("SHOPIFY_ADMIN_ACCESS_TOKEN"),
    ) {
        (Some(store_domain), Some(admin_access_token)) => {
            let store_domain = store_domain
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string();
            let storefront_url = optional("SHOPIFY_STOREFRONT_URL")
                .unwrap_or_else(|| format!("https://{store_domain}"));
            Some(ShopifyConfig {
                store_domain,
                admin_access_token,
                api_version: or_default("SHOPIFY_API_VERSION", "2024-10"),
                storefront_url,
                default_blog_id: optional("SHOPIFY_DEFAULT_BLOG_ID"),
                currency_code: or_default("SHOPIFY_CURRENCY_CODE", "USD").to_ascii_uppercase(),
            })
        }
        _ => None,
    };

    let default_provider_raw = or_default("PRESSROOM_AI_DEFAULT_PROVIDER", "openai");
    let default_provider = default_provider_raw
        .parse::<AiProvider>()
        .map_err(|e| invalid("PRESSROOM_AI_DEFAULT_PROVIDER", e.to_string()))?;

    let ai = AiConfig {
        default_provider,
        openai_api_key: optional("OPENAI_API_KEY"),
        openai_model: or_default("OPENAI_MODEL", "gpt-4o-mini"),
        anthropic_api_key: optional("ANTHROPIC_API_KEY"),
        anthropic_model: or_default("ANTHROPIC_MODEL", "claude-3-5-sonnet-latest"),
        gemini_api_key: optional("GEMINI_API_KEY"),
        gemini_model: or_default("GEMINI_MODEL", "gemini-1.5-flash"),
    };

    let wordpress = match (
        optional("WORDPRESS_URL"),
        optional("WORDPRESS_USERNAME"),
        optional("WORDPRESS_APP_PASSWORD"),
    ) {
        (Some(base_url), Some(username), Some(app_password)) => Some(WordPressConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            app_password,
        }),
        _ => None,
    };

    let ghost = match (optional("GHOST_URL"), optional("GHOST_ADMIN_API_KEY")) {
        (Some(base_url), Some(admin_api_key)) => {
            if !admin_api_key.contains(':') {
                return Err(invalid(
                    "GHOST_ADMIN_API_KEY",
                    "expected \"{id}:{secret}\"".to_string(),
                ));
            }
            Some(GhostConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                admin_api_key,
            })
        }
        _ => None,
    };

    let medium =
        optional("MEDIUM_INTEGRATION_TOKEN").map(|integration_token| MediumConfig {
            integration_token,
        });

    let webflow = match (
        optional("WEBFLOW_API_TOKEN"),
        optional("WEBFLOW_COLLECTION_ID"),
    ) {
        (Some(api_token), Some(collection_id)) => Some(WebflowConfig {
            api_token,
            collection_id,
        }),
        _ => None,
    };

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        admin_password,
        session_secret,
        session_ttl_hours,
        http_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        inter_request_delay_ms,
        publish_delay_ms,
        reconcile_cron,
        scheduled_publish_cron,
        shopify,
        ai,
        platforms: PlatformsConfig {
            wordpress,
            ghost,
            medium,
            webflow,
        },
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
