//! Offline unit tests for pressroom-db pool configuration and row helpers.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Utc;
use pressroom_core::{
    AiConfig, AiProvider, AppConfig, ArticleStatus, Environment, PlatformsConfig,
};
use pressroom_db::{ArticleChanges, ArticleRow, DbError, PoolConfig, VariantRow};
use rust_decimal::Decimal;
use uuid::Uuid;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        admin_password: None,
        session_secret: None,
        session_ttl_hours: 168,
        http_timeout_secs: 30,
        user_agent: "ua".to_string(),
        max_retries: 3,
        retry_backoff_base_secs: 2,
        inter_request_delay_ms: 250,
        publish_delay_ms: 1000,
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

fn article_row(status: &str) -> ArticleRow {
    ArticleRow {
        id: 1,
        public_id: Uuid::new_v4(),
        title: "Brewing Oolong".to_string(),
        slug: "brewing-oolong".to_string(),
        excerpt: None,
        body_markdown: "Steep twice.".to_string(),
        featured_image_url: None,
        tags: vec![],
        seo_title: None,
        seo_description: None,
        author_name: None,
        status: status.to_string(),
        scheduled_for: None,
        published_at: None,
        product_id: None,
        ai_provider: None,
        ai_model: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn article_row_parses_known_status() {
    let row = article_row("scheduled");
    assert_eq!(row.article_status().unwrap(), ArticleStatus::Scheduled);
}

#[test]
fn article_row_rejects_unknown_status() {
    let row = article_row("pending-review");
    assert!(matches!(row.article_status(), Err(DbError::InvalidData(_))));
}

#[test]
fn empty_changes_are_detected() {
    assert!(ArticleChanges::default().is_empty());
    let changes = ArticleChanges {
        tags: Some(vec!["tea".to_string()]),
        ..ArticleChanges::default()
    };
    assert!(!changes.is_empty());
}

#[test]
fn variant_row_converts_to_normalized() {
    let row = VariantRow {
        id: 5,
        product_id: 2,
        source_variant_id: "4401".to_string(),
        sku: Some("OOL-50".to_string()),
        title: "50g".to_string(),
        price: Decimal::new(1299, 2),
        compare_at_price: None,
        currency_code: "USD".to_string(),
        is_available: true,
        is_default: true,
        position: Some(1),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let normalized = row.to_normalized();
    assert_eq!(normalized.source_variant_id, "4401");
    assert_eq!(normalized.price, Decimal::new(1299, 2));
    assert!(normalized.is_default);
}
