pub mod app_config;
pub mod articles;
pub mod catalog;
pub mod config;
pub mod reconcile;

use thiserror::Error;

pub use app_config::{
    AiConfig, AppConfig, Environment, GhostConfig, MediumConfig, PlatformsConfig, ShopifyConfig,
    WebflowConfig, WordPressConfig,
};
pub use articles::{
    slugify, validate_title, AiProvider, ArticleStatus, Platform, PublicationStatus, MAX_SLUG_LEN,
    MAX_TITLE_LEN,
};
pub use catalog::{
    format_money, parse_price, select_price_range, NormalizedProduct, NormalizedVariant, PriceRange,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use reconcile::{
    reconcile_prices, PriceMismatch, PriceUpdate, ReconcileReport, StoredVariantPrice,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid price \"{value}\": {reason}")]
    InvalidPrice { value: String, reason: String },

    #[error("unknown {kind}: \"{value}\"")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("invalid title: {0}")]
    InvalidTitle(String),

    #[error("cannot move article from {from} to {to}")]
    InvalidTransition {
        from: ArticleStatus,
        to: ArticleStatus,
    },
}
