//! Publishing CMS articles to Shopify, WordPress, Ghost, Medium, and Webflow.

pub mod error;
pub mod markdown;
pub mod platforms;
pub mod post;
pub mod publisher;
pub mod service;

pub use error::PublishError;
pub use markdown::{plain_text_excerpt, reading_time_minutes, render_html, strip_leading_title};
pub use platforms::{
    GhostPublisher, MediumPublisher, ShopifyPublisher, WebflowPublisher, WordPressPublisher,
};
pub use post::{ArticleContent, PublishPost};
pub use publisher::{BlogPublisher, RemotePost};
pub use service::{BlogIntegrationService, PlatformOutcome};
