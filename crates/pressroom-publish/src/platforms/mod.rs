//! One [`crate::BlogPublisher`] per platform.

pub mod ghost;
pub mod medium;
pub mod shopify;
pub mod webflow;
pub mod wordpress;

use std::time::Duration;

use pressroom_core::Platform;
use serde::de::DeserializeOwned;

use crate::error::{error_message, PublishError};

pub use ghost::GhostPublisher;
pub use medium::MediumPublisher;
pub use shopify::ShopifyPublisher;
pub use webflow::WebflowPublisher;
pub use wordpress::WordPressPublisher;

pub(crate) fn build_client(timeout_secs: u64, user_agent: &str) -> Result<reqwest::Client, PublishError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?)
}

/// Maps the status and decodes a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    platform: Platform,
    response: reqwest::Response,
) -> Result<T, PublishError> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(PublishError::Unauthorized {
            platform,
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    if !status.is_success() {
        return Err(PublishError::Api {
            platform,
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| PublishError::Deserialize { platform, source })
}
