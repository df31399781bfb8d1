//! Medium integration-token API. Medium has no edit endpoint, so only
//! creation is supported.

use async_trait::async_trait;
use pressroom_core::Platform;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::PublishError;
use crate::platforms::{build_client, read_json};
use crate::post::PublishPost;
use crate::publisher::{BlogPublisher, RemotePost};

const MEDIUM_API_URL: &str = "https://api.medium.com";
const MAX_TAGS: usize = 5;
const MAX_TAG_CHARS: usize = 25;

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct MediumUser {
    id: String,
    username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePost<'a> {
    title: &'a str,
    content_format: &'static str,
    content: String,
    tags: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_url: Option<&'a str>,
    publish_status: &'static str,
}

#[derive(Debug, Deserialize)]
struct MediumPost {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

pub struct MediumPublisher {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl MediumPublisher {
    /// # Errors
    ///
    /// Returns [`PublishError::Http`] if the HTTP client cannot be built.
    pub fn new(integration_token: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, PublishError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: MEDIUM_API_URL.to_owned(),
            token: integration_token.to_owned(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    async fn me(&self) -> Result<MediumUser, PublishError> {
        let response = self
            .client
            .get(format!("{}/v1/me", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let envelope: DataEnvelope<MediumUser> = read_json(Platform::Medium, response).await?;
        Ok(envelope.data)
    }
}

/// Medium accepts at most five tags of 25 characters each; longer tags are
/// dropped rather than cut.
fn medium_tags(tags: &[String]) -> Vec<&str> {
    tags.iter()
        .map(String::as_str)
        .filter(|t| t.chars().count() <= MAX_TAG_CHARS)
        .take(MAX_TAGS)
        .collect()
}

#[async_trait]
impl BlogPublisher for MediumPublisher {
    fn platform(&self) -> Platform {
        Platform::Medium
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn publish(&self, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let user = self.me().await?;

        let body = CreatePost {
            title: &post.title,
            content_format: "markdown",
            content: format!("# {}\n\n{}", post.title, post.body_markdown),
            tags: medium_tags(&post.tags),
            canonical_url: post.canonical_url.as_deref(),
            publish_status: if post.draft { "draft" } else { "public" },
        };

        let response = self
            .client
            .post(format!("{}/v1/users/{}/posts", self.base_url, user.id))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let created: DataEnvelope<MediumPost> = read_json(Platform::Medium, response).await?;

        Ok(RemotePost {
            remote_id: created.data.id,
            url: created.data.url,
        })
    }

    async fn verify(&self) -> Result<String, PublishError> {
        Ok(format!("@{}", self.me().await?.username))
    }
}
