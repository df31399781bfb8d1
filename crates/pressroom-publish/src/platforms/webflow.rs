//! Webflow CMS Data API v2.
//!
//! The target collection must have `post-body` (rich text) and
//! `post-summary` (plain text) fields, as the Webflow blog template does.

use async_trait::async_trait;
use pressroom_core::Platform;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::PublishError;
use crate::platforms::{build_client, read_json};
use crate::post::PublishPost;
use crate::publisher::{BlogPublisher, RemotePost};

const WEBFLOW_API_URL: &str = "https://api.webflow.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    is_archived: bool,
    is_draft: bool,
    field_data: FieldData<'a>,
}

#[derive(Debug, Serialize)]
struct FieldData<'a> {
    name: &'a str,
    slug: &'a str,
    #[serde(rename = "post-body")]
    post_body: &'a str,
    #[serde(rename = "post-summary")]
    post_summary: &'a str,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Collection {
    display_name: String,
}

pub struct WebflowPublisher {
    client: reqwest::Client,
    base_url: String,
    token: String,
    collection_id: String,
}

impl WebflowPublisher {
    /// # Errors
    ///
    /// Returns [`PublishError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_token: &str,
        collection_id: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, PublishError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: WEBFLOW_API_URL.to_owned(),
            token: api_token.to_owned(),
            collection_id: collection_id.to_owned(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    fn items_url(&self) -> String {
        format!("{}/v2/collections/{}/items", self.base_url, self.collection_id)
    }

    fn body(post: &PublishPost) -> ItemBody<'_> {
        ItemBody {
            is_archived: false,
            is_draft: post.draft,
            field_data: FieldData {
                name: &post.title,
                slug: &post.slug,
                post_body: &post.body_html,
                post_summary: &post.excerpt,
            },
        }
    }
}

#[async_trait]
impl BlogPublisher for WebflowPublisher {
    fn platform(&self) -> Platform {
        Platform::Webflow
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn publish(&self, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let response = self
            .client
            .post(self.items_url())
            .bearer_auth(&self.token)
            .json(&Self::body(post))
            .send()
            .await?;
        let item: Item = read_json(Platform::Webflow, response).await?;

        Ok(RemotePost {
            remote_id: item.id,
            url: None,
        })
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn update(&self, remote_id: &str, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let response = self
            .client
            .patch(format!("{}/{remote_id}", self.items_url()))
            .bearer_auth(&self.token)
            .json(&Self::body(post))
            .send()
            .await?;
        let item: Item = read_json(Platform::Webflow, response).await?;

        Ok(RemotePost {
            remote_id: item.id,
            url: None,
        })
    }

    async fn verify(&self) -> Result<String, PublishError> {
        let response = self
            .client
            .get(format!("{}/v2/collections/{}", self.base_url, self.collection_id))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let collection: Collection = read_json(Platform::Webflow, response).await?;
        Ok(collection.display_name)
    }
}
