//! WordPress REST API (`/wp-json/wp/v2`) with application-password auth.

use async_trait::async_trait;
use pressroom_core::Platform;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::PublishError;
use crate::platforms::{build_client, read_json};
use crate::post::PublishPost;
use crate::publisher::{BlogPublisher, RemotePost};

#[derive(Debug, Serialize)]
struct PostBody<'a> {
    title: &'a str,
    content: &'a str,
    excerpt: &'a str,
    slug: &'a str,
    status: &'static str,
    tags: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    id: u64,
    #[serde(default)]
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    name: String,
}

/// Error body returned when creating a tag that already exists.
#[derive(Debug, Deserialize)]
struct TermExists {
    code: String,
    data: TermExistsData,
}

#[derive(Debug, Deserialize)]
struct TermExistsData {
    term_id: u64,
}

pub struct WordPressPublisher {
    client: reqwest::Client,
    base_url: String,
    username: String,
    app_password: String,
}

impl WordPressPublisher {
    /// # Errors
    ///
    /// Returns [`PublishError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        username: &str,
        app_password: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, PublishError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            username: username.to_owned(),
            app_password: app_password.to_owned(),
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{path}", self.base_url)
    }

    /// Resolves tag names to ids, creating missing tags.
    async fn tag_ids(&self, names: &[String]) -> Result<Vec<u64>, PublishError> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(self.tag_id(name).await?);
        }
        Ok(ids)
    }

    async fn tag_id(&self, name: &str) -> Result<u64, PublishError> {
        let response = self
            .client
            .get(self.api("tags"))
            .basic_auth(&self.username, Some(&self.app_password))
            .query(&[("search", name), ("per_page", "100")])
            .send()
            .await?;
        let existing: Vec<Tag> = read_json(Platform::WordPress, response).await?;
        if let Some(tag) = existing.iter().find(|t| t.name.eq_ignore_ascii_case(name)) {
            return Ok(tag.id);
        }

        let response = self
            .client
            .post(self.api("tags"))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;

        // Search is fuzzy on some installs; a create that collides reports the
        // existing id instead.
        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await?;
            return match serde_json::from_str::<TermExists>(&body) {
                Ok(exists) if exists.code == "term_exists" => Ok(exists.data.term_id),
                _ => Err(PublishError::Api {
                    platform: Platform::WordPress,
                    status: 400,
                    message: crate::error::error_message(&body),
                }),
            };
        }

        let created: Tag = read_json(Platform::WordPress, response).await?;
        Ok(created.id)
    }

    async fn send_post(&self, url: String, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let tags = self.tag_ids(&post.tags).await?;
        let body = PostBody {
            title: &post.title,
            content: &post.body_html,
            excerpt: &post.excerpt,
            slug: &post.slug,
            status: if post.draft { "draft" } else { "publish" },
            tags,
        };

        let response = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&body)
            .send()
            .await?;
        let created: PostResponse = read_json(Platform::WordPress, response).await?;

        Ok(RemotePost {
            remote_id: created.id.to_string(),
            url: created.link,
        })
    }
}

#[async_trait]
impl BlogPublisher for WordPressPublisher {
    fn platform(&self) -> Platform {
        Platform::WordPress
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn publish(&self, post: &PublishPost) -> Result<RemotePost, PublishError> {
        self.send_post(self.api("posts"), post).await
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn update(&self, remote_id: &str, post: &PublishPost) -> Result<RemotePost, PublishError> {
        self.send_post(self.api(&format!("posts/{remote_id}")), post).await
    }

    async fn verify(&self) -> Result<String, PublishError> {
        let response = self
            .client
            .get(self.api("users/me"))
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?;
        let user: UserResponse = read_json(Platform::WordPress, response).await?;
        Ok(user.name)
    }
}
