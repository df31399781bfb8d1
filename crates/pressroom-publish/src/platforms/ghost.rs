//! Ghost Admin API.
//!
//! Requests carry `Authorization: Ghost <jwt>`, an HS256 token signed with
//! the hex-decoded secret half of the `{id}:{secret}` admin key, `kid` set
//! to the id, audience `/admin/` and a five-minute lifetime.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use pressroom_core::Platform;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::instrument;

use crate::error::PublishError;
use crate::platforms::{build_client, read_json};
use crate::post::PublishPost;
use crate::publisher::{BlogPublisher, RemotePost};

const TOKEN_LIFETIME_SECS: i64 = 300;
const ACCEPT_VERSION: &str = "v5.0";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize)]
struct PostsEnvelope<T> {
    posts: [T; 1],
}

#[derive(Debug, Serialize)]
struct GhostPostBody<'a> {
    title: &'a str,
    html: &'a str,
    slug: &'a str,
    status: &'static str,
    tags: Vec<GhostTag<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_excerpt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feature_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct GhostTag<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostsResponse {
    posts: Vec<GhostPost>,
}

#[derive(Debug, Deserialize)]
struct GhostPost {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SiteResponse {
    site: Site,
}

#[derive(Debug, Deserialize)]
struct Site {
    title: String,
}

pub struct GhostPublisher {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    secret: Vec<u8>,
}

impl GhostPublisher {
    /// # Errors
    ///
    /// Returns [`PublishError::InvalidCredentials`] if the admin key is not
    /// `{id}:{hex secret}`, or [`PublishError::Http`] if the HTTP client
    /// cannot be built.
    pub fn new(
        base_url: &str,
        admin_api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, PublishError> {
        let invalid = |reason: &str| PublishError::InvalidCredentials {
            platform: Platform::Ghost,
            reason: reason.to_owned(),
        };
        let (key_id, secret_hex) = admin_api_key
            .split_once(':')
            .ok_or_else(|| invalid("admin API key must be '{id}:{secret}'"))?;
        if key_id.is_empty() {
            return Err(invalid("admin API key id is empty"));
        }
        let secret = hex::decode(secret_hex).map_err(|_| invalid("admin API secret is not hex"))?;

        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            key_id: key_id.to_owned(),
            secret,
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}/ghost/api/admin/{path}", self.base_url)
    }

    fn authorization(&self) -> Result<String, PublishError> {
        let token = admin_token(&self.key_id, &self.secret, chrono::Utc::now().timestamp())?;
        Ok(format!("Ghost {token}"))
    }

    fn body<'a>(post: &'a PublishPost, updated_at: Option<String>) -> PostsEnvelope<GhostPostBody<'a>> {
        PostsEnvelope {
            posts: [GhostPostBody {
                title: &post.title,
                html: &post.body_html,
                slug: &post.slug,
                status: if post.draft { "draft" } else { "published" },
                tags: post.tags.iter().map(|name| GhostTag { name: name.as_str() }).collect(),
                custom_excerpt: Some(post.excerpt.as_str()).filter(|e| !e.is_empty()),
                feature_image: post.featured_image_url.as_deref(),
                published_at: post.published_at.map(|d| d.to_rfc3339()),
                updated_at,
            }],
        }
    }

    fn first_post(platform_response: PostsResponse) -> Result<GhostPost, PublishError> {
        platform_response
            .posts
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::Rejected {
                platform: Platform::Ghost,
                message: "response contained no post".to_owned(),
            })
    }
}

/// Builds the HS256 admin JWT issued at `issued_at` (unix seconds).
pub(crate) fn admin_token(key_id: &str, secret: &[u8], issued_at: i64) -> Result<String, PublishError> {
    let header = serde_json::json!({ "alg": "HS256", "typ": "JWT", "kid": key_id });
    let claims = serde_json::json!({
        "iat": issued_at,
        "exp": issued_at + TOKEN_LIFETIME_SECS,
        "aud": "/admin/",
    });

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    );

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| PublishError::InvalidCredentials {
        platform: Platform::Ghost,
        reason: "admin API secret has an invalid length".to_owned(),
    })?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

#[async_trait]
impl BlogPublisher for GhostPublisher {
    fn platform(&self) -> Platform {
        Platform::Ghost
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn publish(&self, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let response = self
            .client
            .post(self.api("posts/"))
            .query(&[("source", "html")])
            .header(reqwest::header::AUTHORIZATION, self.authorization()?)
            .header("Accept-Version", ACCEPT_VERSION)
            .json(&Self::body(post, None))
            .send()
            .await?;
        let created = Self::first_post(read_json(Platform::Ghost, response).await?)?;

        Ok(RemotePost {
            remote_id: created.id,
            url: created.url,
        })
    }

    /// Ghost rejects edits without the post's current `updated_at`, so it is
    /// fetched first.
    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn update(&self, remote_id: &str, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let response = self
            .client
            .get(self.api(&format!("posts/{remote_id}/")))
            .header(reqwest::header::AUTHORIZATION, self.authorization()?)
            .header("Accept-Version", ACCEPT_VERSION)
            .send()
            .await?;
        let current = Self::first_post(read_json(Platform::Ghost, response).await?)?;

        let response = self
            .client
            .put(self.api(&format!("posts/{remote_id}/")))
            .query(&[("source", "html")])
            .header(reqwest::header::AUTHORIZATION, self.authorization()?)
            .header("Accept-Version", ACCEPT_VERSION)
            .json(&Self::body(post, current.updated_at))
            .send()
            .await?;
        let updated = Self::first_post(read_json(Platform::Ghost, response).await?)?;

        Ok(RemotePost {
            remote_id: updated.id,
            url: updated.url,
        })
    }

    async fn verify(&self) -> Result<String, PublishError> {
        let response = self
            .client
            .get(self.api("site/"))
            .header(reqwest::header::AUTHORIZATION, self.authorization()?)
            .header("Accept-Version", ACCEPT_VERSION)
            .send()
            .await?;
        let site: SiteResponse = read_json(Platform::Ghost, response).await?;
        Ok(site.site.title)
    }
}
