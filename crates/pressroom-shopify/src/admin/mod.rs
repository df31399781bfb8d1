//! Admin GraphQL client for blogs and articles.

mod articles;
mod queries;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ShopifyError;
use crate::retry::retry_with_backoff;

pub use articles::{ArticleImageInput, ArticleInput, AuthorInput, CmsArticle};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const BLOG_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    /// Admin gid, e.g. `"gid://shopify/Blog/123"`.
    pub id: String,
    pub title: String,
    pub handle: String,
}

/// An article as returned by `articleCreate`/`articleUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopifyArticle {
    pub id: String,
    pub handle: String,
    pub blog_handle: String,
    /// Public storefront URL of the article.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorExtensions {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserError {
    #[serde(default)]
    field: Option<Vec<String>>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BlogsData {
    blogs: Connection<Blog>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleCreateData {
    article_create: ArticlePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleUpdateData {
    article_update: ArticlePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticlePayload {
    article: Option<ArticleNode>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct ArticleNode {
    id: String,
    handle: String,
    blog: BlogHandle,
}

#[derive(Debug, Deserialize)]
struct BlogHandle {
    handle: String,
}

#[derive(Debug, Deserialize)]
struct ShopData {
    shop: ShopName,
}

#[derive(Debug, Deserialize)]
struct ShopName {
    name: String,
}

/// Client for `POST {base}/admin/api/{version}/graphql.json`.
///
/// Read queries are retried on transient errors; mutations are sent once.
pub struct AdminClient {
    client: Client,
    base_url: String,
    storefront_url: String,
    api_version: String,
    access_token: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl AdminClient {
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        store_domain: &str,
        access_token: &str,
        api_version: &str,
        timeout_secs: u64,
    ) -> Result<Self, ShopifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = format!("https://{}", store_domain.trim_end_matches('/'));
        Ok(Self {
            client,
            storefront_url: base_url.clone(),
            base_url,
            api_version: api_version.to_owned(),
            access_token: access_token.to_owned(),
            max_retries: 0,
            backoff_base_secs: 0,
        })
    }

    /// Points the client at a different host, e.g. a mock server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    /// Sets the public storefront root used to build article URLs.
    #[must_use]
    pub fn with_storefront_url(mut self, storefront_url: &str) -> Self {
        self.storefront_url = storefront_url.trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_secs: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_secs = backoff_base_secs;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/admin/api/{}/graphql.json",
            self.base_url, self.api_version
        )
    }

    /// Lists the store's blogs (first 50).
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError`] on HTTP, auth, or GraphQL failure.
    #[tracing::instrument(skip(self))]
    pub async fn list_blogs(&self) -> Result<Vec<Blog>, ShopifyError> {
        let data: BlogsData = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.execute(queries::LIST_BLOGS, json!({ "first": BLOG_PAGE_SIZE }))
        })
        .await?;
        Ok(data.blogs.nodes)
    }

    /// Returns the shop's name; used to verify credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError`] on HTTP, auth, or GraphQL failure.
    pub async fn shop_name(&self) -> Result<String, ShopifyError> {
        let data: ShopData = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.execute(queries::SHOP_NAME, json!({}))
        })
        .await?;
        Ok(data.shop.name)
    }

    /// Creates an article. Not retried.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::UserErrors`] if Shopify rejects the input, or
    /// any other [`ShopifyError`] on transport/GraphQL failure.
    #[tracing::instrument(skip(self, input), fields(handle = %input.handle))]
    pub async fn create_article(&self, input: &ArticleInput) -> Result<ShopifyArticle, ShopifyError> {
        let data: ArticleCreateData = self
            .execute(queries::ARTICLE_CREATE, json!({ "article": input }))
            .await?;
        self.into_article(data.article_create)
    }

    /// Updates an existing article by gid. Not retried.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_article`].
    #[tracing::instrument(skip(self, input), fields(handle = %input.handle))]
    pub async fn update_article(
        &self,
        id: &str,
        input: &ArticleInput,
    ) -> Result<ShopifyArticle, ShopifyError> {
        let data: ArticleUpdateData = self
            .execute(queries::ARTICLE_UPDATE, json!({ "id": id, "article": input }))
            .await?;
        self.into_article(data.article_update)
    }

    fn into_article(&self, payload: ArticlePayload) -> Result<ShopifyArticle, ShopifyError> {
        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserErrors(join_user_errors(&payload.user_errors)));
        }
        let node = payload
            .article
            .ok_or_else(|| ShopifyError::GraphQl("mutation returned no article".to_owned()))?;

        Ok(ShopifyArticle {
            url: Some(format!(
                "{}/blogs/{}/{}",
                self.storefront_url, node.blog.handle, node.handle
            )),
            id: node.id,
            handle: node.handle,
            blog_handle: node.blog.handle,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ShopifyError> {
        let url = self.endpoint();
        let response = self
            .client
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ShopifyError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ShopifyError::RateLimited {
                domain: self.base_url.clone(),
                retry_after_secs,
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ShopifyError::NotFound { url });
        }
        if !status.is_success() {
            return Err(ShopifyError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let parsed: GraphQlResponse<T> =
            serde_json::from_str(&body).map_err(|e| ShopifyError::Deserialize {
                context: "Admin GraphQL response".to_owned(),
                source: e,
            })?;

        if !parsed.errors.is_empty() {
            let throttled = parsed.errors.iter().any(|e| {
                e.extensions
                    .as_ref()
                    .and_then(|x| x.code.as_deref())
                    .is_some_and(|c| c == "THROTTLED")
            });
            if throttled {
                return Err(ShopifyError::RateLimited {
                    domain: self.base_url.clone(),
                    retry_after_secs: 1,
                });
            }
            let messages: Vec<&str> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ShopifyError::GraphQl(messages.join("; ")));
        }

        parsed
            .data
            .ok_or_else(|| ShopifyError::GraphQl("response contained no data".to_owned()))
    }
}

fn join_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), e.message),
            _ => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_includes_version() {
        let client = AdminClient::new("example.myshopify.com/", "tok", "2024-10", 5).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.myshopify.com/admin/api/2024-10/graphql.json"
        );
    }

    #[test]
    fn user_errors_join_field_paths() {
        let errors = vec![
            UserError {
                field: Some(vec!["article".to_owned(), "handle".to_owned()]),
                message: "has already been taken".to_owned(),
            },
            UserError {
                field: None,
                message: "Blog not found".to_owned(),
            },
        ];
        assert_eq!(
            join_user_errors(&errors),
            "article.handle: has already been taken; Blog not found"
        );
    }
}
