//! Shopify blogs through the Admin GraphQL client.

use async_trait::async_trait;
use pressroom_core::Platform;
use pressroom_shopify::{AdminClient, ArticleInput, CmsArticle};
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::error::PublishError;
use crate::markdown::render_html;
use crate::post::PublishPost;
use crate::publisher::{BlogPublisher, RemotePost};

pub struct ShopifyPublisher {
    client: AdminClient,
    blog_id: Option<String>,
    /// First blog of the store, looked up once when no blog id is set.
    fallback_blog_id: OnceCell<String>,
}

impl ShopifyPublisher {
    #[must_use]
    pub fn new(client: AdminClient, default_blog_id: Option<String>) -> Self {
        Self {
            client,
            blog_id: default_blog_id.filter(|id| !id.trim().is_empty()),
            fallback_blog_id: OnceCell::new(),
        }
    }

    /// Publishes to `blog_id` instead of the configured default.
    #[must_use]
    pub fn with_blog_id(mut self, blog_id: &str) -> Self {
        self.blog_id = Some(blog_id.to_owned());
        self
    }

    async fn blog_id(&self) -> Result<String, PublishError> {
        if let Some(id) = &self.blog_id {
            return Ok(id.clone());
        }
        let id = self
            .fallback_blog_id
            .get_or_try_init(|| async {
                let blogs = self.client.list_blogs().await?;
                let first = blogs.into_iter().next().ok_or_else(|| PublishError::Rejected {
                    platform: Platform::Shopify,
                    message: "store has no blogs; create one or set SHOPIFY_DEFAULT_BLOG_ID"
                        .to_owned(),
                })?;
                tracing::info!(blog = %first.handle, "no default blog configured, using first blog");
                Ok::<_, PublishError>(first.id)
            })
            .await?;
        Ok(id.clone())
    }

    fn input(blog_id: Option<&str>, post: &PublishPost) -> ArticleInput {
        let summary_html = render_html(&post.excerpt);
        ArticleInput::from_cms(
            blog_id,
            &CmsArticle {
                title: &post.title,
                slug: &post.slug,
                body_html: &post.body_html,
                summary_html: Some(summary_html.as_str()),
                tags: &post.tags,
                author_name: post.author_name.as_deref(),
                featured_image_url: post.featured_image_url.as_deref(),
                published: !post.draft,
                published_at: post.published_at,
            },
        )
    }
}

#[async_trait]
impl BlogPublisher for ShopifyPublisher {
    fn platform(&self) -> Platform {
        Platform::Shopify
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn publish(&self, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let blog_id = self.blog_id().await?;
        let article = self
            .client
            .create_article(&Self::input(Some(&blog_id), post))
            .await?;
        Ok(RemotePost {
            remote_id: article.id,
            url: article.url,
        })
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn update(&self, remote_id: &str, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let article = self
            .client
            .update_article(remote_id, &Self::input(None, post))
            .await?;
        Ok(RemotePost {
            remote_id: article.id,
            url: article.url,
        })
    }

    async fn verify(&self) -> Result<String, PublishError> {
        Ok(self.client.shop_name().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::ArticleContent;

    #[test]
    fn summary_is_rendered_and_escaped() {
        let post = PublishPost::from_article(
            &ArticleContent {
                title: "Hojicha",
                slug: "hojicha",
                body_markdown: "Roast the leaves.",
                excerpt: Some("Roasted & *smooth*"),
                ..ArticleContent::default()
            },
            false,
        );

        let input = ShopifyPublisher::input(Some("gid://shopify/Blog/1"), &post);
        assert_eq!(
            input.summary.as_deref(),
            Some("<p>Roasted &amp; <em>smooth</em></p>")
        );
    }
}
