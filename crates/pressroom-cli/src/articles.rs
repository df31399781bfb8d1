//! Article publishing from the command line.

use clap::Subcommand;
use pressroom_core::{AppConfig, ArticleStatus, Platform, PublicationStatus};
use pressroom_db::{ArticleRow, PublicationUpdate};
use pressroom_publish::{ArticleContent, BlogIntegrationService, PublishPost};
use uuid::Uuid;

/// Sub-commands available under `articles`.
#[derive(Debug, Subcommand)]
pub enum ArticleCommands {
    /// Publish a stored article to one or more platforms
    Publish {
        /// Article public id
        public_id: Uuid,
        /// Target platform; repeat for several
        #[arg(long = "platform", required = true)]
        platforms: Vec<Platform>,
        /// Create drafts on the platforms instead of live posts
        #[arg(long)]
        draft: bool,
    },
}

async fn build_post(
    pool: &sqlx::PgPool,
    article: &ArticleRow,
    draft: bool,
) -> anyhow::Result<PublishPost> {
    let canonical_url = pressroom_db::get_publication(pool, article.id, Platform::Shopify)
        .await?
        .filter(|p| p.status == PublicationStatus::Published.as_str())
        .and_then(|p| p.remote_url);

    Ok(PublishPost::from_article(
        &ArticleContent {
            title: &article.title,
            slug: &article.slug,
            body_markdown: &article.body_markdown,
            excerpt: article.excerpt.as_deref(),
            tags: &article.tags,
            featured_image_url: article.featured_image_url.as_deref(),
            author_name: article.author_name.as_deref(),
            canonical_url: canonical_url.as_deref(),
            published_at: article.published_at,
        },
        draft,
    ))
}

/// Publishes an article and records each platform's outcome.
///
/// Platforms that already hold a copy are updated in place. A live publish
/// that succeeds on any platform moves the article to `published`.
///
/// # Errors
///
/// Returns an error if the article is missing or empty, a platform client
/// cannot be built, outcomes cannot be recorded, or every platform failed.
pub(crate) async fn run_articles_publish(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    public_id: Uuid,
    platforms: &[Platform],
    draft: bool,
) -> anyhow::Result<()> {
    let article = pressroom_db::get_article_by_public_id(pool, public_id).await?;
    if article.body_markdown.trim().is_empty() {
        anyhow::bail!("article {public_id} has an empty body");
    }

    let service = BlogIntegrationService::from_config(config)?;
    let post = build_post(pool, &article, draft).await?;

    let existing = pressroom_db::remote_ids_for_article(pool, article.id).await?;
    let outcomes = service
        .publish_or_update_many(platforms, &existing, &post)
        .await;

    let mut succeeded = 0usize;
    println!("{:<12}{:<11}DETAIL", "PLATFORM", "STATUS");
    for outcome in outcomes {
        let platform = outcome.platform;
        let (status, remote_id, remote_url, error) = match outcome.result {
            Ok(remote) => {
                succeeded += 1;
                let status = if draft {
                    PublicationStatus::Pending
                } else {
                    PublicationStatus::Published
                };
                (status, Some(remote.remote_id), remote.url, None)
            }
            Err(e) => (PublicationStatus::Failed, None, None, Some(e.to_string())),
        };

        pressroom_db::upsert_publication(
            pool,
            &PublicationUpdate {
                article_id: article.id,
                platform,
                status,
                remote_id: remote_id.as_deref(),
                remote_url: remote_url.as_deref(),
                error_message: error.as_deref(),
            },
        )
        .await?;

        let detail = error
            .or(remote_url)
            .or(remote_id)
            .unwrap_or_default();
        println!("{:<12}{:<11}{detail}", platform.as_str(), status.as_str());
    }

    if succeeded == 0 {
        anyhow::bail!("publishing failed on every platform");
    }

    if !draft
        && article
            .article_status()?
            .can_transition_to(ArticleStatus::Published)
    {
        pressroom_db::set_article_status(pool, public_id, ArticleStatus::Published, None).await?;
        println!("article {public_id} marked published");
    }

    Ok(())
}
