//! Catalog sync, price reconciliation, and article publishing, shared by the
//! API handlers and the scheduler.

use pressroom_core::{
    reconcile_prices, AppConfig, ArticleStatus, Platform, PublicationStatus, ReconcileReport,
};
use pressroom_db::{
    ArticleRow, CatalogSyncSummary, DbError, PublicationUpdate, RUN_TYPE_PRICES, RUN_TYPE_PRODUCTS,
};
use pressroom_publish::{ArticleContent, BlogIntegrationService, PlatformOutcome, PublishPost};
use pressroom_shopify::{ShopifyError, StorefrontCatalog, StorefrontClient};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Shopify storefront is not configured")]
    ShopifyNotConfigured,
    #[error(transparent)]
    Shopify(#[from] ShopifyError),
    #[error(transparent)]
    Db(#[from] DbError),
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub run_id: Uuid,
    #[serde(flatten)]
    pub summary: CatalogSyncSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    /// Set when updates were applied under a sync run.
    pub run_id: Option<Uuid>,
    pub report: ReconcileReport,
    pub applied: usize,
}

/// Publish result for one platform, as recorded in `article_publications`.
#[derive(Debug, Clone, Serialize)]
pub struct PublicationResult {
    pub platform: Platform,
    pub status: PublicationStatus,
    pub remote_id: Option<String>,
    pub remote_url: Option<String>,
    pub error: Option<String>,
}

impl PublicationResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

async fn fail_run_best_effort(pool: &PgPool, run_id: i64, run_type: &str, message: String) {
    if let Err(e) = pressroom_db::fail_sync_run(pool, run_id, &message).await {
        tracing::error!(run_id, run_type, error = %e, "failed to mark sync run as failed");
    }
}

async fn fetch_feed(
    storefront: &StorefrontClient,
    config: &AppConfig,
) -> Result<StorefrontCatalog, JobError> {
    let shopify = config.shopify().ok_or(JobError::ShopifyNotConfigured)?;
    Ok(storefront
        .fetch_catalog(
            &shopify.storefront_url,
            &shopify.currency_code,
            config.inter_request_delay_ms,
        )
        .await?)
}

/// Pulls the storefront feed into `products`/`product_variants` under a
/// `products` sync run.
///
/// # Errors
///
/// Returns [`JobError::ShopifyNotConfigured`] without a storefront, or the
/// fetch/database error that failed the run.
pub async fn sync_products(
    pool: &PgPool,
    storefront: &StorefrontClient,
    config: &AppConfig,
    trigger_source: &str,
) -> Result<SyncOutcome, JobError> {
    if config.shopify().is_none() {
        return Err(JobError::ShopifyNotConfigured);
    }

    let run = pressroom_db::create_sync_run(pool, RUN_TYPE_PRODUCTS, trigger_source).await?;
    pressroom_db::start_sync_run(pool, run.id).await?;

    let result = async {
        let catalog = fetch_feed(storefront, config).await?;
        Ok::<_, JobError>(
            pressroom_db::store_catalog(pool, &catalog.products, &catalog.skipped).await?,
        )
    }
    .await;

    match result {
        Ok(summary) => {
            pressroom_db::complete_sync_run(pool, run.id, summary.records_processed()).await?;
            tracing::info!(
                run_id = run.id,
                products = summary.products,
                variants = summary.variants,
                archived = summary.archived,
                skipped = summary.skipped,
                "product sync complete"
            );
            Ok(SyncOutcome {
                run_id: run.public_id,
                summary,
            })
        }
        Err(e) => {
            fail_run_best_effort(pool, run.id, RUN_TYPE_PRODUCTS, e.to_string()).await;
            Err(e)
        }
    }
}

/// Diffs stored prices against the feed. With `apply`, writes feed prices
/// into the database under a `prices` sync run.
///
/// # Errors
///
/// Returns [`JobError::ShopifyNotConfigured`] without a storefront, or the
/// fetch/database error.
pub async fn reconcile(
    pool: &PgPool,
    storefront: &StorefrontClient,
    config: &AppConfig,
    trigger_source: &str,
    apply: bool,
) -> Result<ReconcileOutcome, JobError> {
    if config.shopify().is_none() {
        return Err(JobError::ShopifyNotConfigured);
    }

    if !apply {
        let feed = fetch_feed(storefront, config).await?.products;
        let stored = pressroom_db::list_stored_variant_prices(pool).await?;
        return Ok(ReconcileOutcome {
            run_id: None,
            report: reconcile_prices(&stored, &feed),
            applied: 0,
        });
    }

    let run = pressroom_db::create_sync_run(pool, RUN_TYPE_PRICES, trigger_source).await?;
    pressroom_db::start_sync_run(pool, run.id).await?;

    let result = async {
        let feed = fetch_feed(storefront, config).await?.products;
        let stored = pressroom_db::list_stored_variant_prices(pool).await?;
        let report = reconcile_prices(&stored, &feed);
        let applied =
            pressroom_db::apply_price_updates(pool, Some(run.id), report.price_updates()).await?;
        Ok::<_, JobError>((report, applied))
    }
    .await;

    match result {
        Ok((report, applied)) => {
            pressroom_db::complete_sync_run(
                pool,
                run.id,
                i32::try_from(applied).unwrap_or(i32::MAX),
            )
            .await?;
            tracing::info!(
                run_id = run.id,
                checked = report.checked,
                matched = report.matched,
                mismatches = report.mismatches.len(),
                applied,
                "price reconciliation complete"
            );
            Ok(ReconcileOutcome {
                run_id: Some(run.public_id),
                report,
                applied,
            })
        }
        Err(e) => {
            fail_run_best_effort(pool, run.id, RUN_TYPE_PRICES, e.to_string()).await;
            Err(e)
        }
    }
}

/// Builds the post for a stored article. A live Shopify copy, if any, is
/// used as the canonical URL for syndication targets.
async fn build_post(pool: &PgPool, article: &ArticleRow, draft: bool) -> Result<PublishPost, DbError> {
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

/// Publishes `article` to each of `platforms` and records the outcome of
/// every attempt.
///
/// Platforms the article already went out to are updated in place rather
/// than posted again. A live (non-draft) publish that succeeds anywhere
/// moves the article to `published`.
///
/// # Errors
///
/// Returns [`DbError`] if outcomes cannot be recorded. Platform failures
/// are reported in the results, not as errors.
pub async fn publish_article(
    pool: &PgPool,
    publisher: &BlogIntegrationService,
    article: &ArticleRow,
    platforms: &[Platform],
    draft: bool,
) -> Result<Vec<PublicationResult>, DbError> {
    let post = build_post(pool, article, draft).await?;
    let existing = pressroom_db::remote_ids_for_article(pool, article.id).await?;
    let outcomes = publisher
        .publish_or_update_many(platforms, &existing, &post)
        .await;

    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        results.push(record_outcome(pool, article.id, outcome, draft).await?);
    }

    if !draft && results.iter().any(PublicationResult::succeeded) {
        mark_published(pool, article).await?;
    }

    Ok(results)
}

async fn record_outcome(
    pool: &PgPool,
    article_id: i64,
    outcome: PlatformOutcome,
    draft: bool,
) -> Result<PublicationResult, DbError> {
    let platform = outcome.platform;
    let (status, remote_id, remote_url, error) = match outcome.result {
        Ok(remote) => {
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
            article_id,
            platform,
            status,
            remote_id: remote_id.as_deref(),
            remote_url: remote_url.as_deref(),
            error_message: error.as_deref(),
        },
    )
    .await?;

    Ok(PublicationResult {
        platform,
        status,
        remote_id,
        remote_url,
        error,
    })
}

async fn mark_published(pool: &PgPool, article: &ArticleRow) -> Result<(), DbError> {
    if !article
        .article_status()?
        .can_transition_to(ArticleStatus::Published)
    {
        return Ok(());
    }
    pressroom_db::set_article_status(pool, article.public_id, ArticleStatus::Published, None)
        .await?;
    tracing::info!(article = %article.public_id, "article marked published");
    Ok(())
}
