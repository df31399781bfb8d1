use std::time::Duration;

use pressroom_core::{AppConfig, ArticleStatus};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/pressroom-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("sync run {id} is not in expected status '{expected_status}'")]
    InvalidSyncRunTransition {
        id: i64,
        expected_status: &'static str,
    },
    #[error("cannot move article from {from} to {to}")]
    InvalidArticleTransition {
        from: ArticleStatus,
        to: ArticleStatus,
    },
    #[error("stored value is invalid: {0}")]
    InvalidData(#[from] pressroom_core::CoreError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// Converts a Postgres unique violation into [`DbError::Conflict`],
    /// passing every other error through.
    pub(crate) fn from_unique_violation(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DbError::Conflict(message.into())
            }
            _ => DbError::Sqlx(err),
        }
    }
}

/// Opens the shared Postgres pool.
///
/// # Errors
///
/// Fails when no connection can be acquired within the configured timeout.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Applies pending migrations from `<workspace-root>/migrations` and returns
/// how many were new.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] when a migration script fails or a
/// previously applied one has been edited.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations does not exist on a fresh database; count that as zero.
    let applied_before = count_applied(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = count_applied(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn count_applied(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Round-trips `SELECT 1`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] when the database is unreachable.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// [`ping`] wrapped in [`DbError`] for the server health route.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] when the database is unreachable.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_keeps_one_warm_connection() {
        let config = PoolConfig::default();

        assert_eq!(config.min_connections, 1);
        assert!(config.max_connections >= config.min_connections);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn unique_violation_passthrough_keeps_other_errors() {
        let err = DbError::from_unique_violation(sqlx::Error::RowNotFound, "slug taken");
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
    }
}

pub mod articles;
pub mod catalog_sync;
pub mod products;
pub mod publications;
pub mod sync_runs;

pub use articles::{
    create_article, delete_article, get_article_by_public_id, list_articles,
    list_due_scheduled_articles, set_article_status, update_article, ArticleChanges,
    ArticleFilters, ArticleRow, NewArticle,
};
pub use catalog_sync::{store_catalog, CatalogSyncSummary};
pub use products::{
    apply_price_updates, archive_products_missing_from, get_product, list_products,
    list_stored_variant_prices, list_variants_for_product, update_variant_price, upsert_product,
    upsert_variant, ProductFilters, ProductRow, ProductSummaryRow, VariantRow,
};
pub use publications::{
    get_publication, list_publications_for_article, remote_ids_for_article, upsert_publication,
    PublicationRow, PublicationUpdate,
};
pub use sync_runs::{
    complete_sync_run, create_sync_run, fail_sync_run, get_sync_run, list_price_adjustments,
    list_sync_runs, record_price_adjustment, start_sync_run, PriceAdjustmentRow, SyncRunRow,
    RUN_TYPE_PRICES, RUN_TYPE_PRODUCTS,
};
