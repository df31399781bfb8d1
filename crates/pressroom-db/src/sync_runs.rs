//! Database operations for `sync_runs` and `price_adjustments`.

use chrono::{DateTime, Utc};
use pressroom_core::PriceUpdate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// `run_type` of a storefront catalog pull.
pub const RUN_TYPE_PRODUCTS: &str = "products";
/// `run_type` of an applied price reconciliation.
pub const RUN_TYPE_PRICES: &str = "prices";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `sync_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// [`RUN_TYPE_PRODUCTS`] or [`RUN_TYPE_PRICES`].
    pub run_type: String,
    /// `"cli"`, `"api"`, or `"scheduler"`.
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub records_processed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `price_adjustments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceAdjustmentRow {
    pub id: i64,
    pub sync_run_id: Option<i64>,
    pub variant_id: i64,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub old_compare_at_price: Option<Decimal>,
    pub new_compare_at_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

const SYNC_RUN_COLUMNS: &str = "id, public_id, run_type, trigger_source, status, \
     started_at, completed_at, records_processed, error_message, created_at";

// ---------------------------------------------------------------------------
// sync_runs operations
// ---------------------------------------------------------------------------

/// Creates a new sync run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_sync_run(
    pool: &PgPool,
    run_type: &str,
    trigger_source: &str,
) -> Result<SyncRunRow, DbError> {
    let sql = format!(
        "INSERT INTO sync_runs (public_id, run_type, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {SYNC_RUN_COLUMNS}"
    );
    let row = sqlx::query_as::<_, SyncRunRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(run_type)
        .bind(trigger_source)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not `queued`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_sync_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "queued",
        });
    }
    Ok(())
}

/// Marks a run as `succeeded` with its processed-record count.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_sync_run(
    pool: &PgPool,
    id: i64,
    records_processed: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'succeeded', completed_at = NOW(), records_processed = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(records_processed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Marks a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_sync_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_sync_run(pool: &PgPool, id: i64) -> Result<SyncRunRow, DbError> {
    let sql = format!("SELECT {SYNC_RUN_COLUMNS} FROM sync_runs WHERE id = $1");
    sqlx::query_as::<_, SyncRunRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_runs(pool: &PgPool, limit: i64) -> Result<Vec<SyncRunRow>, DbError> {
    let sql = format!(
        "SELECT {SYNC_RUN_COLUMNS} FROM sync_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    );
    let rows = sqlx::query_as::<_, SyncRunRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// price_adjustments operations
// ---------------------------------------------------------------------------

/// Records a single price change outside a batch.
///
/// [`crate::apply_price_updates`] records adjustments itself; this is for
/// one-off corrections.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn record_price_adjustment(
    pool: &PgPool,
    sync_run_id: Option<i64>,
    update: &PriceUpdate,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO price_adjustments \
             (sync_run_id, variant_id, old_price, new_price, \
              old_compare_at_price, new_compare_at_price) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(sync_run_id)
    .bind(update.variant_id)
    .bind(update.old_price)
    .bind(update.new_price)
    .bind(update.old_compare_at_price)
    .bind(update.new_compare_at_price)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns the adjustments recorded under a sync run, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_price_adjustments(
    pool: &PgPool,
    sync_run_id: i64,
) -> Result<Vec<PriceAdjustmentRow>, DbError> {
    let rows = sqlx::query_as::<_, PriceAdjustmentRow>(
        "SELECT id, sync_run_id, variant_id, old_price, new_price, \
                old_compare_at_price, new_compare_at_price, created_at \
         FROM price_adjustments \
         WHERE sync_run_id = $1 \
         ORDER BY id ASC",
    )
    .bind(sync_run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
