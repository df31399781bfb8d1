//! Database operations for `products` and `product_variants`.

use chrono::{DateTime, Utc};
use pressroom_core::{NormalizedProduct, NormalizedVariant, PriceUpdate, StoredVariantPrice};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub source_product_id: String,
    pub title: String,
    pub handle: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub description_html: Option<String>,
    pub tags: Vec<String>,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    /// `"active"` while the product is in the storefront feed, `"archived"`
    /// once a sync no longer sees it.
    pub status: String,
    pub last_synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product list entry with variant aggregates.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductSummaryRow {
    pub id: i64,
    pub source_product_id: String,
    pub title: String,
    pub handle: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub variant_count: i64,
    /// `NULL` when the product has no variants.
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `product_variants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub product_id: i64,
    pub source_variant_id: String,
    pub sku: Option<String>,
    pub title: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub currency_code: String,
    pub is_available: bool,
    pub is_default: bool,
    pub position: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VariantRow {
    /// Converts the row back into the domain type used for price-range
    /// selection.
    #[must_use]
    pub fn to_normalized(&self) -> NormalizedVariant {
        NormalizedVariant {
            source_variant_id: self.source_variant_id.clone(),
            sku: self.sku.clone(),
            title: self.title.clone(),
            price: self.price,
            compare_at_price: self.compare_at_price,
            currency_code: self.currency_code.clone(),
            is_available: self.is_available,
            is_default: self.is_default,
            position: self.position,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct StoredPriceRow {
    variant_id: i64,
    source_variant_id: String,
    product_name: String,
    variant_title: String,
    price: Decimal,
    compare_at_price: Option<Decimal>,
}

impl From<StoredPriceRow> for StoredVariantPrice {
    fn from(row: StoredPriceRow) -> Self {
        Self {
            variant_id: row.variant_id,
            source_variant_id: row.source_variant_id,
            product_name: row.product_name,
            variant_title: row.variant_title,
            price: row.price,
            compare_at_price: row.compare_at_price,
        }
    }
}

/// Filters for [`list_products`]. `None` fields are not applied.
#[derive(Debug, Clone, Default)]
pub struct ProductFilters {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub vendor: Option<String>,
    pub status: Option<String>,
    pub limit: i64,
}

const PRODUCT_COLUMNS: &str = "id, source_product_id, title, handle, vendor, product_type, \
     description_html, tags, source_url, image_url, status, last_synced_at, created_at, updated_at";

const VARIANT_COLUMNS: &str = "id, product_id, source_variant_id, sku, title, price, \
     compare_at_price, currency_code, is_available, is_default, position, created_at, updated_at";

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Upserts a product row keyed on `source_product_id`.
///
/// An upsert always marks the product `active` and bumps `last_synced_at`.
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(pool: &PgPool, product: &NormalizedProduct) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (source_product_id, title, handle, vendor, product_type, description_html, \
              tags, source_url, image_url, status, last_synced_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'active', NOW()) \
         ON CONFLICT (source_product_id) DO UPDATE SET \
             title            = EXCLUDED.title, \
             handle           = EXCLUDED.handle, \
             vendor           = EXCLUDED.vendor, \
             product_type     = EXCLUDED.product_type, \
             description_html = EXCLUDED.description_html, \
             tags             = EXCLUDED.tags, \
             source_url       = EXCLUDED.source_url, \
             image_url        = EXCLUDED.image_url, \
             status           = 'active', \
             last_synced_at   = NOW(), \
             updated_at       = NOW() \
         RETURNING id",
    )
    .bind(&product.source_product_id)
    .bind(&product.title)
    .bind(&product.handle)
    .bind(&product.vendor)
    .bind(&product.product_type)
    .bind(&product.description_html)
    .bind(&product.tags)
    .bind(&product.source_url)
    .bind(&product.image_url)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Marks every active product whose `source_product_id` is not in
/// `seen_source_ids` as `archived`. Returns the number of rows archived.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn archive_products_missing_from(
    pool: &PgPool,
    seen_source_ids: &[String],
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products SET status = 'archived', updated_at = NOW() \
         WHERE status = 'active' AND NOT (source_product_id = ANY($1))",
    )
    .bind(seen_source_ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Lists products with variant counts and price bounds, most recently
/// updated first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: &ProductFilters,
) -> Result<Vec<ProductSummaryRow>, DbError> {
    let search = filters.search.as_ref().map(|s| format!("%{}%", s.trim()));

    let rows = sqlx::query_as::<_, ProductSummaryRow>(
        "SELECT p.id, p.source_product_id, p.title, p.handle, p.vendor, p.product_type, \
                p.image_url, p.status, \
                COUNT(v.id) AS variant_count, \
                MIN(v.price) AS min_price, \
                MAX(v.price) AS max_price, \
                p.updated_at \
         FROM products p \
         LEFT JOIN product_variants v ON v.product_id = p.id \
         WHERE ($1::text IS NULL OR p.title ILIKE $1) \
           AND ($2::text IS NULL OR p.vendor = $2) \
           AND ($3::text IS NULL OR p.status = $3) \
         GROUP BY p.id \
         ORDER BY p.updated_at DESC, p.id DESC \
         LIMIT $4",
    )
    .bind(search)
    .bind(&filters.vendor)
    .bind(&filters.status)
    .bind(filters.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a single product by internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<ProductRow, DbError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

// ---------------------------------------------------------------------------
// product_variants operations
// ---------------------------------------------------------------------------

/// Upserts a variant row keyed on `source_variant_id`, including its
/// current price. Returns the internal `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_variant(
    pool: &PgPool,
    product_id: i64,
    variant: &NormalizedVariant,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO product_variants \
             (product_id, source_variant_id, sku, title, price, compare_at_price, \
              currency_code, is_available, is_default, position) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (source_variant_id) DO UPDATE SET \
             product_id       = EXCLUDED.product_id, \
             sku              = EXCLUDED.sku, \
             title            = EXCLUDED.title, \
             price            = EXCLUDED.price, \
             compare_at_price = EXCLUDED.compare_at_price, \
             currency_code    = EXCLUDED.currency_code, \
             is_available     = EXCLUDED.is_available, \
             is_default       = EXCLUDED.is_default, \
             position         = EXCLUDED.position, \
             updated_at       = NOW() \
         RETURNING id",
    )
    .bind(product_id)
    .bind(&variant.source_variant_id)
    .bind(&variant.sku)
    .bind(&variant.title)
    .bind(variant.price)
    .bind(variant.compare_at_price)
    .bind(&variant.currency_code)
    .bind(variant.is_available)
    .bind(variant.is_default)
    .bind(variant.position)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns a product's variants ordered by position, then id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_variants_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<VariantRow>, DbError> {
    let sql = format!(
        "SELECT {VARIANT_COLUMNS} FROM product_variants \
         WHERE product_id = $1 \
         ORDER BY position ASC NULLS LAST, id ASC"
    );
    let rows = sqlx::query_as::<_, VariantRow>(&sql)
        .bind(product_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns the stored prices of every variant of every active product, in a
/// stable order (product id, then variant id).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stored_variant_prices(pool: &PgPool) -> Result<Vec<StoredVariantPrice>, DbError> {
    let rows = sqlx::query_as::<_, StoredPriceRow>(
        "SELECT v.id AS variant_id, v.source_variant_id, p.title AS product_name, \
                v.title AS variant_title, v.price, v.compare_at_price \
         FROM product_variants v \
         JOIN products p ON p.id = v.product_id \
         WHERE p.status = 'active' \
         ORDER BY p.id ASC, v.id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StoredVariantPrice::from).collect())
}

/// Overwrites a variant's price and compare-at price.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the variant does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_variant_price(
    pool: &PgPool,
    variant_id: i64,
    price: Decimal,
    compare_at_price: Option<Decimal>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE product_variants \
         SET price = $1, compare_at_price = $2, updated_at = NOW() \
         WHERE id = $3",
    )
    .bind(price)
    .bind(compare_at_price)
    .bind(variant_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Applies reconciliation updates in one transaction, recording a
/// `price_adjustments` row for each. Returns the number of variants updated.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if any variant has disappeared (the whole
/// batch is rolled back), or [`DbError::Sqlx`] on any database failure.
pub async fn apply_price_updates(
    pool: &PgPool,
    sync_run_id: Option<i64>,
    updates: &[PriceUpdate],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for update in updates {
        let result = sqlx::query(
            "UPDATE product_variants \
             SET price = $1, compare_at_price = $2, updated_at = NOW() \
             WHERE id = $3",
        )
        .bind(update.new_price)
        .bind(update.new_compare_at_price)
        .bind(update.variant_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        sqlx::query(
            "INSERT INTO price_adjustments \
                 (sync_run_id, variant_id, old_price, new_price, \
                  old_compare_at_price, new_compare_at_price) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(sync_run_id)
        .bind(update.variant_id)
        .bind(update.old_price)
        .bind(update.new_price)
        .bind(update.old_compare_at_price)
        .bind(update.new_compare_at_price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(updates.len())
}
