//! Writes a fetched storefront catalog into `products`/`product_variants`.

use pressroom_core::NormalizedProduct;
use serde::Serialize;
use sqlx::PgPool;

use crate::products::{archive_products_missing_from, upsert_product, upsert_variant};
use crate::DbError;

/// Counts from one [`store_catalog`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSyncSummary {
    pub products: usize,
    pub variants: usize,
    pub archived: u64,
    /// Listed products that could not be normalized; left untouched.
    pub skipped: usize,
}

impl CatalogSyncSummary {
    /// Total rows written, as recorded on the sync run.
    #[must_use]
    pub fn records_processed(&self) -> i32 {
        i32::try_from(self.products + self.variants).unwrap_or(i32::MAX)
    }
}

/// Upserts every product and variant in `catalog`, then archives active
/// products that the feed no longer lists.
///
/// `skipped` holds source ids the feed listed but that could not be
/// normalized. They count as still listed, so a product with one bad
/// variant is not archived as removed from the store.
///
/// An empty catalog archives nothing: a feed that returned zero products is
/// far more likely to be broken than to reflect an emptied store.
///
/// # Errors
///
/// Returns the first [`DbError`] hit; rows written before it stay written.
pub async fn store_catalog(
    pool: &PgPool,
    catalog: &[NormalizedProduct],
    skipped: &[String],
) -> Result<CatalogSyncSummary, DbError> {
    let mut summary = CatalogSyncSummary {
        skipped: skipped.len(),
        ..CatalogSyncSummary::default()
    };

    for product in catalog {
        let product_id = upsert_product(pool, product).await?;
        for variant in &product.variants {
            upsert_variant(pool, product_id, variant).await?;
            summary.variants += 1;
        }
        summary.products += 1;
    }

    if catalog.is_empty() {
        tracing::warn!("catalog is empty; skipping archive of missing products");
        return Ok(summary);
    }

    let listed: Vec<String> = catalog
        .iter()
        .map(|p| p.source_product_id.clone())
        .chain(skipped.iter().cloned())
        .collect();
    summary.archived = archive_products_missing_from(pool, &listed).await?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_processed_counts_products_and_variants() {
        let summary = CatalogSyncSummary {
            products: 3,
            variants: 7,
            archived: 1,
            skipped: 2,
        };
        assert_eq!(summary.records_processed(), 10);
    }
}
