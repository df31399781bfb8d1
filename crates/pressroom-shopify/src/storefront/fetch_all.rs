//! Multi-page feed fetch for `StorefrontClient`.

use std::time::Duration;

use pressroom_core::NormalizedProduct;

use crate::error::ShopifyError;
use crate::normalize::normalize_product;
use crate::pagination::extract_next_cursor;
use crate::types::ShopifyProduct;

use super::{StorefrontClient, MAX_PAGES, MAX_PAGE_SIZE};

/// A normalized feed plus the products that could not be normalized.
#[derive(Debug, Clone, Default)]
pub struct StorefrontCatalog {
    pub products: Vec<NormalizedProduct>,
    /// Source ids of listed products that were left out. They are still in
    /// the store and must not be treated as removed.
    pub skipped: Vec<String>,
}

impl StorefrontClient {
    /// Fetches every product in the feed, following `rel="next"` cursors.
    ///
    /// `inter_request_delay_ms` is slept between pages (not before the
    /// first). The result is all-or-nothing: if any page fails, products
    /// from earlier pages are discarded and the error is returned, so a
    /// partial feed is never reconciled against the database.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_products_page`], and returns
    /// [`ShopifyError::PaginationLimit`] after [`MAX_PAGES`] pages.
    pub async fn fetch_all_products(
        &self,
        shop_url: &str,
        limit: u32,
        inter_request_delay_ms: u64,
    ) -> Result<Vec<ShopifyProduct>, ShopifyError> {
        let mut all_products: Vec<ShopifyProduct> = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 1..=MAX_PAGES {
            if page > 1 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            let (response, link_header) = self
                .fetch_products_page(shop_url, limit, cursor.as_deref())
                .await?;
            tracing::debug!(
                page,
                products = response.products.len(),
                "fetched storefront page"
            );
            all_products.extend(response.products);

            cursor = extract_next_cursor(link_header.as_deref());
            if cursor.is_none() {
                return Ok(all_products);
            }
        }

        Err(ShopifyError::PaginationLimit {
            shop_url: shop_url.to_owned(),
            max_pages: MAX_PAGES,
        })
    }

    /// Fetches the whole feed at [`MAX_PAGE_SIZE`] per page and normalizes
    /// it.
    ///
    /// Products that fail normalization (no variants, unparseable price) are
    /// logged and reported in [`StorefrontCatalog::skipped`]; fetch errors
    /// fail the whole call.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_all_products`].
    pub async fn fetch_catalog(
        &self,
        storefront_url: &str,
        currency_code: &str,
        inter_request_delay_ms: u64,
    ) -> Result<StorefrontCatalog, ShopifyError> {
        let raw = self
            .fetch_all_products(storefront_url, MAX_PAGE_SIZE, inter_request_delay_ms)
            .await?;
        let fetched = raw.len();

        let mut catalog = StorefrontCatalog::default();
        for product in raw {
            let source_product_id = product.id.to_string();
            match normalize_product(product, storefront_url, currency_code) {
                Ok(p) => catalog.products.push(p),
                Err(e) => {
                    tracing::warn!(
                        product = %source_product_id,
                        error = %e,
                        "skipping product that failed normalization"
                    );
                    catalog.skipped.push(source_product_id);
                }
            }
        }

        tracing::info!(
            fetched,
            normalized = catalog.products.len(),
            skipped = catalog.skipped.len(),
            storefront_url,
            "fetched storefront catalog"
        );
        Ok(catalog)
    }
}
