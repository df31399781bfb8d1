use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pressroom_core::{select_price_range, NormalizedVariant};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::jobs::{self, SyncOutcome};
use crate::middleware::RequestId;

use super::{map_db_error, map_job_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: i64,
    source_product_id: String,
    title: String,
    handle: String,
    vendor: Option<String>,
    product_type: Option<String>,
    image_url: Option<String>,
    status: String,
    variant_count: i64,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct VariantItem {
    id: i64,
    source_variant_id: String,
    sku: Option<String>,
    title: String,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    currency_code: String,
    is_available: bool,
    is_default: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceRangeItem {
    min: Decimal,
    max: Decimal,
    compare_at_max: Option<Decimal>,
    currency_code: String,
    on_sale: bool,
    display: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    id: i64,
    source_product_id: String,
    title: String,
    handle: String,
    vendor: Option<String>,
    product_type: Option<String>,
    description_html: Option<String>,
    tags: Vec<String>,
    source_url: Option<String>,
    image_url: Option<String>,
    status: String,
    last_synced_at: DateTime<Utc>,
    price_range: Option<PriceRangeItem>,
    variants: Vec<VariantItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub search: Option<String>,
    pub vendor: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = pressroom_db::list_products(
        &state.pool,
        &pressroom_db::ProductFilters {
            search: query.search.filter(|s| !s.trim().is_empty()),
            vendor: query.vendor,
            status: query.status,
            limit: normalize_limit(query.limit),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ProductItem {
            id: row.id,
            source_product_id: row.source_product_id,
            title: row.title,
            handle: row.handle,
            vendor: row.vendor,
            product_type: row.product_type,
            image_url: row.image_url,
            status: row.status,
            variant_count: row.variant_count,
            min_price: row.min_price,
            max_price: row.max_price,
            updated_at: row.updated_at,
        })
        .collect();

    Ok(ApiResponse::new(req_id.0, data))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let product = pressroom_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let variants = pressroom_db::list_variants_for_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let normalized: Vec<NormalizedVariant> = variants.iter().map(|v| v.to_normalized()).collect();
    let price_range = select_price_range(&normalized).map(|range| PriceRangeItem {
        on_sale: range.is_on_sale(),
        display: range.display(),
        min: range.min,
        max: range.max,
        compare_at_max: range.compare_at_max,
        currency_code: range.currency_code,
    });

    let data = ProductDetail {
        id: product.id,
        source_product_id: product.source_product_id,
        title: product.title,
        handle: product.handle,
        vendor: product.vendor,
        product_type: product.product_type,
        description_html: product.description_html,
        tags: product.tags,
        source_url: product.source_url,
        image_url: product.image_url,
        status: product.status,
        last_synced_at: product.last_synced_at,
        price_range,
        variants: variants
            .into_iter()
            .map(|v| VariantItem {
                id: v.id,
                source_variant_id: v.source_variant_id,
                sku: v.sku,
                title: v.title,
                price: v.price,
                compare_at_price: v.compare_at_price,
                currency_code: v.currency_code,
                is_available: v.is_available,
                is_default: v.is_default,
            })
            .collect(),
    };

    Ok(ApiResponse::new(req_id.0, data))
}

pub(super) async fn sync_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SyncOutcome>>, ApiError> {
    let outcome = jobs::sync_products(&state.pool, &state.storefront, &state.config, "api")
        .await
        .map_err(|e| map_job_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(req_id.0, outcome))
}
