mod articles;
mod auth;
mod generate;
mod platforms;
mod products;
mod publish;
mod shopify;
mod sync_runs;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pressroom_ai::{AiError, GeneratorRegistry};
use pressroom_core::AppConfig;
use pressroom_db::DbError;
use pressroom_publish::{BlogIntegrationService, PublishError};
use pressroom_shopify::{AdminClient, ShopifyError, StorefrontClient};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::jobs::JobError;
use crate::middleware::{
    enforce_rate_limit, request_id, require_session, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub generators: Arc<GeneratorRegistry>,
    pub publisher: Arc<BlogIntegrationService>,
    pub storefront: Arc<StorefrontClient>,
    /// Present only when Shopify Admin credentials are configured.
    pub shopify: Option<Arc<AdminClient>>,
}

impl AppState {
    /// Builds every outbound client from `config`.
    pub fn from_config(pool: PgPool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let generators = GeneratorRegistry::from_config(&config)?;
        let publisher = BlogIntegrationService::from_config(&config)?;
        let storefront = StorefrontClient::new(
            config.http_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_secs,
        )?;
        let shopify = match config.shopify() {
            Some(shopify) => Some(Arc::new(
                AdminClient::new(
                    &shopify.store_domain,
                    &shopify.admin_access_token,
                    &shopify.api_version,
                    config.http_timeout_secs,
                )?
                .with_storefront_url(&shopify.storefront_url)
                .with_retry(config.max_retries, config.retry_backoff_base_secs),
            )),
            None => None,
        };

        tracing::info!(
            ai_providers = ?generators.configured(),
            platforms = ?publisher.configured_platforms(),
            shopify = shopify.is_some(),
            "integrations configured"
        );

        Ok(Self {
            pool,
            config,
            generators: Arc::new(generators),
            publisher: Arc::new(publisher),
            storefront: Arc::new(storefront),
            shopify,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            "not_configured" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "resource not found"),
        DbError::Conflict(message) => ApiError::new(request_id, "conflict", message.as_str()),
        DbError::InvalidInput(message) => {
            ApiError::new(request_id, "validation_error", message.as_str())
        }
        DbError::InvalidArticleTransition { .. } => {
            ApiError::new(request_id, "conflict", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_shopify_error(request_id: String, error: &ShopifyError) -> ApiError {
    tracing::warn!(error = %error, "shopify request failed");
    match error {
        ShopifyError::RateLimited { .. } => {
            ApiError::new(request_id, "rate_limited", error.to_string())
        }
        _ => ApiError::new(request_id, "bad_gateway", error.to_string()),
    }
}

pub(super) fn map_job_error(request_id: String, error: &JobError) -> ApiError {
    match error {
        JobError::ShopifyNotConfigured => {
            ApiError::new(request_id, "not_configured", error.to_string())
        }
        JobError::Shopify(e) => map_shopify_error(request_id, e),
        JobError::Db(e) => map_db_error(request_id, e),
    }
}

pub(super) fn map_ai_error(request_id: String, error: &AiError) -> ApiError {
    match error {
        AiError::NotConfigured(_) => ApiError::new(request_id, "not_configured", error.to_string()),
        AiError::InvalidRequest(_) => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        AiError::RateLimited { .. } => {
            ApiError::new(request_id, "rate_limited", error.to_string())
        }
        _ => {
            tracing::warn!(error = %error, "article generation failed");
            ApiError::new(request_id, "bad_gateway", error.to_string())
        }
    }
}

pub(super) fn map_publish_error(request_id: String, error: &PublishError) -> ApiError {
    match error {
        PublishError::NotConfigured(_) => {
            ApiError::new(request_id, "not_configured", error.to_string())
        }
        PublishError::Unsupported { .. } => {
            ApiError::new(request_id, "bad_request", error.to_string())
        }
        _ => {
            tracing::warn!(error = %error, "platform request failed");
            ApiError::new(request_id, "bad_gateway", error.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::COOKIE,
            HeaderName::from_static("x-request-id"),
        ])
}

fn auth_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
        .with_state(auth)
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/session", get(auth::session))
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/sync", post(products::sync_products))
        .route("/api/v1/products/{id}", get(products::get_product))
        .route(
            "/api/v1/articles",
            get(articles::list_articles).post(articles::create_article),
        )
        .route("/api/v1/articles/generate", post(generate::generate_article))
        .route(
            "/api/v1/articles/{public_id}",
            get(articles::get_article)
                .patch(articles::update_article)
                .delete(articles::delete_article),
        )
        .route(
            "/api/v1/articles/{public_id}/status",
            post(articles::set_article_status),
        )
        .route(
            "/api/v1/articles/{public_id}/publish",
            post(publish::publish_article),
        )
        .route(
            "/api/v1/articles/{public_id}/publications",
            get(publish::list_publications),
        )
        .route("/api/v1/platforms", get(platforms::list_platforms))
        .route(
            "/api/v1/platforms/{platform}/verify",
            post(platforms::verify_platform),
        )
        .route("/api/v1/shopify/blogs", get(shopify::list_blogs))
        .route("/api/v1/sync-runs", get(sync_runs::list_sync_runs))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(auth, require_session)),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(auth_router(auth.clone(), rate_limit.clone()))
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match pressroom_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
