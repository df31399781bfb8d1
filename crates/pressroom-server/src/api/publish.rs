use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pressroom_core::Platform;
use pressroom_db::PublicationRow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jobs::{self, PublicationResult};
use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct PublicationItem {
    platform: String,
    status: String,
    remote_id: Option<String>,
    remote_url: Option<String>,
    error_message: Option<String>,
    published_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl From<PublicationRow> for PublicationItem {
    fn from(row: PublicationRow) -> Self {
        Self {
            platform: row.platform,
            status: row.status,
            remote_id: row.remote_id,
            remote_url: row.remote_url,
            error_message: row.error_message,
            published_at: row.published_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PublishRequest {
    /// Defaults to every configured platform.
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct PublishSummary {
    article_id: Uuid,
    succeeded: usize,
    failed: usize,
    results: Vec<PublicationResult>,
}

pub(super) async fn publish_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
    Json(body): Json<PublishRequest>,
) -> Result<Json<ApiResponse<PublishSummary>>, ApiError> {
    let platforms = if body.platforms.is_empty() {
        state.publisher.configured_platforms()
    } else {
        body.platforms
    };
    if platforms.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "not_configured",
            "no publishing platforms are configured",
        ));
    }

    let article = pressroom_db::get_article_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    if article.body_markdown.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "article body is empty",
        ));
    }

    let results = jobs::publish_article(
        &state.pool,
        &state.publisher,
        &article,
        &platforms,
        body.draft,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let succeeded = results.iter().filter(|r| r.succeeded()).count();
    Ok(ApiResponse::new(
        req_id.0,
        PublishSummary {
            article_id: public_id,
            succeeded,
            failed: results.len() - succeeded,
            results,
        },
    ))
}

pub(super) async fn list_publications(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PublicationItem>>>, ApiError> {
    let article = pressroom_db::get_article_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let rows = pressroom_db::list_publications_for_article(&state.pool, article.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        req_id.0,
        rows.into_iter().map(PublicationItem::from).collect(),
    ))
}
