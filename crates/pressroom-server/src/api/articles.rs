use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pressroom_core::{slugify, validate_title, AiProvider, ArticleStatus};
use pressroom_db::{ArticleChanges, ArticleFilters, ArticleRow, NewArticle};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::publish::PublicationItem;
use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ArticleItem {
    id: Uuid,
    title: String,
    slug: String,
    excerpt: Option<String>,
    body_markdown: String,
    featured_image_url: Option<String>,
    tags: Vec<String>,
    seo_title: Option<String>,
    seo_description: Option<String>,
    author_name: Option<String>,
    status: String,
    scheduled_for: Option<DateTime<Utc>>,
    published_at: Option<DateTime<Utc>>,
    product_id: Option<i64>,
    ai_provider: Option<String>,
    ai_model: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    publications: Option<Vec<PublicationItem>>,
}

impl From<ArticleRow> for ArticleItem {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.public_id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            body_markdown: row.body_markdown,
            featured_image_url: row.featured_image_url,
            tags: row.tags,
            seo_title: row.seo_title,
            seo_description: row.seo_description,
            author_name: row.author_name,
            status: row.status,
            scheduled_for: row.scheduled_for,
            published_at: row.published_at,
            product_id: row.product_id,
            ai_provider: row.ai_provider,
            ai_model: row.ai_model,
            created_at: row.created_at,
            updated_at: row.updated_at,
            publications: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ArticleQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateArticleRequest {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body_markdown: String,
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub author_name: Option<String>,
    pub status: Option<ArticleStatus>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub product_id: Option<i64>,
    pub ai_provider: Option<AiProvider>,
    pub ai_model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct UpdateArticleRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body_markdown: Option<String>,
    pub featured_image_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub author_name: Option<String>,
    pub product_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusRequest {
    pub status: ArticleStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedItem {
    id: Uuid,
    deleted: bool,
}

/// Slug from an explicit value, falling back to the title.
pub(super) fn resolve_slug(
    request_id: &str,
    explicit: Option<&str>,
    title: &str,
) -> Result<String, ApiError> {
    let slug = slugify(explicit.filter(|s| !s.trim().is_empty()).unwrap_or(title));
    if slug.is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "slug must contain at least one letter or digit",
        ));
    }
    Ok(slug)
}

pub(super) fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            cleaned.push(tag.to_owned());
        }
    }
    cleaned
}

fn title_or_error(request_id: &str, title: &str) -> Result<String, ApiError> {
    validate_title(title).map_err(|e| ApiError::new(request_id, "validation_error", e.to_string()))
}

pub(super) async fn list_articles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ArticleQuery>,
) -> Result<Json<ApiResponse<Vec<ArticleItem>>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ArticleStatus>)
        .transpose()
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let rows = pressroom_db::list_articles(
        &state.pool,
        &ArticleFilters {
            status,
            search: query.search.filter(|s| !s.trim().is_empty()),
            limit: normalize_limit(query.limit),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        req_id.0,
        rows.into_iter().map(ArticleItem::from).collect(),
    ))
}

pub(super) async fn create_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ArticleItem>>), ApiError> {
    let title = title_or_error(&req_id.0, &body.title)?;
    let slug = resolve_slug(&req_id.0, body.slug.as_deref(), &title)?;

    let status = body.status.unwrap_or(ArticleStatus::Draft);
    if !matches!(status, ArticleStatus::Draft | ArticleStatus::Scheduled) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "new articles must be draft or scheduled; publish through the publish endpoint",
        ));
    }
    if status == ArticleStatus::Scheduled && body.scheduled_for.is_none() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "scheduled articles require scheduled_for",
        ));
    }

    let row = pressroom_db::create_article(
        &state.pool,
        &NewArticle {
            title,
            slug,
            excerpt: body.excerpt,
            body_markdown: body.body_markdown,
            featured_image_url: body.featured_image_url,
            tags: clean_tags(body.tags),
            seo_title: body.seo_title,
            seo_description: body.seo_description,
            author_name: body.author_name,
            status,
            scheduled_for: body.scheduled_for.filter(|_| status == ArticleStatus::Scheduled),
            product_id: body.product_id,
            ai_provider: body.ai_provider,
            ai_model: body.ai_model,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(article = %row.public_id, slug = %row.slug, "article created");
    Ok((StatusCode::CREATED, ApiResponse::new(req_id.0, row.into())))
}

pub(super) async fn get_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ArticleItem>>, ApiError> {
    let row = pressroom_db::get_article_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let publications = pressroom_db::list_publications_for_article(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut item = ArticleItem::from(row);
    item.publications = Some(publications.into_iter().map(PublicationItem::from).collect());
    Ok(ApiResponse::new(req_id.0, item))
}

pub(super) async fn update_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
    Json(body): Json<UpdateArticleRequest>,
) -> Result<Json<ApiResponse<ArticleItem>>, ApiError> {
    let title = body
        .title
        .as_deref()
        .map(|t| title_or_error(&req_id.0, t))
        .transpose()?;
    let slug = body
        .slug
        .as_deref()
        .map(|s| resolve_slug(&req_id.0, Some(s), ""))
        .transpose()?;

    let row = pressroom_db::update_article(
        &state.pool,
        public_id,
        &ArticleChanges {
            title,
            slug,
            excerpt: body.excerpt,
            body_markdown: body.body_markdown,
            featured_image_url: body.featured_image_url,
            tags: body.tags.map(clean_tags),
            seo_title: body.seo_title,
            seo_description: body.seo_description,
            author_name: body.author_name,
            product_id: body.product_id,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(req_id.0, row.into()))
}

pub(super) async fn delete_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedItem>>, ApiError> {
    pressroom_db::delete_article(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(article = %public_id, "article deleted");
    Ok(ApiResponse::new(
        req_id.0,
        DeletedItem {
            id: public_id,
            deleted: true,
        },
    ))
}

pub(super) async fn set_article_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<ApiResponse<ArticleItem>>, ApiError> {
    let row =
        pressroom_db::set_article_status(&state.pool, public_id, body.status, body.scheduled_for)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(article = %public_id, status = %row.status, "article status changed");
    Ok(ApiResponse::new(req_id.0, row.into()))
}
