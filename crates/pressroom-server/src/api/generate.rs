use axum::{extract::State, Extension, Json};
use pressroom_ai::{GenerationOutput, GenerationRequest, ProductContext, Tone};
use pressroom_core::{
    validate_title, AiProvider, ArticleStatus, NormalizedProduct, MAX_SLUG_LEN, MAX_TITLE_LEN,
};
use pressroom_db::{ArticleRow, DbError, NewArticle};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::articles::{clean_tags, resolve_slug, ArticleItem};
use super::{map_ai_error, map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct GenerateRequest {
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tone: Tone,
    pub target_word_count: Option<u32>,
    pub provider: Option<AiProvider>,
    /// Internal product id to write about.
    pub product_id: Option<i64>,
    /// Store the result as a draft article.
    #[serde(default)]
    pub save: bool,
    pub author_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct GenerateResponse {
    #[serde(flatten)]
    output: GenerationOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_article: Option<ArticleItem>,
}

async fn load_product_context(
    state: &AppState,
    request_id: &str,
    product_id: i64,
) -> Result<ProductContext, ApiError> {
    let product = pressroom_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?;
    let variants = pressroom_db::list_variants_for_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?;

    Ok(ProductContext::from_product(&NormalizedProduct {
        source_product_id: product.source_product_id,
        title: product.title,
        handle: product.handle,
        vendor: product.vendor,
        product_type: product.product_type,
        description_html: product.description_html,
        tags: product.tags,
        source_url: product.source_url,
        image_url: product.image_url,
        variants: variants.iter().map(|v| v.to_normalized()).collect(),
    }))
}

const SLUG_SUFFIX_LEN: usize = 6;

/// Clamps a model-written title to [`MAX_TITLE_LEN`] characters before the
/// usual title check.
fn draft_title(request_id: &str, raw: &str) -> Result<String, ApiError> {
    let clamped: String = raw.trim().chars().take(MAX_TITLE_LEN).collect();
    validate_title(&clamped)
        .map_err(|e| ApiError::new(request_id, "validation_error", e.to_string()))
}

/// `base` with a `-suffix` appended, trimmed so the result stays within
/// [`MAX_SLUG_LEN`].
fn suffixed_slug(base: &str, suffix: &str) -> String {
    let suffix = &suffix[..suffix.len().min(SLUG_SUFFIX_LEN)];
    // Slugs are ASCII, so byte and char lengths agree.
    let keep = base.len().min(MAX_SLUG_LEN - suffix.len() - 1);
    let trimmed = base[..keep].trim_end_matches('-');
    format!("{trimmed}-{suffix}")
}

/// Stores a generated article as a draft. A slug collision is retried once
/// with a random suffix so the generated text is not lost.
pub(super) async fn save_draft(
    state: &AppState,
    request_id: &str,
    output: &GenerationOutput,
    author_name: Option<String>,
    product_id: Option<i64>,
) -> Result<ArticleRow, ApiError> {
    let article = &output.article;
    let title = draft_title(request_id, &article.title)?;
    let mut new_article = NewArticle {
        slug: resolve_slug(request_id, None, &title)?,
        title,
        excerpt: Some(article.excerpt.clone()).filter(|e| !e.is_empty()),
        body_markdown: article.body_markdown.clone(),
        featured_image_url: None,
        tags: clean_tags(article.tags.clone()),
        seo_title: article.seo_title.clone(),
        seo_description: article.seo_description.clone(),
        author_name,
        status: ArticleStatus::Draft,
        scheduled_for: None,
        product_id,
        ai_provider: Some(output.provider),
        ai_model: Some(output.model.clone()),
    };

    let row = match pressroom_db::create_article(&state.pool, &new_article).await {
        Err(DbError::Conflict(_)) => {
            let suffix = Uuid::new_v4().simple().to_string();
            new_article.slug = suffixed_slug(&new_article.slug, &suffix);
            pressroom_db::create_article(&state.pool, &new_article).await
        }
        other => other,
    }
    .map_err(|e| map_db_error(request_id.to_owned(), &e))?;

    tracing::info!(article = %row.public_id, provider = %output.provider, "saved generated article");
    Ok(row)
}

pub(super) async fn generate_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponse>>, ApiError> {
    let generator = state
        .generators
        .resolve(body.provider)
        .map_err(|e| map_ai_error(req_id.0.clone(), &e))?;

    let product = match body.product_id {
        Some(id) => Some(load_product_context(&state, &req_id.0, id).await?),
        None => None,
    };

    let request = GenerationRequest {
        topic: body.topic,
        keywords: body.keywords,
        tone: body.tone,
        target_word_count: body.target_word_count,
        product,
    };
    let output = pressroom_ai::generate_article(generator.as_ref(), &request)
        .await
        .map_err(|e| map_ai_error(req_id.0.clone(), &e))?;

    let saved_article = if body.save {
        let row = save_draft(&state, &req_id.0, &output, body.author_name, body.product_id).await?;
        Some(ArticleItem::from(row))
    } else {
        None
    };

    Ok(ApiResponse::new(
        req_id.0,
        GenerateResponse {
            output,
            saved_article,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_generated_title_is_clamped() {
        let raw = format!("  {}  ", "Matcha ".repeat(60));
        let title = draft_title("r", &raw).unwrap();
        assert!(title.chars().count() <= MAX_TITLE_LEN);
        assert!(title.starts_with("Matcha Matcha"));
    }

    #[test]
    fn blank_generated_title_is_rejected() {
        let err = draft_title("r", "   ").unwrap_err();
        assert_eq!(err.error.code, "validation_error");
    }

    #[test]
    fn suffixed_slug_stays_within_limit() {
        let base = "a".repeat(MAX_SLUG_LEN);
        let slug = suffixed_slug(&base, "0123456789abcdef");
        assert_eq!(slug.len(), MAX_SLUG_LEN);
        assert!(slug.ends_with("-012345"));

        assert_eq!(suffixed_slug("green-tea", "abcdef99"), "green-tea-abcdef");
    }

    #[test]
    fn suffix_does_not_follow_a_dash() {
        let base = format!("{}-tea", "b".repeat(MAX_SLUG_LEN - 7 - 1));
        let slug = suffixed_slug(&base, "abcdef");
        assert!(!slug.contains("--"));
        assert!(slug.len() <= MAX_SLUG_LEN);
    }
}
