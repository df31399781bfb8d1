use axum::{extract::State, Extension, Json};
use pressroom_shopify::Blog;

use crate::middleware::RequestId;

use super::{map_shopify_error, ApiError, ApiResponse, AppState};

/// Blogs on the connected store, used to pick `SHOPIFY_DEFAULT_BLOG_ID`.
pub(super) async fn list_blogs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Blog>>>, ApiError> {
    let Some(client) = state.shopify.as_ref() else {
        return Err(ApiError::new(
            req_id.0,
            "not_configured",
            "Shopify Admin credentials are not configured",
        ));
    };

    let blogs = client
        .list_blogs()
        .await
        .map_err(|e| map_shopify_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(req_id.0, blogs))
}
