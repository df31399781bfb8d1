use axum::{
    extract::{Path, State},
    Extension, Json,
};
use pressroom_core::{AiProvider, Platform};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_publish_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct PlatformItem {
    platform: Platform,
    display_name: &'static str,
    configured: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ProviderItem {
    provider: AiProvider,
    configured: bool,
    is_default: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct IntegrationsData {
    platforms: Vec<PlatformItem>,
    ai_providers: Vec<ProviderItem>,
    shopify_admin: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct VerifyData {
    platform: Platform,
    ok: bool,
    /// Account or site name reported by the platform.
    account: String,
}

pub(super) async fn list_platforms(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<IntegrationsData>> {
    let platforms = Platform::ALL
        .into_iter()
        .map(|platform| PlatformItem {
            platform,
            display_name: platform.display_name(),
            configured: state.publisher.is_configured(platform),
        })
        .collect();

    let default_provider = state.generators.default_provider();
    let ai_providers = AiProvider::ALL
        .into_iter()
        .map(|provider| ProviderItem {
            provider,
            configured: state.generators.is_configured(provider),
            is_default: provider == default_provider,
        })
        .collect();

    ApiResponse::new(
        req_id.0,
        IntegrationsData {
            platforms,
            ai_providers,
            shopify_admin: state.shopify.is_some(),
        },
    )
}

pub(super) async fn verify_platform(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(platform): Path<String>,
) -> Result<Json<ApiResponse<VerifyData>>, ApiError> {
    let platform: Platform = platform
        .parse()
        .map_err(|e: pressroom_core::CoreError| {
            ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
        })?;

    let account = state
        .publisher
        .verify(platform)
        .await
        .map_err(|e| map_publish_error(req_id.0.clone(), &e))?;

    tracing::info!(%platform, account = %account, "platform credentials verified");
    Ok(ApiResponse::new(
        req_id.0,
        VerifyData {
            platform,
            ok: true,
            account,
        },
    ))
}
