use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::{AuthState, RequestId, SessionExpiry};

use super::{ApiError, ApiResponse};

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionData {
    authenticated: bool,
    auth_enabled: bool,
    expires_at: Option<DateTime<Utc>>,
}

fn set_cookie(request_id: &str, cookie: &str) -> Result<HeaderMap, ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|_| ApiError::new(request_id, "internal_error", "invalid session cookie"))?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, value);
    Ok(headers)
}

pub(super) async fn login(
    State(auth): State<AuthState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<ApiResponse<SessionData>>), ApiError> {
    if !auth.enabled {
        return Ok((
            HeaderMap::new(),
            ApiResponse::new(
                req_id.0,
                SessionData {
                    authenticated: true,
                    auth_enabled: false,
                    expires_at: None,
                },
            ),
        ));
    }

    let Some((token, expires_at)) = auth.login(&body.password, Utc::now()) else {
        tracing::warn!(request_id = %req_id.0, "login rejected");
        return Err(ApiError::new(req_id.0, "unauthorized", "invalid password"));
    };

    let headers = set_cookie(&req_id.0, &auth.session_cookie(&token))?;

    Ok((
        headers,
        ApiResponse::new(
            req_id.0,
            SessionData {
                authenticated: true,
                auth_enabled: true,
                expires_at: Some(expires_at),
            },
        ),
    ))
}

pub(super) async fn logout(
    State(auth): State<AuthState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<(HeaderMap, Json<ApiResponse<SessionData>>), ApiError> {
    let headers = set_cookie(&req_id.0, &auth.cleared_cookie())?;
    Ok((
        headers,
        ApiResponse::new(
            req_id.0,
            SessionData {
                authenticated: false,
                auth_enabled: auth.enabled,
                expires_at: None,
            },
        ),
    ))
}

pub(super) async fn session(
    Extension(req_id): Extension<RequestId>,
    Extension(expiry): Extension<SessionExpiry>,
) -> Json<ApiResponse<SessionData>> {
    ApiResponse::new(
        req_id.0,
        SessionData {
            authenticated: true,
            auth_enabled: expiry.0.is_some(),
            expires_at: expiry.0,
        },
    )
}
