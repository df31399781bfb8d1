use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use pressroom_core::AppConfig;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;
use crate::session::{password_matches, SessionSigner, SESSION_COOKIE};

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Expiry of the session that authenticated the request; `None` when auth
/// is disabled. Stored as a request extension.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpiry(pub Option<DateTime<Utc>>);

/// Cookie-session auth settings used by middleware and the login routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    signer: Option<Arc<SessionSigner>>,
    password: Option<Arc<str>>,
    pub enabled: bool,
    /// Adds `Secure` to the session cookie.
    pub secure_cookie: bool,
}

impl AuthState {
    /// Builds auth config from `PRESSROOM_ADMIN_PASSWORD` and
    /// `PRESSROOM_SESSION_SECRET`.
    ///
    /// In development, missing values disable auth for local iteration.
    /// In non-development envs, missing values fail startup.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let is_development = config.env.is_development();
        let password = config.admin_password.as_deref().filter(|s| !s.is_empty());
        let secret = config.session_secret.as_deref().filter(|s| !s.is_empty());

        match (password, secret) {
            (Some(password), Some(secret)) => Ok(Self::new(
                password,
                secret,
                config.session_ttl_hours,
                !is_development,
            )),
            _ if is_development => {
                tracing::warn!(
                    "PRESSROOM_ADMIN_PASSWORD or PRESSROOM_SESSION_SECRET not set; \
                     session auth disabled in development environment"
                );
                Ok(Self::disabled())
            }
            _ => anyhow::bail!(
                "PRESSROOM_ADMIN_PASSWORD and PRESSROOM_SESSION_SECRET are required outside development"
            ),
        }
    }

    #[must_use]
    pub fn new(password: &str, secret: &str, ttl_hours: u64, secure_cookie: bool) -> Self {
        Self {
            signer: Some(Arc::new(SessionSigner::new(secret, ttl_hours))),
            password: Some(Arc::from(password)),
            enabled: true,
            secure_cookie,
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            signer: None,
            password: None,
            enabled: false,
            secure_cookie: false,
        }
    }

    /// Issues a session token and its expiry when `password` is correct.
    pub(crate) fn login(
        &self,
        password: &str,
        now: DateTime<Utc>,
    ) -> Option<(String, DateTime<Utc>)> {
        let (Some(signer), Some(expected)) = (&self.signer, &self.password) else {
            return None;
        };
        password_matches(password, expected).then(|| signer.issue(now))
    }

    fn session_expiry(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let signer = self.signer.as_ref()?;
        let token = extract_cookie(headers, SESSION_COOKIE)?;
        signer.verify(token, now)
    }

    /// `Set-Cookie` value carrying `token`.
    pub(crate) fn session_cookie(&self, token: &str) -> String {
        let max_age = self.signer.as_ref().map_or(0, |s| s.ttl_secs());
        self.cookie(token, max_age)
    }

    /// `Set-Cookie` value that deletes the session cookie.
    pub(crate) fn cleared_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

/// Error response in the API envelope, tagged with the request's id.
fn middleware_error(req: &Request, code: &'static str, message: &'static str) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map_or_else(|| Uuid::new_v4().to_string(), |id| id.0.clone());
    ApiError::new(request_id, code, message).into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing a valid session cookie when auth is enabled.
pub async fn require_session(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        req.extensions_mut().insert(SessionExpiry(None));
        return next.run(req).await;
    }

    match auth.session_expiry(req.headers(), Utc::now()) {
        Some(expires_at) => {
            req.extensions_mut().insert(SessionExpiry(Some(expires_at)));
            next.run(req).await
        }
        None => middleware_error(&req, "unauthorized", "missing, expired, or invalid session"),
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return middleware_error(&req, "rate_limited", "rate limit exceeded");
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

/// Returns the value of cookie `name` from the `Cookie` headers.
fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(cookie));
        headers
    }

    #[test]
    fn extract_cookie_finds_named_cookie_among_others() {
        let headers = headers("theme=dark; pressroom_session=123.abc; lang=en");
        assert_eq!(extract_cookie(&headers, SESSION_COOKIE), Some("123.abc"));
    }

    #[test]
    fn extract_cookie_ignores_empty_and_missing() {
        assert_eq!(
            extract_cookie(&headers("pressroom_session="), SESSION_COOKIE),
            None
        );
        assert_eq!(extract_cookie(&headers("theme=dark"), SESSION_COOKIE), None);
        assert_eq!(extract_cookie(&HeaderMap::new(), SESSION_COOKIE), None);
    }

    #[test]
    fn login_issues_verifiable_token_only_for_correct_password() {
        let auth = AuthState::new("hunter2", "secret", 1, false);
        let now = Utc::now();

        assert!(auth.login("wrong", now).is_none());
        let (token, _) = auth.login("hunter2", now).expect("correct password");

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")).unwrap(),
        );
        assert!(auth.session_expiry(&headers, now).is_some());
    }

    #[test]
    fn disabled_auth_never_logs_in() {
        assert!(AuthState::disabled().login("", Utc::now()).is_none());
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = AuthState::new("p", "s", 2, true).session_cookie("tok");
        assert_eq!(
            cookie,
            "pressroom_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=7200; Secure"
        );

        let cleared = AuthState::new("p", "s", 2, false).cleared_cookie();
        assert_eq!(
            cleared,
            "pressroom_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
    }
}
