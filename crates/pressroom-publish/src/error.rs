use pressroom_core::Platform;
use pressroom_shopify::ShopifyError;
use thiserror::Error;

const MAX_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{0} is not configured")]
    NotConfigured(Platform),

    #[error("{platform} rejected the credentials (HTTP {status})")]
    Unauthorized { platform: Platform, status: u16 },

    #[error("{platform} API error (HTTP {status}): {message}")]
    Api {
        platform: Platform,
        status: u16,
        message: String,
    },

    /// The platform accepted the request but refused the content.
    #[error("{platform} rejected the post: {message}")]
    Rejected { platform: Platform, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode {platform} response: {source}")]
    Deserialize {
        platform: Platform,
        #[source]
        source: serde_json::Error,
    },

    #[error("{platform} does not support {operation}")]
    Unsupported {
        platform: Platform,
        operation: &'static str,
    },

    #[error("invalid {platform} credentials: {reason}")]
    InvalidCredentials { platform: Platform, reason: String },

    #[error("Shopify error: {0}")]
    Shopify(#[source] ShopifyError),
}

impl From<ShopifyError> for PublishError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::Unauthorized { status } => PublishError::Unauthorized {
                platform: Platform::Shopify,
                status,
            },
            ShopifyError::UserErrors(message) => PublishError::Rejected {
                platform: Platform::Shopify,
                message,
            },
            other => PublishError::Shopify(other),
        }
    }
}

/// Pulls a human-readable message out of a platform error body.
///
/// Handles `{"message": ...}` (WordPress, Webflow) and
/// `{"errors": [{"message": ...}]}` (Ghost, Medium); anything else is
/// returned raw, truncated.
pub(crate) fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .or_else(|| {
                    value
                        .get("errors")
                        .and_then(|e| e.get(0))
                        .and_then(|e| e.get("message"))
                        .and_then(serde_json::Value::as_str)
                })
                .map(str::to_owned)
        });

    from_json.unwrap_or_else(|| body.trim().chars().take(MAX_MESSAGE_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_message_from_known_shapes() {
        assert_eq!(
            error_message(r#"{"code":"rest_cannot_create","message":"Sorry, you are not allowed"}"#),
            "Sorry, you are not allowed"
        );
        assert_eq!(
            error_message(r#"{"errors":[{"message":"Validation error, cannot save post.","type":"ValidationError"}]}"#),
            "Validation error, cannot save post."
        );
        assert_eq!(error_message("  Bad Gateway  "), "Bad Gateway");
    }

    #[test]
    fn shopify_user_errors_become_rejections() {
        let err = PublishError::from(ShopifyError::UserErrors("handle: taken".into()));
        assert!(matches!(
            err,
            PublishError::Rejected {
                platform: Platform::Shopify,
                ..
            }
        ));
        let err = PublishError::from(ShopifyError::Unauthorized { status: 403 });
        assert_eq!(err.to_string(), "shopify rejected the credentials (HTTP 403)");
    }
}
