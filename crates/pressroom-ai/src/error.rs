use pressroom_core::AiProvider;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response other than auth and rate-limit failures.
    #[error("{provider} API error (HTTP {status}): {message}")]
    Api {
        provider: AiProvider,
        status: u16,
        message: String,
    },

    #[error("{provider} rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        provider: AiProvider,
        retry_after_secs: u64,
    },

    #[error("{provider} rejected the API key (HTTP {status})")]
    Unauthorized { provider: AiProvider, status: u16 },

    #[error("{provider} returned no text")]
    EmptyResponse { provider: AiProvider },

    #[error("failed to decode {provider} response: {source}")]
    Deserialize {
        provider: AiProvider,
        #[source]
        source: serde_json::Error,
    },

    /// The model's output could not be turned into an article.
    #[error("could not parse generated article: {0}")]
    Parse(String),

    #[error("AI provider {0} is not configured")]
    NotConfigured(AiProvider),

    #[error("invalid generation request: {0}")]
    InvalidRequest(String),
}

/// Error body shared by all three providers: `{"error": {"message": ...}}`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ProviderErrorBody {
    pub error: ProviderErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ProviderErrorDetail {
    pub message: String,
}

/// Maps a non-2xx provider response to an [`AiError`].
pub(crate) async fn error_from_response(
    provider: AiProvider,
    response: reqwest::Response,
) -> AiError {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(60);
        return AiError::RateLimited {
            provider,
            retry_after_secs,
        };
    }

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return AiError::Unauthorized {
            provider,
            status: status.as_u16(),
        };
    }

    match response.text().await {
        Ok(body) => {
            let message = serde_json::from_str::<ProviderErrorBody>(&body)
                .map_or(body, |parsed| parsed.error.message);
            AiError::Api {
                provider,
                status: status.as_u16(),
                message,
            }
        }
        Err(e) => AiError::Http(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_provider() {
        let err = AiError::RateLimited {
            provider: AiProvider::Anthropic,
            retry_after_secs: 60,
        };
        assert_eq!(
            err.to_string(),
            "anthropic rate limited, retry after 60 seconds"
        );

        let err = AiError::Api {
            provider: AiProvider::OpenAi,
            status: 400,
            message: "max_tokens is too large".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "openai API error (HTTP 400): max_tokens is too large"
        );
    }

    #[test]
    fn provider_error_body_parses_each_shape() {
        let openai = r#"{"error":{"message":"bad model","type":"invalid_request_error"}}"#;
        let anthropic = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let gemini = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;

        for (raw, expected) in [
            (openai, "bad model"),
            (anthropic, "Overloaded"),
            (gemini, "API key not valid"),
        ] {
            let parsed: ProviderErrorBody = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed.error.message, expected);
        }
    }
}
