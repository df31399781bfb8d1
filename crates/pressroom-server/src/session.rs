//! Stateless signed session tokens.
//!
//! A token is `{expires_unix}.{hex hmac-sha256(expires_unix)}`. Nothing is
//! stored server-side; rotating the secret logs everyone out.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "pressroom_session";

/// Ten years; keeps `now + ttl` well inside chrono's range.
const MAX_TTL_HOURS: u64 = 87_600;

#[derive(Clone)]
pub struct SessionSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl SessionSigner {
    #[must_use]
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::hours(i64::try_from(ttl_hours.min(MAX_TTL_HOURS)).unwrap_or(1)),
        }
    }

    #[must_use]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issues a token valid until `now + ttl`, truncated to the second.
    /// Returns the token and its expiry.
    #[must_use]
    pub fn issue(&self, now: DateTime<Utc>) -> (String, DateTime<Utc>) {
        let expires_at = now + self.ttl;
        let expires = expires_at.timestamp();
        let token = format!("{expires}.{}", self.signature(expires));
        (token, DateTime::from_timestamp(expires, 0).unwrap_or(expires_at))
    }

    /// Returns the expiry of a valid, unexpired token.
    #[must_use]
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let (expires_raw, signature) = token.split_once('.')?;
        let expires: i64 = expires_raw.parse().ok()?;

        let expected = self.signature(expires);
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return None;
        }

        let expires_at = DateTime::from_timestamp(expires, 0)?;
        (expires_at > now).then_some(expires_at)
    }

    fn signature(&self, expires: i64) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length");
        mac.update(expires.to_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("secret", &"[redacted]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Compares a submitted password with the configured one in constant time.
#[must_use]
pub fn password_matches(submitted: &str, expected: &str) -> bool {
    bool::from(submitted.as_bytes().ct_eq(expected.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> SessionSigner {
        SessionSigner::new("test-secret", 24)
    }

    #[test]
    fn issued_token_verifies_until_expiry() {
        let now = Utc::now();
        let (token, issued_expiry) = signer().issue(now);

        let expires = signer().verify(&token, now).expect("fresh token is valid");
        assert_eq!(expires, issued_expiry);
        assert_eq!(expires.timestamp(), (now + Duration::hours(24)).timestamp());
        assert!(signer()
            .verify(&token, now + Duration::hours(25))
            .is_none());
    }

    #[test]
    fn tampered_expiry_is_rejected() {
        let now = Utc::now();
        let (token, _) = signer().issue(now);
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{signature}", (now + Duration::days(365)).timestamp());

        assert!(signer().verify(&forged, now).is_none());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let now = Utc::now();
        let (token, _) = SessionSigner::new("other", 24).issue(now);
        assert!(signer().verify(&token, now).is_none());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let now = Utc::now();
        for token in ["", "abc", "123", "123.", ".abc", "x.y"] {
            assert!(signer().verify(token, now).is_none(), "{token:?}");
        }
    }

    #[test]
    fn password_comparison() {
        assert!(password_matches("hunter2", "hunter2"));
        assert!(!password_matches("hunter", "hunter2"));
        assert!(!password_matches("", "hunter2"));
    }

    #[test]
    fn debug_redacts_secret() {
        assert!(!format!("{:?}", signer()).contains("test-secret"));
    }
}
