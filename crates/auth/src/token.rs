//! HS256 bearer tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use userguard_core::UserId;

use crate::claims::{validate_claims, TokenClaims, TokenValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed or unverifiable token: {0}")]
    Invalid(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Mints tokens for authenticated users.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: UserId, email: &str, now: DateTime<Utc>) -> Result<String, TokenError>;
}

/// Checks signature and time window of a presented token.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError>;
}

/// Symmetric HS256 codec with a fixed token lifetime.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer for Hs256TokenCodec {
    fn issue(&self, user_id: UserId, email: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token lifetime overflows the clock".to_string()))?;
        let claims = TokenClaims {
            sub: user_id,
            email: email.to_string(),
            iat: now,
            exp,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl TokenVerifier for Hs256TokenCodec {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        // The time window is checked against the caller's clock below.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> Hs256TokenCodec {
        Hs256TokenCodec::new(secret.as_bytes(), Duration::hours(1))
    }

    #[test]
    fn issued_token_verifies() {
        let codec = codec("s3cret");
        let id = UserId::new();
        let now = Utc::now();

        let token = codec.issue(id, "alice@example.com", now).unwrap();
        let claims = codec.verify(&token, now).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = codec("one").issue(UserId::new(), "a@example.com", now).unwrap();
        assert!(matches!(codec("two").verify(&token, now), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec("s3cret");
        let now = Utc::now();
        let token = codec.issue(UserId::new(), "a@example.com", now).unwrap();

        let later = now + Duration::hours(2);
        assert_eq!(
            codec.verify(&token, later),
            Err(TokenError::Claims(TokenValidationError::Expired))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = codec("s3cret");
        assert!(matches!(codec.verify("not.a.jwt", Utc::now()), Err(TokenError::Invalid(_))));
        assert!(matches!(codec.verify("", Utc::now()), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn lifetime_past_the_clock_range_fails_to_issue() {
        let codec = Hs256TokenCodec::new(b"s3cret", Duration::days(100_000_000));
        let err = codec.issue(UserId::new(), "a@example.com", Utc::now()).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    #[test]
    fn debug_output_hides_keys() {
        let rendered = format!("{:?}", codec("s3cret"));
        assert!(!rendered.contains("s3cret"));
    }
}
