//! Signed bearer tokens.
//!
//! Tokens are JWTs carrying `{"sub": "<user id>", "exp": <unix seconds>}`.
//! Access and refresh tokens share this shape and differ only in lifetime.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use order_desk_core::UserId;

use super::AuthError;
use crate::config::{TokenConfig, secret_bytes};

/// Lifetime of refresh tokens.
pub const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
}

impl TokenService {
    /// Create a token service from configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        let secret = secret_bytes(&config.secret);

        // Expiry is compared by hand against a caller-supplied instant.
        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            header: Header::new(config.algorithm),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_token_ttl: config.access_token_ttl,
        }
    }

    /// Issue an access token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if the token cannot be signed.
    pub fn issue_access(&self, user_id: UserId) -> Result<String, AuthError> {
        self.issue(user_id, self.access_token_ttl)
    }

    /// Issue a refresh token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if the token cannot be signed.
    pub fn issue_refresh(&self, user_id: UserId) -> Result<String, AuthError> {
        self.issue(user_id, Duration::days(REFRESH_TOKEN_DAYS))
    }

    /// Issue a token for `user_id` that expires `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if the token cannot be signed.
    pub fn issue(&self, user_id: UserId, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(user_id, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if the token cannot be signed.
    pub fn issue_at(
        &self,
        user_id: UserId,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp(),
        };

        jsonwebtoken::encode(&self.header, &claims, &self.encoding_key)
            .map_err(AuthError::TokenSigning)
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is not valid now.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against a fixed instant.
    ///
    /// The token is valid while `now < exp`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the signature is wrong, the payload
    /// is malformed, the token has expired, or the subject is not an integer.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::InvalidToken
            })?;

        if now.timestamp() >= data.claims.exp {
            tracing::debug!(exp = data.claims.exp, "token expired");
            return Err(AuthError::InvalidToken);
        }

        data.claims.sub.parse().map_err(|e| {
            tracing::debug!(error = %e, "token subject rejected");
            AuthError::InvalidToken
        })
    }
}
