// JWT token generation and validation service

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::error::AuthError;
use crate::config::{JwtConfig, DEFAULT_JWT_EXPIRATION_HOURS, TOKEN_ISSUER};

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64, // user_id
    pub username: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
}

/// Token service for JWT operations
///
/// Holds the signing secret for the life of the process; it is built once at
/// startup and shared read-only between requests.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    clock_skew_secs: i64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build the service from its configuration
    ///
    /// A lifetime that is not positive or does not fit a `Duration` falls back
    /// to the default rather than minting tokens that can never validate.
    pub fn new(config: &JwtConfig) -> Self {
        let ttl = Duration::try_hours(config.expiration_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Unusable token lifetime of {} hours, using {} hours",
                    config.expiration_hours,
                    DEFAULT_JWT_EXPIRATION_HOURS
                );
                Duration::hours(DEFAULT_JWT_EXPIRATION_HOURS)
            });

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl,
            clock_skew_secs: config.clock_skew_secs.max(0),
        }
    }

    /// Issue a signed token asserting `user_id` / `username`
    pub fn issue(&self, user_id: i64, username: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(self.ttl.num_seconds()),
            iss: TOKEN_ISSUER.to_string(),
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Validate a token and return its claims
    ///
    /// Accepts only HMAC-signed tokens from this issuer whose `exp` has not
    /// passed and whose `nbf` is no further in the future than the allowed
    /// clock skew. Any failure is reported as `InvalidToken`.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_issuer(&[TOKEN_ISSUER]);
        // sub is numeric, so its presence is enforced by deserializing into Claims
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);
        validation.leeway = 0;
        validation.validate_exp = true;
        // nbf is checked below with skew; the library applies one leeway to both
        validation.validate_nbf = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {:?}", e.kind());
                AuthError::InvalidToken
            })?;

        let now = Utc::now().timestamp();
        if claims.nbf - self.clock_skew_secs > now {
            tracing::debug!("Token rejected: not valid before {}", claims.nbf);
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}
