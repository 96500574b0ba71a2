//! JWT issuing and verification (HS256).

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthError;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user id the token was issued for.
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Builds claims for `subject` expiring `ttl` from now.
    #[must_use]
    pub fn new(subject: impl Into<String>, ttl: Duration) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            sub: subject.into(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
        }
    }
}

/// Verifies an opaque token string into claims.
///
/// The authenticator depends on this trait rather than on a concrete
/// verifier so tests can count verification calls.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verifies `token` and returns its claims.
    async fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HS256 token service over a shared secret.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Creates a service from the shared secret bytes.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is invalid the second `exp` passes.
        validation.leeway = 0;
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issues a signed token for `subject` with the given lifetime.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims::new(subject, ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::service_unavailable(format!("token signing failed: {e}")))
    }

    /// Decodes and validates a token.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
                _ => AuthError::invalid_credential(err.to_string()),
            })
    }
}

#[async_trait]
impl TokenVerifier for JwtService {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode(token)
    }
}
