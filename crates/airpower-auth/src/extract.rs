//! Axum extractors attaching the authenticated identity to requests.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::audit::ActivityLog;
use crate::authenticator::TokenAuthenticator;
use crate::error::AuthError;
use crate::identity::Identity;

/// State the extractors need, shared by the whole application.
///
/// Include this in the application state and expose it via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// The token authentication flow.
    pub authenticator: Arc<TokenAuthenticator>,
    /// Best-effort request activity sink.
    pub activity: Arc<dyn ActivityLog>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(authenticator: Arc<TokenAuthenticator>, activity: Arc<dyn ActivityLog>) -> Self {
        Self {
            authenticator,
            activity,
        }
    }
}

/// Extractor that authenticates the bearer token on the request.
///
/// On success the request's [`Identity`] is attached and the request is
/// recorded in the activity log. Any failure rejects the request with
/// the mapped status code.
pub struct BearerAuth(pub Identity);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let identity = auth_state.authenticator.authenticate(header).await?;

        auth_state
            .activity
            .record(&identity.id, parts.method.as_str(), parts.uri.path())
            .await;

        Ok(Self(identity))
    }
}

/// Extractor that additionally requires the `admin` role.
pub struct AdminAuth(pub Identity);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerAuth(identity) = BearerAuth::from_request_parts(parts, state).await?;
        identity.require_role("admin")?;
        Ok(Self(identity))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingCredential { .. }
            | Self::InvalidCredential { .. }
            | Self::ExpiredCredential
            | Self::UnknownSubject { .. } => StatusCode::UNAUTHORIZED,
            Self::InactiveAccount | Self::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            Self::ServiceUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Infrastructure detail stays in the logs, not in the response.
        let message = match &self {
            Self::ServiceUnavailable { message } => {
                tracing::error!(error = %message, "authentication infrastructure failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = axum::Json(json!({ "message": message }));

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_responses_carry_expected_status() {
        let cases = [
            (
                AuthError::missing_credential("no header"),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AuthError::invalid_credential("bad"),
                StatusCode::UNAUTHORIZED,
            ),
            (AuthError::ExpiredCredential, StatusCode::UNAUTHORIZED),
            (AuthError::unknown_subject("u9"), StatusCode::UNAUTHORIZED),
            (AuthError::InactiveAccount, StatusCode::FORBIDDEN),
            (
                AuthError::insufficient_role("admin"),
                StatusCode::FORBIDDEN,
            ),
            (
                AuthError::service_unavailable("cache down"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);
            if expected == StatusCode::UNAUTHORIZED {
                assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
            }
        }
    }
}
