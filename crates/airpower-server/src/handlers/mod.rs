//! HTTP handlers for the Airpower API.

pub mod admin;
pub mod auth;
pub mod budgets;
pub mod health;
pub mod readings;
pub mod recommendations;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use airpower_auth::AuthError;
use airpower_core::CoreError;
use airpower_storage::StorageError;

pub(crate) const BUDGETS: &str = "budgets";
pub(crate) const READINGS: &str = "readings";
pub(crate) const RECOMMENDATIONS: &str = "recommendations";

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors an API handler can produce, mapped onto HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    /// Authentication or authorization failure. Mapped by the auth layer.
    Auth(AuthError),
    /// The requested document does not exist for this owner.
    NotFound { what: String },
    /// The request payload failed validation.
    Validation { message: String },
    /// The request conflicts with existing state.
    Conflict { message: String },
    /// Anything infrastructure-shaped.
    Internal { message: String },
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { collection, .. } => Self::not_found(collection),
            StorageError::AlreadyExists { collection, id } => {
                Self::conflict(format!("{collection}/{id} already exists"))
            }
            StorageError::InvalidDocument { message } => Self::validation(message),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message } => Self::validation(message),
            CoreError::Serialization { message } => Self::internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(err) => err.into_response(),
            Self::NotFound { what } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": format!("{what} not found") })),
            )
                .into_response(),
            Self::Validation { message } => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            Self::Conflict { message } => {
                (StatusCode::CONFLICT, Json(json!({ "message": message }))).into_response()
            }
            Self::Internal { message } => {
                tracing::error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Decodes a stored document into a domain type.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    doc: &airpower_storage::StoredDocument,
) -> ApiResult<T> {
    serde_json::from_value(doc.document.clone())
        .map_err(|e| ApiError::internal(format!("corrupt document {}: {e}", doc.id)))
}

/// Encodes a domain value for storage.
pub(crate) fn encode<T: serde::Serialize>(value: &T) -> ApiResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(format!("encoding failed: {e}")))
}
