//! Administrative endpoints, guarded by the `admin` role.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use serde_json::{Value, json};
use time::OffsetDateTime;

use airpower_auth::{AdminAuth, UserRecord, UserStatus};

use super::ApiResult;
use crate::server::AppState;

/// A user as exposed to administrators. Never includes the password
/// hash.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub role: String,
    pub status: UserStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<UserRecord> for UserSummary {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// `GET /api/admin/users`
pub async fn list_users(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let users: Vec<UserSummary> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(Json(json!({ "users": users })))
}

/// `POST /api/admin/users/{id}/suspend`
///
/// Suspends the account and drops every cached identity for it, so the
/// suspension takes effect before outstanding tokens expire.
pub async fn suspend_user(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if state.users.find_by_id(&id).await?.is_none() {
        return Err(super::ApiError::not_found("user"));
    }
    state.users.set_status(&id, UserStatus::Suspended).await?;
    state.cache.invalidate_subject(&id).await?;
    tracing::info!(user_id = %id, admin = %admin.id, "user suspended");
    Ok(Json(json!({ "message": "user suspended" })))
}
