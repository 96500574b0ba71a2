//! Registration and login.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use airpower_auth::{AuthError, UserRecord};
use airpower_core::new_id;

use super::{ApiError, ApiResult};
use crate::server::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const DEFAULT_ROLE: &str = "viewer";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let email = req.email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("a valid email address is required"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    // The email uniqueness check and the insert must happen atomically,
    // otherwise two concurrent registrations can both pass the lookup.
    let guard = state.registration.lock().await;
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("email is already registered"));
    }

    let hash = hash_password(&req.password)?;
    let user = UserRecord::new(new_id(), email, DEFAULT_ROLE, Some(hash));
    state.users.create(&user).await?;
    drop(guard);

    tracing::info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "registered",
            "user": { "id": user.id, "email": user.email, "role": user.role },
        })),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let email = req.email.trim().to_ascii_lowercase();
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AuthError::invalid_credential("invalid email or password"))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| AuthError::invalid_credential("invalid email or password"))?;
    verify_password(&req.password, hash)?;

    if !user.is_active() {
        return Err(AuthError::InactiveAccount.into());
    }

    let token = state.jwt.issue(&user.id, state.config.auth.token_ttl())?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> ApiResult<()> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::internal(format!("corrupt password hash: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::invalid_credential("invalid email or password").into())
}
