//! Recommendation endpoints: generated advice and the saved list.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use airpower_auth::BearerAuth;
use airpower_core::{PowerReading, Recommendation};
use airpower_storage::Query;

use super::{ApiError, ApiResult, READINGS, RECOMMENDATIONS, decode, encode};
use crate::recommend;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub title: String,
    pub details: String,
}

/// `GET /api/recommendations`
///
/// Generates advice from the caller's readings. 404 when they have no
/// readings at all.
pub async fn generate(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let query = Query::new().owner(&identity.id);
    let docs = state.storage.find(READINGS, &query).await?;
    let readings: Vec<PowerReading> = docs
        .iter()
        .map(decode::<PowerReading>)
        .collect::<ApiResult<Vec<_>>>()?;

    if readings.is_empty() {
        return Err(ApiError::not_found("power data"));
    }

    let generated: Vec<Value> = recommend::generate(&readings)
        .into_iter()
        .map(|r| json!({ "title": r.title, "details": r.details }))
        .collect();
    Ok(Json(json!({ "recommendations": generated })))
}

/// `POST /api/recommendations`
pub async fn save(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Json(req): Json<SaveRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let recommendation = Recommendation::new(&identity.id, &req.title, &req.details)?;
    state
        .storage
        .create(RECOMMENDATIONS, &encode(&recommendation)?)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "recommendation saved", "recommendation": recommendation })),
    ))
}

/// `GET /api/recommendations/saved`
pub async fn saved(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let query = Query::new().owner(&identity.id);
    let docs = state.storage.find(RECOMMENDATIONS, &query).await?;
    let recommendations: Vec<Recommendation> = docs
        .iter()
        .map(decode::<Recommendation>)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(json!({ "recommendations": recommendations })))
}

/// `DELETE /api/recommendations/{id}`
pub async fn delete(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let doc = state
        .storage
        .read(RECOMMENDATIONS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("recommendation"))?;
    let recommendation: Recommendation = decode(&doc)?;
    if recommendation.owner_id != identity.id {
        return Err(ApiError::not_found("recommendation"));
    }
    state.storage.delete(RECOMMENDATIONS, &id).await?;
    Ok(Json(json!({ "message": "recommendation deleted" })))
}
