//! Power reading CRUD endpoints.

use axum::{
    Json,
    extract::{Path, Query as UrlQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;

use airpower_auth::BearerAuth;
use airpower_core::{PowerReading, UsageUnit};
use airpower_storage::Query;

use super::{ApiError, ApiResult, READINGS, decode, encode};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ReadingRequest {
    pub usage: f64,
    #[serde(default)]
    pub unit: UsageUnit,
    /// Measurement time; defaults to now when absent.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    pub location: String,
    pub device_id: String,
    /// Cost reported by the meter, when it supplies one.
    #[serde(default)]
    pub cost: Option<f64>,
}

fn validate_cost(cost: Option<f64>) -> ApiResult<Option<f64>> {
    match cost {
        Some(value) if !value.is_finite() || value < 0.0 => {
            Err(ApiError::validation("cost must be a non-negative number"))
        }
        _ => Ok(cost),
    }
}

/// Optional list filters, all combined with AND.
#[derive(Debug, Default, Deserialize)]
pub struct ReadingFilters {
    pub location: Option<String>,
    pub device_id: Option<String>,
    pub anomaly: Option<bool>,
}

/// A reading as returned by the API, with the derived cost estimate.
#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    #[serde(flatten)]
    pub reading: PowerReading,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

impl ReadingResponse {
    fn new(reading: PowerReading) -> Self {
        let estimated_cost = reading.estimated_cost();
        Self {
            reading,
            estimated_cost,
        }
    }
}

async fn load_owned(state: &AppState, owner_id: &str, id: &str) -> ApiResult<PowerReading> {
    let doc = state
        .storage
        .read(READINGS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("reading"))?;
    let reading: PowerReading = decode(&doc)?;
    if reading.owner_id != owner_id {
        return Err(ApiError::not_found("reading"));
    }
    Ok(reading)
}

/// `GET /api/readings`
pub async fn list(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    UrlQuery(filters): UrlQuery<ReadingFilters>,
) -> ApiResult<Json<Value>> {
    let mut query = Query::new().owner(&identity.id);
    if let Some(location) = filters.location {
        query = query.filter("location", location);
    }
    if let Some(device_id) = filters.device_id {
        query = query.filter("device_id", device_id);
    }
    if let Some(anomaly) = filters.anomaly {
        query = query.filter("anomaly", anomaly);
    }

    let docs = state.storage.find(READINGS, &query).await?;
    let readings: Vec<ReadingResponse> = docs
        .iter()
        .map(decode::<PowerReading>)
        .collect::<ApiResult<Vec<_>>>()?
        .into_iter()
        .map(ReadingResponse::new)
        .collect();
    Ok(Json(json!({ "readings": readings })))
}

/// `POST /api/readings`
pub async fn create(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Json(req): Json<ReadingRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let timestamp = req.timestamp.unwrap_or_else(OffsetDateTime::now_utc);
    let mut reading = PowerReading::new(
        &identity.id,
        req.usage,
        req.unit,
        timestamp,
        &req.location,
        &req.device_id,
    )?;
    reading.cost = validate_cost(req.cost)?;

    state.storage.create(READINGS, &encode(&reading)?).await?;
    tracing::debug!(reading_id = %reading.id, owner = %identity.id, "reading recorded");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "reading recorded", "reading": ReadingResponse::new(reading) })),
    ))
}

/// `GET /api/readings/{id}`
pub async fn get(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReadingResponse>> {
    let reading = load_owned(&state, &identity.id, &id).await?;
    Ok(Json(ReadingResponse::new(reading)))
}

/// `PUT /api/readings/{id}`
pub async fn update(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReadingRequest>,
) -> ApiResult<Json<Value>> {
    let mut reading = load_owned(&state, &identity.id, &id).await?;
    let timestamp = req.timestamp.unwrap_or(reading.timestamp);
    reading.apply_update(req.usage, req.unit, timestamp, &req.location, &req.device_id)?;
    reading.cost = validate_cost(req.cost)?;

    state.storage.update(READINGS, &id, &encode(&reading)?).await?;
    Ok(Json(
        json!({ "message": "reading updated", "reading": ReadingResponse::new(reading) }),
    ))
}

/// `DELETE /api/readings/{id}`
pub async fn delete(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    load_owned(&state, &identity.id, &id).await?;
    state.storage.delete(READINGS, &id).await?;
    Ok(Json(json!({ "message": "reading deleted" })))
}

/// `POST /api/readings/{id}/anomaly`
pub async fn flag_anomaly(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut reading = load_owned(&state, &identity.id, &id).await?;
    reading.mark_anomaly();
    state.storage.update(READINGS, &id, &encode(&reading)?).await?;
    Ok(Json(
        json!({ "message": "reading flagged", "reading": ReadingResponse::new(reading) }),
    ))
}
