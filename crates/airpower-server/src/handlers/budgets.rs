//! Budget CRUD endpoints.
//!
//! All routes are owner-scoped: a budget owned by someone else behaves
//! exactly like a budget that does not exist.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;

use airpower_auth::BearerAuth;
use airpower_core::{Budget, BudgetCategory};
use airpower_storage::Query;

use super::{ApiError, ApiResult, BUDGETS, decode, encode};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
    pub category: BudgetCategory,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub recurring: bool,
}

/// A budget as returned by the API, with the derived per-day remainder.
#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    #[serde(flatten)]
    pub budget: Budget,
    pub remaining_per_day: f64,
}

impl BudgetResponse {
    fn new(budget: Budget) -> Self {
        let remaining_per_day = budget.remaining_per_day(OffsetDateTime::now_utc());
        Self {
            budget,
            remaining_per_day,
        }
    }
}

async fn load_owned(state: &AppState, owner_id: &str, id: &str) -> ApiResult<Budget> {
    let doc = state
        .storage
        .read(BUDGETS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("budget"))?;
    let budget: Budget = decode(&doc)?;
    if budget.owner_id != owner_id {
        return Err(ApiError::not_found("budget"));
    }
    Ok(budget)
}

/// `GET /api/budgets`
pub async fn list(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let query = Query::new().owner(&identity.id);
    let docs = state.storage.find(BUDGETS, &query).await?;
    let budgets: Vec<BudgetResponse> = docs
        .iter()
        .map(decode::<Budget>)
        .collect::<ApiResult<Vec<_>>>()?
        .into_iter()
        .map(BudgetResponse::new)
        .collect();
    Ok(Json(json!({ "budgets": budgets })))
}

/// `POST /api/budgets`
pub async fn create(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Json(req): Json<BudgetRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut budget = Budget::new(
        &identity.id,
        &req.name,
        req.description,
        req.amount,
        req.category,
    )?;
    budget.due_date = req.due_date;
    budget.recurring = req.recurring;

    state.storage.create(BUDGETS, &encode(&budget)?).await?;
    tracing::debug!(budget_id = %budget.id, owner = %identity.id, "budget created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "budget created", "budget": BudgetResponse::new(budget) })),
    ))
}

/// `GET /api/budgets/{id}`
pub async fn get(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BudgetResponse>> {
    let budget = load_owned(&state, &identity.id, &id).await?;
    Ok(Json(BudgetResponse::new(budget)))
}

/// `PUT /api/budgets/{id}`
pub async fn update(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<BudgetRequest>,
) -> ApiResult<Json<Value>> {
    let mut budget = load_owned(&state, &identity.id, &id).await?;
    budget.apply_update(&req.name, req.description, req.amount, req.category)?;
    budget.due_date = req.due_date;
    budget.recurring = req.recurring;

    state.storage.update(BUDGETS, &id, &encode(&budget)?).await?;
    Ok(Json(
        json!({ "message": "budget updated", "budget": BudgetResponse::new(budget) }),
    ))
}

/// `DELETE /api/budgets/{id}`
pub async fn delete(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    load_owned(&state, &identity.id, &id).await?;
    state.storage.delete(BUDGETS, &id).await?;
    Ok(Json(json!({ "message": "budget deleted" })))
}

/// `GET /api/budgets/category/{category}`
///
/// Archived budgets are excluded.
pub async fn by_category(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<Value>> {
    let category = BudgetCategory::parse(&category)?;
    let query = Query::new()
        .owner(&identity.id)
        .filter("category", category.as_str())
        .filter("archived", false);
    let docs = state.storage.find(BUDGETS, &query).await?;
    let budgets: Vec<BudgetResponse> = docs
        .iter()
        .map(decode::<Budget>)
        .collect::<ApiResult<Vec<_>>>()?
        .into_iter()
        .map(BudgetResponse::new)
        .collect();
    Ok(Json(json!({ "budgets": budgets })))
}

/// `POST /api/budgets/{id}/archive`
pub async fn archive(
    BearerAuth(identity): BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut budget = load_owned(&state, &identity.id, &id).await?;
    budget.archive();
    state.storage.update(BUDGETS, &id, &encode(&budget)?).await?;
    Ok(Json(
        json!({ "message": "budget archived", "budget": BudgetResponse::new(budget) }),
    ))
}
