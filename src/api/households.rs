use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use validator::Validate;

use crate::{
    api::error::ApiError,
    domain::{Household, HouseholdSpec},
    repo::HouseholdAnalytics,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct Deleted {
    message: String,
}

fn not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("household {id}"))
}

/// GET /households
pub async fn list(State(state): State<AppState>) -> Json<Vec<Household>> {
    Json(state.repos.households.list())
}

/// POST /households - Register a household and estimate its consumption
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<HouseholdSpec>, JsonRejection>,
) -> Result<(StatusCode, Json<Household>), ApiError> {
    let Json(spec) = payload?;
    spec.validate()?;
    Ok((StatusCode::CREATED, Json(state.repos.households.create(spec))))
}

/// GET /households/{id}
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Household>, ApiError> {
    let Path(id) = id?;
    state
        .repos
        .households
        .get(id)
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// PUT /households/{id} - Replace attributes; the estimate is re-derived
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<HouseholdSpec>, JsonRejection>,
) -> Result<Json<Household>, ApiError> {
    let Path(id) = id?;
    let Json(spec) = payload?;
    spec.validate()?;
    state
        .repos
        .households
        .update(id, spec)
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// DELETE /households/{id}
pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Deleted>, ApiError> {
    let Path(id) = id?;
    let removed = state
        .repos
        .households
        .delete(id)
        .ok_or_else(|| not_found(id))?;
    Ok(Json(Deleted {
        message: format!("Household '{}' deleted", removed.spec.name),
    }))
}

/// GET /households/analytics/summary
pub async fn analytics(State(state): State<AppState>) -> Json<HouseholdAnalytics> {
    Json(state.repos.households.analytics())
}
