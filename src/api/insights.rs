use axum::{extract::State, Json};
use chrono::Timelike;

use crate::{
    api::error::ApiError,
    insights::{
        insights, model_metrics, national, peak_alerts, weekly_prediction, InsightReport,
        ModelMetrics, NationalAnalytics, PeakAlertBoard, WeeklyPrediction,
    },
    state::AppState,
    utils::local_now,
};

const WEEK_DAYS: usize = 7;

/// GET /ai/insights - Operator insights for the next 24 hours
pub async fn ai_insights(State(state): State<AppState>) -> Result<Json<InsightReport>, ApiError> {
    let now = local_now();
    let points = state.day_ahead(now)?;
    Ok(Json(insights(&points, now.hour())))
}

/// GET /ai/national - Regional breakdown scaled to the current hour
pub async fn national_analytics() -> Json<NationalAnalytics> {
    Json(national(local_now().hour()))
}

/// GET /ai/predict/weekly
pub async fn weekly(State(state): State<AppState>) -> Result<Json<WeeklyPrediction>, ApiError> {
    let now = local_now();
    let predictor = state.engine.predictor();
    let days = state.engine.forecast_daily(
        now.date_naive(),
        WEEK_DAYS,
        state.cfg.forecast.default_base_temperature_c,
    )?;
    Ok(Json(weekly_prediction(
        days,
        predictor.kind(),
        predictor.model().map(|m| &**m),
        now,
    )))
}

/// GET /ai/alerts - Peak warnings from the 24 hour forecast
pub async fn forecast_alerts(State(state): State<AppState>) -> Result<Json<PeakAlertBoard>, ApiError> {
    let now = local_now();
    let points = state.day_ahead(now)?;
    Ok(Json(peak_alerts(&points, now)))
}

/// GET /ai/model/metrics
pub async fn metrics(State(state): State<AppState>) -> Json<ModelMetrics> {
    let predictor = state.engine.predictor();
    Json(model_metrics(
        predictor.kind(),
        predictor.model().map(|m| &**m),
        state.repos.dataset.snapshot().len(),
    ))
}
