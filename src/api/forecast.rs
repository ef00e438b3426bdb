use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    api::error::ApiError,
    domain::{hourly_confidence, DailyForecast, ForecastPoint, HorizonSummary, PredictionInput},
    forecast::{Horizon, HorizonForecast, PredictorKind},
    state::AppState,
    utils::{local_now, round2},
};

const WEEK_DAYS: usize = 7;
const DAY_HOURS: usize = 24;

/// Single prediction result
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    forecasted_demand: f64,
    confidence: f64,
    predictor: PredictorKind,
    timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForecastRequest {
    #[validate(range(min = -50.0, max = 60.0))]
    pub temperature: f64,
    #[validate(range(max = 23))]
    pub hour: u32,
    #[validate(range(max = 6))]
    pub day_of_week: u32,
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub is_holiday: bool,
    /// Accepted for compatibility, not used by the model.
    pub num_households: Option<u64>,
    pub population: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HorizonQuery {
    #[validate(range(min = -50.0, max = 60.0))]
    pub base_temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct Forecast24hResponse {
    forecasts: Vec<ForecastPoint>,
    base_temperature: f64,
    #[serde(flatten)]
    summary: HorizonSummary,
    predictor: PredictorKind,
    generated_at: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize)]
pub struct ForecastWeeklyResponse {
    forecasts: Vec<DailyForecast>,
    base_temperature: f64,
    total_weekly_mwh: f64,
    avg_daily_peak: f64,
    generated_at: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    avg_demand: f64,
    max_demand: f64,
    min_demand: f64,
    peak_hour: u32,
    low_hour: u32,
    total_energy_24h: f64,
    estimated_cost_birr: f64,
}

fn base_temperature(state: &AppState, query: Result<Query<HorizonQuery>, QueryRejection>) -> Result<f64, ApiError> {
    let Query(q) = query?;
    q.validate()?;
    Ok(q.base_temperature
        .unwrap_or(state.cfg.forecast.default_base_temperature_c))
}

/// GET /forecast - Demand for the current hour at the default temperature
pub async fn current_forecast(State(state): State<AppState>) -> Result<Json<ForecastResponse>, ApiError> {
    let now = local_now();
    let input = PredictionInput::new(
        state.cfg.forecast.default_base_temperature_c,
        now.hour(),
        now.weekday().num_days_from_monday(),
        now.month(),
    );
    let predictor = state.engine.predictor();
    let demand = predictor.predict(&input)?;
    Ok(Json(ForecastResponse {
        forecasted_demand: round2(demand),
        confidence: round2(hourly_confidence(input.hour)),
        predictor: predictor.kind(),
        timestamp: now,
    }))
}

/// POST /forecast - Demand for caller-supplied conditions
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;
    let mut input = PredictionInput::new(req.temperature, req.hour, req.day_of_week, req.month)
        .holiday(req.is_holiday);
    if let Some(humidity) = req.humidity {
        input = input.with_humidity(humidity);
    }
    let predictor = state.engine.predictor();
    let demand = predictor.predict(&input)?;
    Ok(Json(ForecastResponse {
        forecasted_demand: round2(demand),
        confidence: round2(hourly_confidence(input.hour)),
        predictor: predictor.kind(),
        timestamp: local_now(),
    }))
}

/// GET /forecast/24h - Hourly forecast from the current hour
pub async fn forecast_24h(
    State(state): State<AppState>,
    query: Result<Query<HorizonQuery>, QueryRejection>,
) -> Result<Json<Forecast24hResponse>, ApiError> {
    let base = base_temperature(&state, query)?;
    let now = local_now();
    let predictor = state.engine.predictor().kind();
    match state.engine.forecast_horizon(now, Horizon::Hours(DAY_HOURS), base)? {
        HorizonForecast::Hourly { points, summary } => Ok(Json(Forecast24hResponse {
            forecasts: points,
            base_temperature: base,
            summary,
            predictor,
            generated_at: now,
        })),
        HorizonForecast::Daily { .. } => Err(ApiError::InternalError(
            "hourly horizon produced daily output".to_string(),
        )),
    }
}

/// GET /forecast/weekly - Seven daily reductions starting today
pub async fn forecast_weekly(
    State(state): State<AppState>,
    query: Result<Query<HorizonQuery>, QueryRejection>,
) -> Result<Json<ForecastWeeklyResponse>, ApiError> {
    let base = base_temperature(&state, query)?;
    let now = local_now();
    let days = state
        .engine
        .forecast_daily(now.date_naive(), WEEK_DAYS, base)?;
    let total: f64 = days.iter().map(|d| d.total_energy_mwh).sum();
    let avg_peak = days.iter().map(|d| d.peak_demand_mw).sum::<f64>() / days.len().max(1) as f64;
    Ok(Json(ForecastWeeklyResponse {
        forecasts: days,
        base_temperature: base,
        total_weekly_mwh: round2(total),
        avg_daily_peak: round2(avg_peak),
        generated_at: now,
    }))
}

/// GET /analytics - 24 hour reduction with estimated cost
pub async fn analytics(State(state): State<AppState>) -> Result<Json<AnalyticsResponse>, ApiError> {
    let points = state.day_ahead(local_now())?;
    let s = HorizonSummary::from_points(&points)
        .ok_or_else(|| ApiError::InternalError("empty forecast".to_string()))?;
    Ok(Json(AnalyticsResponse {
        avg_demand: round2(s.avg_demand_mw),
        max_demand: round2(s.peak_demand_mw),
        min_demand: round2(s.min_demand_mw),
        peak_hour: s.peak_hour,
        low_hour: s.low_hour,
        total_energy_24h: round2(s.total_energy_mwh),
        estimated_cost_birr: round2(s.total_energy_mwh * state.cfg.forecast.cost_per_mwh_birr),
    }))
}
