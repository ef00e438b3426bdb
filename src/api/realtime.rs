use axum::{extract::State, Json};

use crate::{
    simulation::realtime::{AdvisoryBoard, FleetStatus, GridStatus, LiveSummary, LiveWeather, RegionalDemand},
    state::AppState,
    utils::local_now,
};

/// GET /realtime/status
pub async fn status(State(state): State<AppState>) -> Json<GridStatus> {
    Json(state.realtime.status(local_now()))
}

/// GET /realtime/power-plants
pub async fn power_plants(State(state): State<AppState>) -> Json<FleetStatus> {
    Json(state.realtime.power_plants(local_now()))
}

/// GET /realtime/regional
pub async fn regional(State(state): State<AppState>) -> Json<RegionalDemand> {
    Json(state.realtime.regional(local_now()))
}

/// GET /realtime/weather
pub async fn weather(State(state): State<AppState>) -> Json<LiveWeather> {
    Json(state.realtime.weather(local_now()))
}

/// GET /realtime/alerts
pub async fn alerts(State(state): State<AppState>) -> Json<AdvisoryBoard> {
    Json(state.realtime.advisories(local_now()))
}

/// GET /realtime/summary
pub async fn summary(State(state): State<AppState>) -> Json<LiveSummary> {
    Json(state.realtime.summary(local_now()))
}
