use axum::{
    extract::{Path, State},
    Json,
};
use itertools::Itertools;

use crate::{
    api::error::ApiError,
    domain::grid::{find_city, CITIES},
    forecast::{national_weather, CurrentWeather, NationalWeather},
    state::AppState,
};

/// GET /external/weather/current/{city}
pub async fn current(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<CurrentWeather>, ApiError> {
    let city = find_city(city.trim()).ok_or_else(|| {
        ApiError::NotFound(format!(
            "city '{city}'. Available: {}",
            CITIES.iter().map(|c| c.name).join(", ")
        ))
    })?;
    Ok(Json(state.weather.current(city).await))
}

/// GET /external/weather/all
pub async fn all(State(state): State<AppState>) -> Json<NationalWeather> {
    Json(national_weather(state.weather.as_ref()).await)
}
