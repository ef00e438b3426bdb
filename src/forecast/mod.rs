//! Demand forecasting: pattern tables, predictors, horizons and weather.

pub mod engine;
pub mod patterns;
pub mod predictor;
pub mod retrain;
pub mod weather;

pub use engine::{diurnal_temperature, weekday_name, ForecastEngine, Horizon, HorizonForecast};
pub use patterns::{compute_patterns, PatternStore};
pub use predictor::{
    build_predictor, validate_input, BlendedPredictor, DemandPredictor, ForecastError,
    PatternPredictor, PredictorKind,
};
pub use retrain::{RebuildReport, Retrainer, TrainingOutcome};
pub use weather::{national_weather, CurrentWeather, NationalWeather, OpenWeatherClient, WeatherProvider};
