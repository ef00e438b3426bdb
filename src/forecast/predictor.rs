use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    PatternTable, PredictionInput, HOLIDAY_FACTOR, HUMIDITY_THRESHOLD_PERCENT, MIN_DEMAND_MW,
    REFERENCE_TEMPERATURE_C,
};
use crate::ml::ModelArtifact;

/// Weight of the pattern estimate when blending with the regression.
pub const PATTERN_WEIGHT: f64 = 0.6;
pub const MODEL_WEIGHT: f64 = 0.4;
/// Regression outputs at or below this are treated as implausible.
pub const MODEL_PLAUSIBILITY_FLOOR_MW: f64 = 100.0;

#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("hour must be within 0..=23, got {0}")]
    InvalidHour(u32),
    #[error("day_of_week must be within 0..=6, got {0}")]
    InvalidDayOfWeek(u32),
    #[error("month must be within 1..=12, got {0}")]
    InvalidMonth(u32),
    #[error("humidity must be within 0..=100, got {0}")]
    InvalidHumidity(f64),
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
    #[error("forecast horizon must cover at least one step")]
    EmptyHorizon,
}

pub fn validate_input(input: &PredictionInput) -> Result<(), ForecastError> {
    if input.hour > 23 {
        return Err(ForecastError::InvalidHour(input.hour));
    }
    if input.day_of_week > 6 {
        return Err(ForecastError::InvalidDayOfWeek(input.day_of_week));
    }
    if !(1..=12).contains(&input.month) {
        return Err(ForecastError::InvalidMonth(input.month));
    }
    if !input.temperature_c.is_finite() {
        return Err(ForecastError::NonFinite("temperature"));
    }
    if !input.humidity_percent.is_finite() {
        return Err(ForecastError::NonFinite("humidity"));
    }
    if !(0.0..=100.0).contains(&input.humidity_percent) {
        return Err(ForecastError::InvalidHumidity(input.humidity_percent));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    Pattern,
    Blended,
}

/// A demand model. Implementations are immutable snapshots; a new table or
/// artifact means a new predictor.
pub trait DemandPredictor: Send + Sync {
    fn predict(&self, input: &PredictionInput) -> Result<f64, ForecastError>;

    fn kind(&self) -> PredictorKind;

    fn patterns(&self) -> &PatternTable;

    fn model(&self) -> Option<&Arc<ModelArtifact>> {
        None
    }
}

/// Multipliers and weather adjustment only. Deterministic.
#[derive(Debug, Clone)]
pub struct PatternPredictor {
    table: Arc<PatternTable>,
}

impl PatternPredictor {
    pub fn new(table: Arc<PatternTable>) -> Self {
        Self { table }
    }

    /// Unfloored pattern estimate for validated input.
    fn raw(&self, input: &PredictionInput) -> f64 {
        let t = &self.table;
        let mut demand = t.base_demand_mw
            * t.hour_multiplier(input.hour)
            * t.weekday_multiplier(input.day_of_week)
            * t.month_multiplier(input.month);
        demand += (input.temperature_c - REFERENCE_TEMPERATURE_C) * t.temp_coefficient;
        if input.humidity_percent > HUMIDITY_THRESHOLD_PERCENT {
            demand *= t.humidity_coefficient;
        }
        if input.is_holiday {
            demand *= HOLIDAY_FACTOR;
        }
        demand
    }
}

impl DemandPredictor for PatternPredictor {
    fn predict(&self, input: &PredictionInput) -> Result<f64, ForecastError> {
        validate_input(input)?;
        Ok(self.raw(input).max(MIN_DEMAND_MW))
    }

    fn kind(&self) -> PredictorKind {
        PredictorKind::Pattern
    }

    fn patterns(&self) -> &PatternTable {
        &self.table
    }
}

/// Pattern estimate blended with a fitted regression when the regression
/// output is plausible; pattern-only otherwise.
#[derive(Debug, Clone)]
pub struct BlendedPredictor {
    pattern: PatternPredictor,
    model: Arc<ModelArtifact>,
}

impl BlendedPredictor {
    pub fn new(table: Arc<PatternTable>, model: Arc<ModelArtifact>) -> Self {
        Self {
            pattern: PatternPredictor::new(table),
            model,
        }
    }

    fn features(&self, input: &PredictionInput) -> Vec<f64> {
        let all = [
            input.temperature_c,
            input.hour as f64,
            input.day_of_week as f64,
            input.month as f64,
            input.humidity_percent,
            if input.is_holiday { 1.0 } else { 0.0 },
        ];
        all.into_iter().take(self.model.n_features()).collect()
    }
}

impl DemandPredictor for BlendedPredictor {
    fn predict(&self, input: &PredictionInput) -> Result<f64, ForecastError> {
        validate_input(input)?;
        let pattern = self.pattern.raw(input);
        let demand = match self.model.apply(&self.features(input)) {
            Ok(ml) if ml.is_finite() && ml > MODEL_PLAUSIBILITY_FLOOR_MW => {
                PATTERN_WEIGHT * pattern + MODEL_WEIGHT * ml
            }
            Ok(ml) => {
                debug!(ml, "implausible regression output, using pattern only");
                pattern
            }
            Err(e) => {
                debug!(error = %e, "regression failed, using pattern only");
                pattern
            }
        };
        Ok(demand.max(MIN_DEMAND_MW))
    }

    fn kind(&self) -> PredictorKind {
        PredictorKind::Blended
    }

    fn patterns(&self) -> &PatternTable {
        self.pattern.patterns()
    }

    fn model(&self) -> Option<&Arc<ModelArtifact>> {
        Some(&self.model)
    }
}

/// Picks the variant once, at construction.
pub fn build_predictor(
    table: Arc<PatternTable>,
    model: Option<Arc<ModelArtifact>>,
) -> Arc<dyn DemandPredictor> {
    match model {
        Some(model) => Arc::new(BlendedPredictor::new(table, model)),
        None => Arc::new(PatternPredictor::new(table)),
    }
}
