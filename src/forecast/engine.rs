use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use super::predictor::{DemandPredictor, ForecastError};
use crate::domain::{
    daily_confidence, hourly_confidence, prediction_interval, DailyForecast, ForecastPoint,
    HorizonSummary, PredictionInput, DEFAULT_HUMIDITY_PERCENT, DIURNAL_OFFSETS_C,
};

const HOURS_PER_DAY: u32 = 24;

/// Length of a forecast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Hours(usize),
    Days(usize),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HorizonForecast {
    Hourly {
        points: Vec<ForecastPoint>,
        summary: HorizonSummary,
    },
    Daily {
        days: Vec<DailyForecast>,
    },
}

/// Runs the active predictor across a horizon. The predictor is swapped as a
/// whole on retrain; every horizon is computed against one snapshot.
pub struct ForecastEngine {
    predictor: RwLock<Arc<dyn DemandPredictor>>,
}

impl ForecastEngine {
    pub fn new(predictor: Arc<dyn DemandPredictor>) -> Self {
        Self {
            predictor: RwLock::new(predictor),
        }
    }

    pub fn predictor(&self) -> Arc<dyn DemandPredictor> {
        self.predictor.read().clone()
    }

    pub fn install(&self, predictor: Arc<dyn DemandPredictor>) {
        *self.predictor.write() = predictor;
    }

    pub fn predict(&self, input: &PredictionInput) -> Result<f64, ForecastError> {
        self.predictor().predict(input)
    }

    pub fn forecast_horizon(
        &self,
        start: DateTime<FixedOffset>,
        horizon: Horizon,
        base_temperature_c: f64,
    ) -> Result<HorizonForecast, ForecastError> {
        match horizon {
            Horizon::Hours(n) => {
                let points = self.forecast_hourly(start, n, base_temperature_c)?;
                let summary =
                    HorizonSummary::from_points(&points).ok_or(ForecastError::EmptyHorizon)?;
                Ok(HorizonForecast::Hourly { points, summary })
            }
            Horizon::Days(n) => Ok(HorizonForecast::Daily {
                days: self.forecast_daily(start.date_naive(), n, base_temperature_c)?,
            }),
        }
    }

    /// `hours` points from `start` truncated to the hour, calendar fields taken
    /// from each point's own timestamp.
    pub fn forecast_hourly(
        &self,
        start: DateTime<FixedOffset>,
        hours: usize,
        base_temperature_c: f64,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        if hours == 0 {
            return Err(ForecastError::EmptyHorizon);
        }
        if !base_temperature_c.is_finite() {
            return Err(ForecastError::NonFinite("base_temperature"));
        }
        let predictor = self.predictor();
        let start = truncate_to_hour(start);

        (0..hours)
            .map(|offset| {
                let ts = start + Duration::hours(offset as i64);
                let input = PredictionInput::new(
                    diurnal_temperature(base_temperature_c, ts.hour()),
                    ts.hour(),
                    ts.weekday().num_days_from_monday(),
                    ts.month(),
                );
                let demand = predictor.predict(&input)?;
                let (lower, upper) = prediction_interval(demand);
                Ok(ForecastPoint {
                    timestamp: ts,
                    hour: input.hour,
                    temperature_c: input.temperature_c,
                    humidity_percent: input.humidity_percent,
                    predicted_demand_mw: demand,
                    confidence: hourly_confidence(input.hour),
                    lower_bound_mw: lower,
                    upper_bound_mw: upper,
                })
            })
            .collect()
    }

    /// One reduced day per date, each from 24 hourly predictions.
    pub fn forecast_daily(
        &self,
        start: NaiveDate,
        days: usize,
        base_temperature_c: f64,
    ) -> Result<Vec<DailyForecast>, ForecastError> {
        if days == 0 {
            return Err(ForecastError::EmptyHorizon);
        }
        if !base_temperature_c.is_finite() {
            return Err(ForecastError::NonFinite("base_temperature"));
        }
        let predictor = self.predictor();

        (0..days)
            .map(|i| {
                let date = start + Duration::days(i as i64);
                let weekday = date.weekday();
                let hourly = (0..HOURS_PER_DAY)
                    .map(|hour| {
                        let input = PredictionInput::new(
                            diurnal_temperature(base_temperature_c, hour),
                            hour,
                            weekday.num_days_from_monday(),
                            date.month(),
                        );
                        predictor.predict(&input).map(|d| (hour, d))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let summary =
                    HorizonSummary::from_hourly(&hourly).ok_or(ForecastError::EmptyHorizon)?;
                Ok(DailyForecast {
                    date,
                    day: weekday_name(weekday).to_string(),
                    avg_demand_mw: summary.avg_demand_mw,
                    peak_demand_mw: summary.peak_demand_mw,
                    min_demand_mw: summary.min_demand_mw,
                    peak_hour: summary.peak_hour,
                    total_energy_mwh: summary.total_energy_mwh,
                    confidence: daily_confidence(i),
                })
            })
            .collect()
    }
}

pub fn diurnal_temperature(base_temperature_c: f64, hour: u32) -> f64 {
    base_temperature_c + DIURNAL_OFFSETS_C.get(hour as usize).copied().unwrap_or(0.0)
}

fn truncate_to_hour(ts: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let drop = Duration::minutes(ts.minute() as i64)
        + Duration::seconds(ts.second() as i64)
        + Duration::nanoseconds(ts.nanosecond() as i64);
    ts - drop
}

pub fn weekday_name(day: chrono::Weekday) -> &'static str {
    use chrono::Weekday::*;
    match day {
        Mon => "Monday",
        Tue => "Tuesday",
        Wed => "Wednesday",
        Thu => "Thursday",
        Fri => "Friday",
        Sat => "Saturday",
        Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatternTable;
    use crate::forecast::predictor::PatternPredictor;

    fn engine() -> ForecastEngine {
        ForecastEngine::new(Arc::new(PatternPredictor::new(Arc::new(PatternTable::default()))))
    }

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn hourly_horizon_wraps_past_midnight() {
        let points = engine()
            .forecast_hourly(at("2024-03-10T22:41:07+03:00"), 24, 25.0)
            .unwrap();
        assert_eq!(points.len(), 24);
        let hours: Vec<u32> = points.iter().map(|p| p.hour).collect();
        let expected: Vec<u32> = (0..24).map(|i| (22 + i) % 24).collect();
        assert_eq!(hours, expected);
        assert_eq!(points[0].timestamp, at("2024-03-10T22:00:00+03:00"));
    }

    #[test]
    fn calendar_fields_follow_each_timestamp() {
        // Sunday 23:00 rolls into Monday 00:00 in a new month
        let e = engine();
        let points = e.forecast_hourly(at("2024-03-31T23:00:00+00:00"), 2, 25.0).unwrap();
        let p = e.predictor();
        let sunday = p
            .predict(&PredictionInput::new(25.0 - 3.0, 23, 6, 3))
            .unwrap();
        let monday = p.predict(&PredictionInput::new(25.0 - 4.0, 0, 0, 4)).unwrap();
        assert_eq!(points[0].predicted_demand_mw, sunday);
        assert_eq!(points[1].predicted_demand_mw, monday);
    }

    #[test]
    fn points_carry_confidence_and_bounds() {
        let points = engine().forecast_hourly(at("2024-06-05T14:00:00+00:00"), 1, 25.0).unwrap();
        let p = &points[0];
        assert!((p.confidence - 0.90).abs() < 1e-12);
        assert!(p.lower_bound_mw < p.predicted_demand_mw);
        assert!(p.upper_bound_mw > p.predicted_demand_mw);
        assert_eq!(p.temperature_c, 35.0);
    }

    #[test]
    fn weekly_horizon_reduces_each_day() {
        let days = engine()
            .forecast_daily(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 7, 25.0)
            .unwrap();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].day, "Monday");
        assert_eq!(days[6].day, "Sunday");
        for (i, d) in days.iter().enumerate() {
            assert!(d.peak_demand_mw >= d.avg_demand_mw);
            assert!(d.avg_demand_mw >= d.min_demand_mw);
            assert!((d.total_energy_mwh - d.avg_demand_mw * 24.0).abs() < 1e-6);
            assert!((d.confidence - (0.85 - 0.02 * i as f64)).abs() < 1e-12);
        }
        // weekend factors are lower
        assert!(days[6].avg_demand_mw < days[2].avg_demand_mw);
    }

    #[test]
    fn empty_horizon_is_rejected() {
        let e = engine();
        assert_eq!(
            e.forecast_hourly(at("2024-01-01T00:00:00+00:00"), 0, 25.0),
            Err(ForecastError::EmptyHorizon)
        );
        assert!(e
            .forecast_horizon(at("2024-01-01T00:00:00+00:00"), Horizon::Days(0), 25.0)
            .is_err());
    }

    #[test]
    fn install_replaces_predictor_for_later_calls() {
        let e = engine();
        let input = PredictionInput::new(25.0, 12, 2, 6);
        let before = e.predict(&input).unwrap();
        let doubled = PatternTable {
            base_demand_mw: 7000.0,
            ..PatternTable::default()
        };
        e.install(Arc::new(PatternPredictor::new(Arc::new(doubled))));
        assert!((e.predict(&input).unwrap() - 2.0 * before).abs() < 1e-9);
    }
}
