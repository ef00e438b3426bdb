use chrono::{DateTime, FixedOffset, NaiveDate};
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

/// Diurnal temperature swing around the base temperature, indexed by hour.
pub const DIURNAL_OFFSETS_C: [f64; 24] = [
    -4.0, -5.0, -6.0, -6.0, -5.0, -4.0, -2.0, 0.0, 2.0, 4.0, 6.0, 8.0, //
    9.0, 10.0, 10.0, 9.0, 8.0, 6.0, 4.0, 2.0, 0.0, -1.0, -2.0, -3.0,
];

pub const DEFAULT_HUMIDITY_PERCENT: f64 = 60.0;

/// Relative half-width of the prediction interval.
pub const INTERVAL_SPREAD: f64 = 0.08;
const Z_95: f64 = 1.96;

/// Inputs to a single demand prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub temperature_c: f64,
    pub hour: u32,
    /// 0 = Monday
    pub day_of_week: u32,
    /// 1..=12
    pub month: u32,
    pub humidity_percent: f64,
    pub is_holiday: bool,
}

impl PredictionInput {
    pub fn new(temperature_c: f64, hour: u32, day_of_week: u32, month: u32) -> Self {
        Self {
            temperature_c,
            hour,
            day_of_week,
            month,
            humidity_percent: DEFAULT_HUMIDITY_PERCENT,
            is_holiday: false,
        }
    }

    pub fn with_humidity(mut self, humidity_percent: f64) -> Self {
        self.humidity_percent = humidity_percent;
        self
    }

    pub fn holiday(mut self, is_holiday: bool) -> Self {
        self.is_holiday = is_holiday;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub hour: u32,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub predicted_demand_mw: f64,
    pub confidence: f64,
    pub lower_bound_mw: f64,
    pub upper_bound_mw: f64,
}

/// Confidence for an hourly point, highest at 14:00.
pub fn hourly_confidence(hour: u32) -> f64 {
    let distance = (hour as f64 - 14.0).abs();
    0.82 + 0.08 * (1.0 - distance / 14.0)
}

/// Confidence for the `index`-th day of a weekly horizon.
pub fn daily_confidence(index: usize) -> f64 {
    0.85 - 0.02 * index as f64
}

/// 95% band assuming an 8% relative error. Lower bound never goes negative.
pub fn prediction_interval(demand_mw: f64) -> (f64, f64) {
    let margin = Z_95 * INTERVAL_SPREAD * demand_mw;
    ((demand_mw - margin).max(0.0), demand_mw + margin)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub day: String,
    pub avg_demand_mw: f64,
    pub peak_demand_mw: f64,
    pub min_demand_mw: f64,
    pub peak_hour: u32,
    pub total_energy_mwh: f64,
    pub confidence: f64,
}

/// Reduction of an hourly horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonSummary {
    pub avg_demand_mw: f64,
    pub peak_demand_mw: f64,
    pub min_demand_mw: f64,
    pub peak_hour: u32,
    pub low_hour: u32,
    /// Each point covers one hour, so the MW sum is MWh.
    pub total_energy_mwh: f64,
}

impl HorizonSummary {
    pub fn from_points(points: &[ForecastPoint]) -> Option<Self> {
        let hourly: Vec<(u32, f64)> = points
            .iter()
            .map(|p| (p.hour, p.predicted_demand_mw))
            .collect();
        Self::from_hourly(&hourly)
    }

    /// `hourly` is `(hour, demand_mw)`. The first occurrence wins on ties.
    pub fn from_hourly(hourly: &[(u32, f64)]) -> Option<Self> {
        if hourly.is_empty() {
            return None;
        }
        let total: f64 = hourly.iter().map(|(_, d)| d).sum();
        let (low, peak) = match hourly.iter().position_minmax_by(|a, b| a.1.total_cmp(&b.1)) {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(i) => (i, i),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        // position_minmax_by reports the last maximum; keep the earliest peak.
        let peak_value = hourly[peak].1;
        let peak = hourly
            .iter()
            .position(|(_, d)| *d == peak_value)
            .unwrap_or(peak);
        Some(Self {
            avg_demand_mw: total / hourly.len() as f64,
            peak_demand_mw: hourly[peak].1,
            min_demand_mw: hourly[low].1,
            peak_hour: hourly[peak].0,
            low_hour: hourly[low].0,
            total_energy_mwh: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_peaks_mid_afternoon() {
        assert!((hourly_confidence(14) - 0.90).abs() < 1e-12);
        assert!((hourly_confidence(0) - 0.82).abs() < 1e-12);
        assert!(hourly_confidence(13) < hourly_confidence(14));
    }

    #[test]
    fn daily_confidence_decays_linearly() {
        assert!((daily_confidence(0) - 0.85).abs() < 1e-12);
        assert!((daily_confidence(6) - 0.73).abs() < 1e-12);
    }

    #[test]
    fn interval_is_symmetric_and_clamped() {
        let (lo, hi) = prediction_interval(1000.0);
        assert!((lo - 843.2).abs() < 1e-9);
        assert!((hi - 1156.8).abs() < 1e-9);
        assert_eq!(prediction_interval(0.0).0, 0.0);
    }

    #[test]
    fn summary_orders_peak_average_trough() {
        let s = HorizonSummary::from_hourly(&[(22, 300.0), (23, 500.0), (0, 100.0), (1, 500.0)])
            .unwrap();
        assert_eq!(s.peak_hour, 23);
        assert_eq!(s.low_hour, 0);
        assert_eq!(s.total_energy_mwh, 1400.0);
        assert!(s.peak_demand_mw >= s.avg_demand_mw && s.avg_demand_mw >= s.min_demand_mw);
    }

    #[test]
    fn summary_of_nothing_is_none() {
        assert!(HorizonSummary::from_hourly(&[]).is_none());
    }
}
