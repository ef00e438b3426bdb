use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_DEMAND_MW: f64 = 3500.0;
/// Temperature at which the weather adjustment is zero.
pub const REFERENCE_TEMPERATURE_C: f64 = 25.0;
pub const DEFAULT_TEMP_COEFFICIENT: f64 = 15.0;
pub const DEFAULT_HUMIDITY_COEFFICIENT: f64 = 1.02;
pub const HUMIDITY_THRESHOLD_PERCENT: f64 = 70.0;
pub const HOLIDAY_FACTOR: f64 = 0.85;
/// Lowest demand the predictor will ever report.
pub const MIN_DEMAND_MW: f64 = 100.0;

pub const DEFAULT_HOURLY: [f64; 24] = [
    0.65, 0.58, 0.52, 0.48, 0.46, 0.50, 0.62, 0.78, 0.92, 1.02, 1.08, 1.12, //
    1.15, 1.12, 1.08, 1.04, 1.00, 1.08, 1.18, 1.28, 1.22, 1.10, 0.92, 0.78,
];

/// Monday first.
pub const DEFAULT_WEEKDAY: [f64; 7] = [1.02, 1.04, 1.05, 1.04, 1.02, 0.88, 0.85];

/// January first.
pub const DEFAULT_MONTHLY: [f64; 12] = [
    0.95, 0.97, 1.00, 1.02, 1.00, 0.98, 0.95, 0.96, 0.98, 1.02, 1.00, 0.98,
];

/// Where the active multipliers came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternSource {
    Default,
    Dataset { records: usize },
}

/// Demand shape used by the pattern predictor. Always replaced as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternTable {
    pub base_demand_mw: f64,
    pub hourly: [f64; 24],
    pub weekday: [f64; 7],
    pub monthly: [f64; 12],
    /// MW per degree above/below the reference temperature.
    pub temp_coefficient: f64,
    /// Multiplier applied above the humidity threshold.
    pub humidity_coefficient: f64,
    pub source: PatternSource,
}

impl Default for PatternTable {
    fn default() -> Self {
        Self {
            base_demand_mw: DEFAULT_BASE_DEMAND_MW,
            hourly: DEFAULT_HOURLY,
            weekday: DEFAULT_WEEKDAY,
            monthly: DEFAULT_MONTHLY,
            temp_coefficient: DEFAULT_TEMP_COEFFICIENT,
            humidity_coefficient: DEFAULT_HUMIDITY_COEFFICIENT,
            source: PatternSource::Default,
        }
    }
}

impl PatternTable {
    pub fn hour_multiplier(&self, hour: u32) -> f64 {
        self.hourly.get(hour as usize).copied().unwrap_or(1.0)
    }

    /// `day_of_week` is 0 for Monday.
    pub fn weekday_multiplier(&self, day_of_week: u32) -> f64 {
        self.weekday.get(day_of_week as usize).copied().unwrap_or(1.0)
    }

    /// `month` is 1-based.
    pub fn month_multiplier(&self, month: u32) -> f64 {
        month
            .checked_sub(1)
            .and_then(|m| self.monthly.get(m as usize))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn is_default(&self) -> bool {
        self.source == PatternSource::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_zero_and_one_based() {
        let t = PatternTable::default();
        assert_eq!(t.hour_multiplier(19), 1.28);
        assert_eq!(t.weekday_multiplier(6), 0.85);
        assert_eq!(t.month_multiplier(1), 0.95);
        assert_eq!(t.month_multiplier(12), 0.98);
    }

    #[test]
    fn out_of_range_lookups_are_neutral() {
        let t = PatternTable::default();
        assert_eq!(t.hour_multiplier(24), 1.0);
        assert_eq!(t.month_multiplier(0), 1.0);
        assert_eq!(t.month_multiplier(13), 1.0);
    }
}
