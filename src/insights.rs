//! Operator-facing insights derived from the live forecast.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::alerts::evaluator::{low_windows, FORECAST_CRITICAL_MW, FORECAST_WARNING_MW};
use crate::alerts::evaluate_forecast;
use crate::domain::grid::{REGIONAL_PEAK_FACTOR, REGIONS};
use crate::domain::{AlertSeverity, DailyForecast, ForecastPoint, HorizonSummary, NewAlert};
use crate::forecast::PredictorKind;
use crate::ml::{ModelArtifact, ValidationMetrics, FEATURE_NAMES};
use crate::utils::round2;

/// Current demand this far above the horizon mean is flagged.
const ABOVE_AVERAGE_FACTOR: f64 = 1.15;

const STRATEGIC_RECOMMENDATIONS: [&str; 4] = [
    "Coordinate with Grand Ethiopian Renaissance Dam for optimal hydro generation",
    "Implement real-time demand response with large industrial consumers",
    "Deploy battery storage during off-peak hours for peak shaving",
    "Explore power exchange agreements with neighboring countries",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub category: &'static str,
    pub message: String,
    pub severity: AlertSeverity,
    pub recommendation: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandTrend {
    Increasing,
    Peak,
    Decreasing,
}

pub fn demand_trend(hour: u32) -> DemandTrend {
    match hour {
        6..=12 => DemandTrend::Increasing,
        13..=19 => DemandTrend::Peak,
        _ => DemandTrend::Decreasing,
    }
}

/// Transmission efficiency proxy, best in early afternoon.
pub fn grid_efficiency(hour: u32) -> f64 {
    0.87 + 0.05 * (1.0 - (hour as f64 - 14.0).abs() / 14.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub insights: Vec<Insight>,
    pub demand_trend: DemandTrend,
    pub efficiency_score: f64,
    pub recommendations: Vec<&'static str>,
}

/// `points` is the 24 h forecast starting at the current hour.
pub fn insights(points: &[ForecastPoint], hour: u32) -> InsightReport {
    let mut out = Vec::new();

    if let Some(summary) = HorizonSummary::from_points(points) {
        let peak = summary.peak_demand_mw;
        if peak > FORECAST_CRITICAL_MW {
            out.push(Insight {
                category: "Critical Peak Alert",
                message: format!("Expected peak demand: {peak:.0} MW at {}:00", summary.peak_hour),
                severity: AlertSeverity::Critical,
                recommendation: "Activate all reserve capacity. Consider load shedding in non-critical areas.",
            });
        } else if peak > FORECAST_WARNING_MW {
            out.push(Insight {
                category: "High Demand Warning",
                message: format!("High demand expected: {peak:.0} MW at {}:00", summary.peak_hour),
                severity: AlertSeverity::Warning,
                recommendation: "Prepare backup generators. Alert industrial consumers for demand response.",
            });
        }

        let current = points[0].predicted_demand_mw;
        let avg = summary.avg_demand_mw;
        if current > avg * ABOVE_AVERAGE_FACTOR {
            out.push(Insight {
                category: "Above Average",
                message: format!(
                    "Current demand ({current:.0} MW) is {:.1}% above average",
                    (current / avg - 1.0) * 100.0
                ),
                severity: AlertSeverity::Warning,
                recommendation: "Monitor grid stability. Consider activating spinning reserves.",
            });
        }
    }

    for w in low_windows(points) {
        out.push(Insight {
            category: "Maintenance Window",
            message: format!(
                "Optimal maintenance time: {}:00 - {}:00 ({:.0} MW)",
                w.start_hour,
                (w.end_hour + 1) % 24,
                w.min_demand_mw
            ),
            severity: AlertSeverity::Info,
            recommendation: "Schedule grid maintenance and equipment testing during this period.",
        });
    }

    out.push(Insight {
        category: "Weather Impact",
        message: "Temperature forecast indicates moderate demand impact".into(),
        severity: AlertSeverity::Info,
        recommendation: "Monitor weather updates for sudden changes affecting demand.",
    });

    let efficiency = grid_efficiency(hour);
    out.push(Insight {
        category: "Grid Efficiency",
        message: format!("Current grid efficiency: {:.1}%", efficiency * 100.0),
        severity: AlertSeverity::Info,
        recommendation: "Optimize power factor correction in industrial zones.",
    });

    InsightReport {
        insights: out,
        demand_trend: demand_trend(hour),
        efficiency_score: (efficiency * 1000.0).round() / 1000.0,
        recommendations: STRATEGIC_RECOMMENDATIONS.to_vec(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionAnalytics {
    pub region: &'static str,
    pub households: u64,
    pub population: u64,
    pub avg_demand_mw: f64,
    pub peak_demand_mw: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NationalAnalytics {
    pub total_households: u64,
    pub total_population: u64,
    pub total_demand_mw: f64,
    pub regions: Vec<RegionAnalytics>,
    pub ai_insights: Vec<String>,
}

/// Smooth load curve peaking at 19:00, used for the regional split.
pub fn national_hour_factor(hour: u32) -> f64 {
    0.65 + 0.63 * (1.0 - (hour as f64 - 19.0).abs() / 19.0)
}

pub fn national(hour: u32) -> NationalAnalytics {
    let factor = national_hour_factor(hour);
    let regions: Vec<RegionAnalytics> = REGIONS
        .iter()
        .map(|r| RegionAnalytics {
            region: r.name,
            households: r.households,
            population: r.population,
            avg_demand_mw: round2(r.base_demand_mw * factor),
            peak_demand_mw: round2(r.base_demand_mw * REGIONAL_PEAK_FACTOR),
        })
        .collect();
    let total_households: u64 = REGIONS.iter().map(|r| r.households).sum();
    let total_population: u64 = REGIONS.iter().map(|r| r.population).sum();
    let total_demand: f64 = REGIONS.iter().map(|r| r.base_demand_mw * factor).sum();

    NationalAnalytics {
        total_households,
        total_population,
        total_demand_mw: round2(total_demand),
        ai_insights: vec![
            format!("Total grid demand: {total_demand:.0} MW"),
            format!(
                "Serving {} people across {} regions",
                thousands(total_population),
                REGIONS.len()
            ),
            format!("{} connected households", thousands(total_households)),
            "Hydropower provides 90% of generation (GERD, Gilgel Gibe)".to_string(),
            format!(
                "Peak demand expected at 19:00 local time (~{:.0} MW)",
                total_demand * REGIONAL_PEAK_FACTOR
            ),
            "Ethiopia exports power to Djibouti and Sudan".to_string(),
        ],
        regions,
    }
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    #[serde(rename = "type")]
    pub kind: PredictorKind,
    pub accuracy: Option<f64>,
    pub last_updated: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyPrediction {
    pub forecasts: Vec<DailyForecast>,
    pub total_weekly_mwh: f64,
    pub avg_daily_peak: f64,
    pub model_info: ModelInfo,
}

pub fn weekly_prediction(
    days: Vec<DailyForecast>,
    kind: PredictorKind,
    model: Option<&ModelArtifact>,
    now: DateTime<FixedOffset>,
) -> WeeklyPrediction {
    let n = days.len().max(1) as f64;
    WeeklyPrediction {
        total_weekly_mwh: round2(days.iter().map(|d| d.total_energy_mwh).sum()),
        avg_daily_peak: round2(days.iter().map(|d| d.peak_demand_mw).sum::<f64>() / n),
        forecasts: days,
        model_info: ModelInfo {
            kind,
            accuracy: model.map(|m| round2(m.metrics().r2)),
            last_updated: now,
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakAlertBoard {
    pub alerts: Vec<NewAlert>,
    pub alert_count: usize,
    pub critical_count: usize,
    pub generated_at: DateTime<FixedOffset>,
}

/// Forecast peak alerts only; maintenance windows are reported by `insights`.
pub fn peak_alerts(points: &[ForecastPoint], now: DateTime<FixedOffset>) -> PeakAlertBoard {
    let alerts: Vec<NewAlert> = evaluate_forecast(points)
        .into_iter()
        .filter(|a| a.severity > AlertSeverity::Info)
        .collect();
    PeakAlertBoard {
        alert_count: alerts.len(),
        critical_count: alerts
            .iter()
            .filter(|a| a.severity == AlertSeverity::Critical)
            .count(),
        alerts,
        generated_at: now,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Active,
    Untrained,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionSummary {
    pub model_id: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub training_samples: usize,
    pub validation: ValidationMetrics,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelMetrics {
    pub predictor: PredictorKind,
    pub status: ModelStatus,
    pub regression: Option<RegressionSummary>,
    pub dataset_records: usize,
    pub blend_weights: BlendWeights,
    pub candidate_features: [&'static str; 6],
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BlendWeights {
    pub pattern: f64,
    pub model: f64,
}

pub fn model_metrics(kind: PredictorKind, model: Option<&ModelArtifact>, dataset_records: usize) -> ModelMetrics {
    use crate::forecast::predictor::{MODEL_WEIGHT, PATTERN_WEIGHT};
    let regression = model.map(|m| {
        let meta = &m.model.metadata;
        let v = meta.validation_metrics;
        RegressionSummary {
            model_id: meta.model_id.clone(),
            trained_at: meta.trained_at,
            training_samples: meta.training_samples,
            validation: ValidationMetrics::new(round2(v.mae), round2(v.rmse), round2(v.mape), round2(v.r2)),
            features: meta.feature_names.clone(),
        }
    });
    ModelMetrics {
        predictor: kind,
        status: if regression.is_some() {
            ModelStatus::Active
        } else {
            ModelStatus::Untrained
        },
        regression,
        dataset_records,
        blend_weights: BlendWeights {
            pattern: PATTERN_WEIGHT,
            model: MODEL_WEIGHT,
        },
        candidate_features: FEATURE_NAMES,
    }
}
