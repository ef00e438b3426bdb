use serde::Serialize;

use super::AlertError;
use crate::domain::{AlertSeverity, AlertType, ForecastPoint, NewAlert};

/// Utilization (percent of capacity) strictly above which each tier fires.
pub const EMERGENCY_UTILIZATION: f64 = 95.0;
pub const CRITICAL_UTILIZATION: f64 = 85.0;
pub const WARNING_UTILIZATION: f64 = 75.0;
/// Shown for reference only; nothing fires at this level.
pub const NORMAL_UTILIZATION: f64 = 50.0;

/// Forecast points strictly above these raise an alert.
pub const FORECAST_CRITICAL_MW: f64 = 4800.0;
pub const FORECAST_WARNING_MW: f64 = 4200.0;
/// Points below `min × this` belong to a low-demand window.
pub const LOW_WINDOW_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, Serialize)]
pub struct Threshold {
    pub utilization_percent: f64,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdTable {
    pub emergency: Threshold,
    pub critical: Threshold,
    pub warning: Threshold,
    pub info: Threshold,
}

pub fn thresholds() -> ThresholdTable {
    let t = |utilization_percent, description| Threshold {
        utilization_percent,
        description,
    };
    ThresholdTable {
        emergency: t(EMERGENCY_UTILIZATION, "Grid at critical capacity"),
        critical: t(CRITICAL_UTILIZATION, "High grid utilization"),
        warning: t(WARNING_UTILIZATION, "Elevated demand"),
        info: t(NORMAL_UTILIZATION, "Normal operation"),
    }
}

/// At most one peak-demand alert for the current load.
pub fn evaluate(demand_mw: f64, capacity_mw: f64) -> Result<Option<NewAlert>, AlertError> {
    if !(capacity_mw.is_finite() && capacity_mw > 0.0) {
        return Err(AlertError::InvalidCapacity(capacity_mw));
    }
    if !demand_mw.is_finite() {
        return Err(AlertError::NonFiniteDemand);
    }
    let utilization = demand_mw / capacity_mw * 100.0;
    let (severity, title, recommendation) = if utilization > EMERGENCY_UTILIZATION {
        (
            AlertSeverity::Emergency,
            "EMERGENCY: Grid at Critical Capacity",
            "Implement immediate load shedding. Activate all emergency reserves.",
        )
    } else if utilization > CRITICAL_UTILIZATION {
        (
            AlertSeverity::Critical,
            "CRITICAL: High Grid Utilization",
            "Prepare load shedding protocols. Alert major industrial consumers.",
        )
    } else if utilization > WARNING_UTILIZATION {
        (
            AlertSeverity::Warning,
            "WARNING: Elevated Demand",
            "Monitor closely. Prepare backup generation capacity.",
        )
    } else {
        return Ok(None);
    };
    Ok(Some(NewAlert::new(
        AlertType::PeakDemand,
        severity,
        title,
        format!("Current demand ({demand_mw:.0} MW) is at {utilization:.1}% of capacity"),
        recommendation,
    )))
}

/// Peak alerts per point, then one maintenance alert per low-demand window.
pub fn evaluate_forecast(points: &[ForecastPoint]) -> Vec<NewAlert> {
    let mut alerts: Vec<NewAlert> = points.iter().filter_map(peak_alert).collect();
    alerts.extend(low_windows(points).into_iter().map(|w| {
        NewAlert::new(
            AlertType::Maintenance,
            AlertSeverity::Info,
            "Maintenance Window",
            format!(
                "Optimal maintenance time: {}:00 - {}:00 ({:.0} MW)",
                w.start_hour,
                (w.end_hour + 1) % 24,
                w.min_demand_mw
            ),
            "Schedule grid maintenance and equipment testing during this period.",
        )
    }));
    alerts
}

fn peak_alert(p: &ForecastPoint) -> Option<NewAlert> {
    let demand = p.predicted_demand_mw;
    let (severity, title, recommendation) = if demand > FORECAST_CRITICAL_MW {
        (
            AlertSeverity::Critical,
            format!("Critical peak at {}:00", p.hour),
            "Activate all reserve capacity and implement load shedding",
        )
    } else if demand > FORECAST_WARNING_MW {
        (
            AlertSeverity::Warning,
            format!("High demand at {}:00", p.hour),
            "Prepare reserve generators and notify industrial users",
        )
    } else {
        return None;
    };
    Some(NewAlert::new(
        AlertType::Forecast,
        severity,
        title,
        format!("Forecast demand of {demand:.0} MW at {}:00", p.hour),
        recommendation,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowWindow {
    pub start_hour: u32,
    /// Last hour inside the window.
    pub end_hour: u32,
    pub min_demand_mw: f64,
}

/// Contiguous runs of points below `1.1 × min` over the whole period.
pub fn low_windows(points: &[ForecastPoint]) -> Vec<LowWindow> {
    let Some(min) = points
        .iter()
        .map(|p| p.predicted_demand_mw)
        .min_by(|a, b| a.total_cmp(b))
    else {
        return Vec::new();
    };
    let cutoff = min * LOW_WINDOW_FACTOR;
    let mut windows = Vec::new();
    let mut current: Option<LowWindow> = None;
    for p in points {
        if p.predicted_demand_mw < cutoff {
            let w = current.get_or_insert(LowWindow {
                start_hour: p.hour,
                end_hour: p.hour,
                min_demand_mw: p.predicted_demand_mw,
            });
            w.end_hour = p.hour;
            w.min_demand_mw = w.min_demand_mw.min(p.predicted_demand_mw);
        } else if let Some(w) = current.take() {
            windows.push(w);
        }
    }
    windows.extend(current);
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use rstest::rstest;

    fn points(demands: &[f64]) -> Vec<ForecastPoint> {
        let start = DateTime::parse_from_rfc3339("2024-05-01T00:00:00+03:00").unwrap();
        demands
            .iter()
            .enumerate()
            .map(|(i, &d)| ForecastPoint {
                timestamp: start + Duration::hours(i as i64),
                hour: i as u32 % 24,
                temperature_c: 25.0,
                humidity_percent: 60.0,
                predicted_demand_mw: d,
                confidence: 0.85,
                lower_bound_mw: d * 0.9,
                upper_bound_mw: d * 1.1,
            })
            .collect()
    }

    #[rstest]
    #[case(8640.0, Some(AlertSeverity::Emergency))]
    #[case(8550.0, Some(AlertSeverity::Critical))]
    #[case(8000.0, Some(AlertSeverity::Critical))]
    #[case(7650.0, Some(AlertSeverity::Warning))]
    #[case(7200.0, Some(AlertSeverity::Warning))]
    #[case(6750.0, None)]
    #[case(4500.0, None)]
    fn utilization_tiers(#[case] demand: f64, #[case] expected: Option<AlertSeverity>) {
        let alert = evaluate(demand, 9000.0).unwrap();
        assert_eq!(alert.as_ref().map(|a| a.severity), expected);
        if let Some(a) = alert {
            assert_eq!(a.alert_type, AlertType::PeakDemand);
        }
    }

    #[test]
    fn message_reports_utilization() {
        let a = evaluate(8640.0, 9000.0).unwrap().unwrap();
        assert_eq!(a.message, "Current demand (8640 MW) is at 96.0% of capacity");
        assert_eq!(a.title, "EMERGENCY: Grid at Critical Capacity");
    }

    #[rstest]
    #[case(0.0)]
    #[case(-100.0)]
    #[case(f64::NAN)]
    fn bad_capacity_is_rejected(#[case] capacity: f64) {
        assert!(matches!(
            evaluate(5000.0, capacity),
            Err(AlertError::InvalidCapacity(_))
        ));
    }

    #[test]
    fn forecast_tiers_per_point() {
        let alerts = evaluate_forecast(&points(&[4000.0, 4300.0, 4900.0, 4100.0]));
        let peaks: Vec<_> = alerts
            .iter()
            .filter(|a| a.alert_type == AlertType::Forecast)
            .map(|a| a.severity)
            .collect();
        assert_eq!(peaks, vec![AlertSeverity::Warning, AlertSeverity::Critical]);
        assert_eq!(
            alerts[1].recommendation,
            "Activate all reserve capacity and implement load shedding"
        );
    }

    #[test]
    fn low_windows_are_contiguous_runs() {
        let p = points(&[1000.0, 1050.0, 2000.0, 1080.0, 3000.0]);
        let windows = low_windows(&p);
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start_hour, windows[0].end_hour), (0, 1));
        assert_eq!((windows[1].start_hour, windows[1].end_hour), (3, 3));

        let maintenance = evaluate_forecast(&p)
            .into_iter()
            .filter(|a| a.alert_type == AlertType::Maintenance)
            .count();
        assert_eq!(maintenance, 2);
    }

    #[test]
    fn empty_forecast_raises_nothing() {
        assert!(evaluate_forecast(&[]).is_empty());
    }
}
