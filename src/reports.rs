//! Operational reports over simulated actuals.
//!
//! Actuals are the national daily shape plus noise from an RNG seeded by the
//! calendar date, so a given day always reports the same figures.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

use crate::domain::grid::REGIONS;
use crate::domain::DEFAULT_HOURLY;
use crate::simulation::LIVE_BASE_DEMAND_MW;
use crate::utils::round2;

const ACTUAL_NOISE_MW: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportPeriod {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl ReportPeriod {
    pub fn days_back(self) -> i64 {
        match self {
            ReportPeriod::Daily => 1,
            ReportPeriod::Weekly => 7,
            ReportPeriod::Monthly => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

/// One simulated hour of actual and forecast demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub datetime: String,
    pub date: NaiveDate,
    pub hour: u32,
    pub demand_mw: f64,
    pub temperature_c: f64,
    pub forecast_mw: f64,
    pub forecast_error_percent: f64,
}

fn day_rows(date: NaiveDate) -> Vec<SampleRow> {
    let mut rng = StdRng::seed_from_u64(date.num_days_from_ce() as u64);
    (0..24u32)
        .map(|hour| {
            let demand = LIVE_BASE_DEMAND_MW * DEFAULT_HOURLY[hour as usize]
                + rng.gen_range(-ACTUAL_NOISE_MW..=ACTUAL_NOISE_MW);
            let ramp = (if hour < 12 { hour } else { 24 - hour }) as f64 / 12.0;
            SampleRow {
                datetime: format!("{}T{hour:02}:00:00", date.format("%Y-%m-%d")),
                date,
                hour,
                demand_mw: round2(demand),
                temperature_c: ((20.0 + 8.0 * ramp) * 10.0).round() / 10.0,
                forecast_mw: round2(demand * rng.gen_range(0.95..=1.05_f64)),
                forecast_error_percent: round2(rng.gen_range(-5.0..=5.0_f64)),
            }
        })
        .collect()
}

/// Hourly rows for every date from `start` through `end` inclusive.
pub fn sample_rows(start: NaiveDate, end: NaiveDate) -> Vec<SampleRow> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .flat_map(day_rows)
        .collect()
}

pub fn period_rows(period: ReportPeriod, today: NaiveDate) -> Vec<SampleRow> {
    sample_rows(today - Duration::days(period.days_back()), today)
}

#[derive(Debug, Clone, Serialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemandStatistics {
    pub average_mw: f64,
    pub max_mw: f64,
    pub min_mw: f64,
    pub total_energy_mwh: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastAccuracy {
    pub mae_percent: f64,
    pub max_error_percent: f64,
    pub accuracy_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakAnalysis {
    pub peak_hour: u32,
    pub off_peak_hour: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportAnalytics {
    pub total_records: usize,
    pub date_range: DateSpan,
    pub demand_statistics: DemandStatistics,
    pub forecast_accuracy: ForecastAccuracy,
    pub peak_analysis: PeakAnalysis,
}

pub fn analytics(rows: &[SampleRow]) -> Option<ReportAnalytics> {
    let (first, last) = (rows.first()?, rows.last()?);
    let n = rows.len() as f64;
    let total: f64 = rows.iter().map(|r| r.demand_mw).sum();
    let errors: Vec<f64> = rows.iter().map(|r| r.forecast_error_percent.abs()).collect();
    let mae = errors.iter().sum::<f64>() / n;

    let mut by_hour = [0.0_f64; 24];
    for r in rows {
        by_hour[r.hour as usize % 24] += r.demand_mw;
    }
    let hours = 0..24u32;
    let peak_hour = hours
        .clone()
        .max_by(|a, b| by_hour[*a as usize].total_cmp(&by_hour[*b as usize]))?;
    let off_peak_hour = hours.min_by(|a, b| by_hour[*a as usize].total_cmp(&by_hour[*b as usize]))?;

    Some(ReportAnalytics {
        total_records: rows.len(),
        date_range: DateSpan {
            start: first.date,
            end: last.date,
        },
        demand_statistics: DemandStatistics {
            average_mw: round2(total / n),
            max_mw: round2(rows.iter().map(|r| r.demand_mw).fold(f64::MIN, f64::max)),
            min_mw: round2(rows.iter().map(|r| r.demand_mw).fold(f64::MAX, f64::min)),
            total_energy_mwh: round2(total),
        },
        forecast_accuracy: ForecastAccuracy {
            mae_percent: round2(mae),
            max_error_percent: round2(errors.iter().copied().fold(0.0, f64::max)),
            accuracy_percent: round2(100.0 - mae),
        },
        peak_analysis: PeakAnalysis {
            peak_hour,
            off_peak_hour,
        },
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlyAccuracy {
    pub hour: u32,
    pub avg_demand_mw: f64,
    pub avg_forecast_mw: f64,
    pub accuracy_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub total_energy_mwh: f64,
    pub peak_demand_mw: f64,
    pub peak_hour: u32,
    pub min_demand_mw: f64,
    pub avg_accuracy_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub report_type: ReportPeriod,
    pub date: NaiveDate,
    pub generated_at: DateTime<FixedOffset>,
    pub hourly_data: Vec<HourlyAccuracy>,
    pub summary: DailySummary,
}

pub fn daily_report(now: DateTime<FixedOffset>) -> DailyReport {
    let today = now.date_naive();
    let rows = period_rows(ReportPeriod::Daily, today);

    let hourly_data: Vec<HourlyAccuracy> = (0..24u32)
        .map(|hour| {
            let (demand, forecast, n) = rows
                .iter()
                .filter(|r| r.hour == hour)
                .fold((0.0_f64, 0.0_f64, 0usize), |(d, f, n), r| (d + r.demand_mw, f + r.forecast_mw, n + 1));
            let n = n.max(1) as f64;
            HourlyAccuracy {
                hour,
                avg_demand_mw: round2(demand / n),
                avg_forecast_mw: round2(forecast / n),
                accuracy_percent: round2(100.0 - (demand - forecast).abs() / demand * 100.0),
            }
        })
        .collect();

    let peak_hour = hourly_data
        .iter()
        .max_by(|a, b| a.avg_demand_mw.total_cmp(&b.avg_demand_mw))
        .map_or(0, |h| h.hour);
    let demands = rows.iter().map(|r| r.demand_mw);
    DailyReport {
        report_type: ReportPeriod::Daily,
        date: today - Duration::days(1),
        generated_at: now,
        summary: DailySummary {
            total_energy_mwh: round2(demands.clone().sum()),
            peak_demand_mw: round2(demands.clone().fold(f64::MIN, f64::max)),
            peak_hour,
            min_demand_mw: round2(demands.fold(f64::MAX, f64::min)),
            avg_accuracy_percent: round2(
                hourly_data.iter().map(|h| h.accuracy_percent).sum::<f64>() / 24.0,
            ),
        },
        hourly_data,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayTotals {
    pub date: NaiveDate,
    pub avg_demand_mw: f64,
    pub peak_demand_mw: f64,
    pub min_demand_mw: f64,
    pub total_energy_mwh: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklySummary {
    pub total_energy_mwh: f64,
    pub avg_daily_demand_mw: f64,
    pub peak_day: NaiveDate,
    pub peak_demand_mw: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyReport {
    pub report_type: ReportPeriod,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub generated_at: DateTime<FixedOffset>,
    pub daily_data: Vec<DayTotals>,
    pub summary: WeeklySummary,
}

pub fn weekly_report(now: DateTime<FixedOffset>) -> WeeklyReport {
    let today = now.date_naive();
    let week_start = today - Duration::days(ReportPeriod::Weekly.days_back());
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for r in period_rows(ReportPeriod::Weekly, today) {
        by_date.entry(r.date).or_default().push(r.demand_mw);
    }
    let daily_data: Vec<DayTotals> = by_date
        .into_iter()
        .map(|(date, demands)| {
            let total: f64 = demands.iter().sum();
            DayTotals {
                date,
                avg_demand_mw: round2(total / demands.len() as f64),
                peak_demand_mw: round2(demands.iter().copied().fold(f64::MIN, f64::max)),
                min_demand_mw: round2(demands.iter().copied().fold(f64::MAX, f64::min)),
                total_energy_mwh: round2(total),
            }
        })
        .collect();

    let peak = daily_data
        .iter()
        .max_by(|a, b| a.peak_demand_mw.total_cmp(&b.peak_demand_mw));
    let days = daily_data.len().max(1) as f64;
    WeeklyReport {
        report_type: ReportPeriod::Weekly,
        week_start,
        week_end: today,
        generated_at: now,
        summary: WeeklySummary {
            total_energy_mwh: round2(daily_data.iter().map(|d| d.total_energy_mwh).sum()),
            avg_daily_demand_mw: round2(daily_data.iter().map(|d| d.avg_demand_mw).sum::<f64>() / days),
            peak_day: peak.map_or(today, |d| d.date),
            peak_demand_mw: peak.map_or(0.0, |d| d.peak_demand_mw),
        },
        daily_data,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionShare {
    pub region: &'static str,
    pub current_demand_mw: f64,
    pub population: u64,
    pub households: u64,
    pub per_capita_kw: f64,
    pub share_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NationalSummary {
    pub total_demand_mw: f64,
    pub total_population: u64,
    pub total_households: u64,
    pub regions_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionalReport {
    pub report_type: &'static str,
    pub generated_at: DateTime<FixedOffset>,
    pub regions: Vec<RegionShare>,
    pub national_summary: NationalSummary,
}

pub fn regional_report(now: DateTime<FixedOffset>) -> RegionalReport {
    let total: f64 = REGIONS.iter().map(|r| r.base_demand_mw).sum();
    let mut regions: Vec<RegionShare> = REGIONS
        .iter()
        .map(|r| RegionShare {
            region: r.name,
            current_demand_mw: r.base_demand_mw,
            population: r.population,
            households: r.households,
            per_capita_kw: (r.base_demand_mw * 1000.0 / r.population as f64 * 10_000.0).round() / 10_000.0,
            share_percent: round2(r.base_demand_mw / total * 100.0),
        })
        .collect();
    regions.sort_by(|a, b| b.current_demand_mw.total_cmp(&a.current_demand_mw));
    RegionalReport {
        report_type: "regional",
        generated_at: now,
        national_summary: NationalSummary {
            total_demand_mw: total,
            total_population: REGIONS.iter().map(|r| r.population).sum(),
            total_households: REGIONS.iter().map(|r| r.households).sum(),
            regions_count: REGIONS.len(),
        },
        regions,
    }
}

#[derive(Debug, Clone, Serialize)]
struct ExportMetadata {
    report_type: ReportPeriod,
    generated_at: DateTime<FixedOffset>,
    total_records: usize,
}

#[derive(Debug, Clone, Serialize)]
struct JsonExport<'a> {
    metadata: ExportMetadata,
    analytics: Option<ReportAnalytics>,
    data: &'a [SampleRow],
}

/// A rendered export: file name plus body.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub format: ExportFormat,
    pub body: Vec<u8>,
}

pub fn export(
    format: ExportFormat,
    period: ReportPeriod,
    now: DateTime<FixedOffset>,
) -> anyhow::Result<ExportFile> {
    let rows = period_rows(period, now.date_naive());
    let body = match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(Vec::new());
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.into_inner().map_err(|e| e.into_error())?
        }
        ExportFormat::Json => serde_json::to_vec_pretty(&JsonExport {
            metadata: ExportMetadata {
                report_type: period,
                generated_at: now,
                total_records: rows.len(),
            },
            analytics: analytics(&rows),
            data: &rows,
        })?,
    };
    Ok(ExportFile {
        filename: format!("eeu_demand_report_{period}_{}.{format}", now.format("%Y%m%d")),
        format,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-08T10:00:00+03:00").unwrap()
    }

    #[test]
    fn actuals_are_reproducible_per_date() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(sample_rows(d, d), sample_rows(d, d));
        let rows = sample_rows(d, d);
        assert_eq!(rows.len(), 24);
        assert!(rows.iter().all(|r| {
            let shape = LIVE_BASE_DEMAND_MW * DEFAULT_HOURLY[r.hour as usize];
            (r.demand_mw - shape).abs() <= ACTUAL_NOISE_MW + 0.01
        }));
        assert_eq!(rows[0].datetime, "2024-05-01T00:00:00");
    }

    #[test]
    fn daily_report_covers_every_hour() {
        let r = daily_report(now());
        assert_eq!(r.hourly_data.len(), 24);
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 5, 7).unwrap());
        assert!(r.summary.peak_demand_mw >= r.summary.min_demand_mw);
        assert!((17..=20).contains(&r.summary.peak_hour));
        assert!(r.summary.avg_accuracy_percent > 90.0);
    }

    #[test]
    fn weekly_report_spans_eight_dates() {
        let r = weekly_report(now());
        assert_eq!(r.daily_data.len(), 8);
        assert_eq!(r.week_start, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let total: f64 = r.daily_data.iter().map(|d| d.total_energy_mwh).sum();
        assert!((total - r.summary.total_energy_mwh).abs() < 0.01);
    }

    #[test]
    fn regional_shares_sum_to_hundred() {
        let r = regional_report(now());
        assert_eq!(r.national_summary.total_demand_mw, 3680.0);
        assert_eq!(r.regions[0].region, "Addis Ababa");
        let share: f64 = r.regions.iter().map(|x| x.share_percent).sum();
        assert!((share - 100.0).abs() < 0.1);
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let file = export(ExportFormat::Csv, ReportPeriod::Daily, now()).unwrap();
        assert_eq!(file.filename, "eeu_demand_report_daily_20240508.csv");
        let text = String::from_utf8(file.body).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("datetime,date,hour,demand_mw,temperature_c,forecast_mw,forecast_error_percent")
        );
        assert_eq!(lines.count(), 48);
    }

    #[test]
    fn json_export_carries_analytics() {
        let file = export(ExportFormat::Json, ReportPeriod::Weekly, now()).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&file.body).unwrap();
        assert_eq!(v["metadata"]["report_type"], "weekly");
        assert_eq!(v["metadata"]["total_records"], 192);
        assert!(v["analytics"]["forecast_accuracy"]["accuracy_percent"].as_f64().unwrap() > 90.0);
    }
}
