//! Historical demand dataset: CSV ingest, merge and persistence.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::domain::dataset::timestamp_format;
use crate::domain::{DemandRecord, DEFAULT_REGION};
use crate::utils::{local_now, round2};

/// Column layout written on persist; any superset is accepted on read.
pub const COLUMNS: [&str; 9] = [
    "datetime",
    "demand",
    "temperature",
    "hour",
    "day_of_week",
    "month",
    "humidity",
    "is_holiday",
    "region",
];

const DEFAULT_TEMPERATURE_C: f64 = 25.0;
const DEFAULT_HUMIDITY_PERCENT: f64 = 60.0;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("missing required column 'demand'")]
    MissingDemandColumn,
    #[error("upload contains no data rows")]
    Empty,
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset file: {0}")]
    Io(#[from] io::Error),
}

/// Parse an uploaded CSV. Only `demand` is required; calendar fields come
/// from `datetime` when present, otherwise hours cycle from 2024-01-01 00:00.
pub fn parse_csv<R: Read>(reader: R, fallback_month: u32) -> Result<Vec<DemandRecord>, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let demand_col = col("demand").ok_or(DatasetError::MissingDemandColumn)?;
    let cols = Columns {
        datetime: col("datetime"),
        temperature: col("temperature"),
        hour: col("hour"),
        day_of_week: col("day_of_week"),
        month: col("month"),
        humidity: col("humidity"),
        is_holiday: col("is_holiday"),
        region: col("region"),
    };
    let synthetic_start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    let mut out = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        let line = i + 2;
        let cell = |idx: Option<usize>| idx.and_then(|c| row.get(c)).filter(|s| !s.is_empty());
        let bad = |reason: String| DatasetError::InvalidRow { row: line, reason };

        let demand = row
            .get(demand_col)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|d| d.is_finite())
            .ok_or_else(|| bad("demand must be a number".into()))?;

        let parsed_ts = match cell(cols.datetime) {
            Some(s) => {
                Some(timestamp_format::parse(s).ok_or_else(|| bad(format!("bad datetime '{s}'")))?)
            }
            None => None,
        };
        let ts = parsed_ts.unwrap_or_else(|| synthetic_start + Duration::hours(i as i64));

        let hour = match cell(cols.hour) {
            Some(s) => parse_int(s, 0, 23).ok_or_else(|| bad(format!("hour '{s}' outside 0..=23")))?,
            None if parsed_ts.is_some() => ts.hour(),
            None => (i % 24) as u32,
        };
        let day_of_week = match cell(cols.day_of_week) {
            Some(s) => {
                parse_int(s, 0, 6).ok_or_else(|| bad(format!("day_of_week '{s}' outside 0..=6")))?
            }
            None if parsed_ts.is_some() => ts.weekday().num_days_from_monday(),
            None => 0,
        };
        let month = match cell(cols.month) {
            Some(s) => parse_int(s, 1, 12).ok_or_else(|| bad(format!("month '{s}' outside 1..=12")))?,
            None if parsed_ts.is_some() => ts.month(),
            None => fallback_month,
        };
        let temperature = parse_float(cell(cols.temperature), DEFAULT_TEMPERATURE_C)
            .ok_or_else(|| bad("temperature must be a number".into()))?;
        let humidity = parse_float(cell(cols.humidity), DEFAULT_HUMIDITY_PERCENT)
            .ok_or_else(|| bad("humidity must be a number".into()))?;
        let is_holiday = match cell(cols.is_holiday) {
            Some(s) => parse_flag(s).ok_or_else(|| bad(format!("is_holiday '{s}' is not 0/1")))?,
            None => false,
        };

        out.push(DemandRecord {
            timestamp: Some(ts),
            demand,
            temperature,
            hour,
            day_of_week,
            month,
            humidity,
            is_holiday,
            region: cell(cols.region).unwrap_or(DEFAULT_REGION).to_string(),
        });
    }
    Ok(out)
}

struct Columns {
    datetime: Option<usize>,
    temperature: Option<usize>,
    hour: Option<usize>,
    day_of_week: Option<usize>,
    month: Option<usize>,
    humidity: Option<usize>,
    is_holiday: Option<usize>,
    region: Option<usize>,
}

/// Integral values only; `"13.0"` is accepted.
fn parse_int(s: &str, min: u32, max: u32) -> Option<u32> {
    let v: f64 = s.parse().ok()?;
    (v.fract() == 0.0 && v >= min as f64 && v <= max as f64).then_some(v as u32)
}

fn parse_float(s: Option<&str>, default: f64) -> Option<f64> {
    match s {
        None => Some(default),
        Some(s) => s.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" => Some(true),
        "0" | "0.0" | "false" | "no" => Some(false),
        _ => None,
    }
}

pub fn write_csv(records: &[DemandRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for r in records {
        wtr.write_record(&[
            r.timestamp
                .map(|t| t.format(timestamp_format::FORMAT).to_string())
                .unwrap_or_default(),
            r.demand.to_string(),
            r.temperature.to_string(),
            r.hour.to_string(),
            r.day_of_week.to_string(),
            r.month.to_string(),
            r.humidity.to_string(),
            if r.is_holiday { "1" } else { "0" }.to_string(),
            r.region.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Concatenate and drop earlier rows that share a timestamp with a later one.
pub fn merge_records(existing: &[DemandRecord], incoming: Vec<DemandRecord>) -> Vec<DemandRecord> {
    let mut seen: HashSet<NaiveDateTime> = HashSet::new();
    let mut merged: Vec<DemandRecord> = existing
        .iter()
        .cloned()
        .chain(incoming)
        .rev()
        .filter(|r| r.timestamp.map_or(true, |ts| seen.insert(ts)))
        .collect();
    merged.reverse();
    merged
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemandStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_stats: Option<DemandStats>,
    pub columns: Vec<&'static str>,
    pub regions: Vec<String>,
}

pub fn stats(records: &[DemandRecord]) -> DatasetStats {
    if records.is_empty() {
        return DatasetStats {
            records: 0,
            message: Some("No data loaded".into()),
            date_range: None,
            demand_stats: None,
            columns: Vec::new(),
            regions: Vec::new(),
        };
    }
    let n = records.len() as f64;
    let demands = records.iter().map(|r| r.demand);
    let mean = demands.clone().sum::<f64>() / n;
    let min = demands.clone().fold(f64::INFINITY, f64::min);
    let max = demands.clone().fold(f64::NEG_INFINITY, f64::max);
    let std = if records.len() > 1 {
        (demands.map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let fmt = |t: Option<NaiveDateTime>| t.map(|t| t.format(timestamp_format::FORMAT).to_string());
    let mut regions: Vec<String> = Vec::new();
    for r in records {
        if !regions.contains(&r.region) {
            regions.push(r.region.clone());
        }
    }
    DatasetStats {
        records: records.len(),
        message: None,
        date_range: Some(DateRange {
            start: fmt(records.iter().filter_map(|r| r.timestamp).min()),
            end: fmt(records.iter().filter_map(|r| r.timestamp).max()),
        }),
        demand_stats: Some(DemandStats {
            mean: round2(mean),
            min: round2(min),
            max: round2(max),
            std: round2(std),
        }),
        columns: COLUMNS.to_vec(),
        regions,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub received: usize,
    pub total: usize,
}

/// The live dataset plus the copy loaded at startup, which `reset` restores.
///
/// Writers are serialized by `writer` and do their file I/O without holding
/// `current`, so readers only wait for the final pointer swap.
#[derive(Debug)]
pub struct DatasetStore {
    current: RwLock<Arc<Vec<DemandRecord>>>,
    baseline: Arc<Vec<DemandRecord>>,
    file: Option<PathBuf>,
    writer: Mutex<()>,
}

impl DatasetStore {
    pub fn in_memory(records: Vec<DemandRecord>) -> Self {
        let records = Arc::new(records);
        Self {
            current: RwLock::new(records.clone()),
            baseline: records,
            file: None,
            writer: Mutex::new(()),
        }
    }

    /// Loads `file` when it exists; a missing file is an empty dataset.
    pub fn open(file: Option<PathBuf>, fallback_month: u32) -> Result<Self, DatasetError> {
        let records = match file.as_deref() {
            Some(path) if path.exists() => {
                let records = parse_csv(File::open(path)?, fallback_month)?;
                info!(path = %path.display(), records = records.len(), "dataset loaded");
                records
            }
            _ => Vec::new(),
        };
        let mut store = Self::in_memory(records);
        store.file = file;
        Ok(store)
    }

    pub fn snapshot(&self) -> Arc<Vec<DemandRecord>> {
        self.current.read().clone()
    }

    pub fn stats(&self) -> DatasetStats {
        stats(&self.snapshot())
    }

    /// Merges and persists. The in-memory dataset is updated only after the
    /// file has been replaced; the previous file is copied to a timestamped
    /// backup first. Blocking, call from `spawn_blocking`.
    pub fn merge(&self, incoming: Vec<DemandRecord>) -> Result<MergeReport, DatasetError> {
        if incoming.is_empty() {
            return Err(DatasetError::Empty);
        }
        let received = incoming.len();
        let _writer = self.writer.lock();
        let merged = merge_records(&self.snapshot(), incoming);
        if let Some(path) = self.file.as_deref() {
            if let Some(backup) = backup_file(path)? {
                info!(backup = %backup.display(), "previous dataset backed up");
            }
            replace_file(path, |file| write_csv(&merged, BufWriter::new(file)))?;
        }
        let total = merged.len();
        *self.current.write() = Arc::new(merged);
        info!(received, total, "dataset merged");
        Ok(MergeReport { received, total })
    }

    /// Blocking, call from `spawn_blocking`.
    pub fn reset(&self) -> Result<usize, DatasetError> {
        let _writer = self.writer.lock();
        if let Some(path) = self.file.as_deref() {
            replace_file(path, |file| write_csv(&self.baseline, BufWriter::new(file)))?;
        }
        *self.current.write() = self.baseline.clone();
        Ok(self.baseline.len())
    }
}

/// `demand.csv` -> `demand_backup_20240501_101500.csv`, next to the original.
fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}_backup_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_backup_{stamp}"),
    };
    path.with_file_name(name)
}

fn backup_file(path: &Path) -> io::Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = backup_path(path, &local_now().format("%Y%m%d_%H%M%S").to_string());
    std::fs::copy(path, &backup)?;
    Ok(Some(backup))
}

/// Writes into a temp file in the target directory and renames it over
/// `path`. On any error the existing file is left untouched.
fn replace_file<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
