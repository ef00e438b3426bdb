use chrono::{DateTime, FixedOffset, Utc};

/// East Africa Time; the grid has no daylight saving.
pub const GRID_UTC_OFFSET_SECS: i32 = 3 * 3600;

/// Wall-clock time in the grid's timezone.
pub fn local_now() -> DateTime<FixedOffset> {
    to_local(Utc::now())
}

pub fn to_local(ts: DateTime<Utc>) -> DateTime<FixedOffset> {
    match FixedOffset::east_opt(GRID_UTC_OFFSET_SECS) {
        Some(tz) => ts.with_timezone(&tz),
        None => ts.fixed_offset(),
    }
}

/// Round to one decimal place for display.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Round to two decimal places (MW, MWh and birr amounts on the wire).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}
