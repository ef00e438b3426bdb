use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::domain::{DemandRecord, PatternSource, PatternTable, DEFAULT_TEMP_COEFFICIENT};

/// Minimum record count before the temperature coefficient is fitted.
const MIN_RECORDS_FOR_CORRELATION: usize = 10;

/// Holds the active pattern table. Readers get an `Arc` snapshot; recompute
/// builds the replacement off-lock and publishes it with one pointer swap.
#[derive(Debug)]
pub struct PatternStore {
    current: RwLock<Arc<PatternTable>>,
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new(PatternTable::default())
    }
}

impl PatternStore {
    pub fn new(table: PatternTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    pub fn snapshot(&self) -> Arc<PatternTable> {
        self.current.read().clone()
    }

    pub fn recompute(&self, dataset: &[DemandRecord]) -> Arc<PatternTable> {
        let table = Arc::new(compute_patterns(dataset));
        *self.current.write() = table.clone();
        info!(
            base_mw = table.base_demand_mw,
            temp_coef = table.temp_coefficient,
            source = ?table.source,
            "pattern table published"
        );
        table
    }
}

/// Derive multipliers from history. Falls back to the default table when no
/// usable demand values exist.
pub fn compute_patterns(dataset: &[DemandRecord]) -> PatternTable {
    let usable: Vec<&DemandRecord> = dataset.iter().filter(|r| r.demand.is_finite()).collect();
    if usable.is_empty() {
        return PatternTable::default();
    }

    let base = mean(usable.iter().map(|r| r.demand));
    if !(base.is_finite() && base > 0.0) {
        return PatternTable::default();
    }

    let mut table = PatternTable {
        base_demand_mw: base,
        source: PatternSource::Dataset {
            records: usable.len(),
        },
        ..PatternTable::default()
    };
    table.hourly = bucket_multipliers::<24>(&usable, base, |r| Some(r.hour as usize));
    table.weekday = bucket_multipliers::<7>(&usable, base, |r| Some(r.day_of_week as usize));
    table.monthly = bucket_multipliers::<12>(&usable, base, |r| {
        r.month.checked_sub(1).map(|m| m as usize)
    });
    table.temp_coefficient = temperature_coefficient(&usable);
    table
}

/// `mean(demand | bucket) / base`, 1.0 for empty or out-of-range buckets.
fn bucket_multipliers<const N: usize>(
    records: &[&DemandRecord],
    base: f64,
    bucket: impl Fn(&DemandRecord) -> Option<usize>,
) -> [f64; N] {
    let mut sums = [0.0; N];
    let mut counts = [0usize; N];
    for r in records {
        match bucket(r) {
            Some(b) if b < N => {
                sums[b] += r.demand;
                counts[b] += 1;
            }
            _ => {}
        }
    }
    let mut out = [1.0; N];
    for (i, m) in out.iter_mut().enumerate() {
        if counts[i] > 0 {
            *m = sums[i] / counts[i] as f64 / base;
        }
    }
    out
}

fn temperature_coefficient(records: &[&DemandRecord]) -> f64 {
    if records.len() <= MIN_RECORDS_FOR_CORRELATION {
        return DEFAULT_TEMP_COEFFICIENT;
    }
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.temperature.is_finite())
        .map(|r| (r.temperature, r.demand))
        .collect();
    match pearson(&pairs) {
        Some(corr) => DEFAULT_TEMP_COEFFICIENT * (1.0 + corr),
        None => DEFAULT_TEMP_COEFFICIENT,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Pearson correlation, `None` when either series has zero variance.
fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let mx = mean(pairs.iter().map(|p| p.0));
    let my = mean(pairs.iter().map(|p| p.1));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    let denom = (sxx * syy).sqrt();
    let r = sxy / denom;
    (denom > 0.0 && r.is_finite()).then(|| r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DEFAULT_HOURLY, DEFAULT_REGION};

    fn rec(hour: u32, day: u32, month: u32, temperature: f64, demand: f64) -> DemandRecord {
        DemandRecord {
            timestamp: None,
            demand,
            temperature,
            hour,
            day_of_week: day,
            month,
            humidity: 60.0,
            is_holiday: false,
            region: DEFAULT_REGION.to_string(),
        }
    }

    #[test]
    fn empty_dataset_yields_default_table() {
        assert_eq!(compute_patterns(&[]), PatternTable::default());
        let store = PatternStore::default();
        store.recompute(&[]);
        assert_eq!(store.snapshot().hourly, DEFAULT_HOURLY);
        assert_eq!(store.snapshot().base_demand_mw, 3500.0);
    }

    #[test]
    fn non_finite_demand_falls_back_to_defaults() {
        let t = compute_patterns(&[rec(1, 1, 1, 20.0, f64::NAN)]);
        assert!(t.is_default());
    }

    #[test]
    fn multipliers_are_bucket_mean_over_base() {
        let data = vec![rec(0, 0, 1, 25.0, 1000.0), rec(12, 0, 1, 25.0, 3000.0)];
        let t = compute_patterns(&data);
        assert_eq!(t.base_demand_mw, 2000.0);
        assert_eq!(t.hourly[0], 0.5);
        assert_eq!(t.hourly[12], 1.5);
        assert_eq!(t.hourly[5], 1.0);
        assert_eq!(t.weekday[0], 1.0);
        assert_eq!(t.monthly[0], 1.0);
        assert_eq!(t.source, PatternSource::Dataset { records: 2 });
        // too few records to fit the temperature response
        assert_eq!(t.temp_coefficient, 15.0);
    }

    #[test]
    fn temperature_coefficient_follows_correlation() {
        let data: Vec<_> = (0..20)
            .map(|i| rec(i % 24, 0, 1, 15.0 + i as f64, 3000.0 + 10.0 * i as f64))
            .collect();
        let t = compute_patterns(&data);
        assert!((t.temp_coefficient - 30.0).abs() < 1e-9);
    }

    #[test]
    fn constant_temperature_keeps_default_coefficient() {
        let data: Vec<_> = (0..20).map(|i| rec(i, 0, 1, 25.0, 3000.0 + i as f64)).collect();
        assert_eq!(compute_patterns(&data).temp_coefficient, 15.0);
    }

    #[test]
    fn out_of_range_buckets_are_ignored() {
        let data = vec![rec(30, 9, 0, 25.0, 100.0), rec(1, 1, 1, 25.0, 100.0)];
        let t = compute_patterns(&data);
        assert_eq!(t.hourly[1], 1.0);
        assert!(t.hourly.iter().all(|m| *m == 1.0));
    }

    #[test]
    fn month_zero_is_not_counted() {
        let data = vec![rec(0, 0, 0, 25.0, 1000.0), rec(0, 0, 1, 25.0, 3000.0)];
        let t = compute_patterns(&data);
        assert_eq!(t.monthly[0], 1.5);
        assert!(t.monthly[1..].iter().all(|m| *m == 1.0));
    }

    #[test]
    fn snapshot_survives_recompute() {
        let store = PatternStore::default();
        let before = store.snapshot();
        store.recompute(&[rec(0, 0, 1, 25.0, 1000.0)]);
        assert!(before.is_default());
        assert!(!store.snapshot().is_default());
    }
}
