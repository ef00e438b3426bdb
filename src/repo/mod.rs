use crate::config::Config;
use anyhow::Result;
use chrono::{Datelike, Utc};

pub mod alerts;
pub mod dataset;
pub mod households;

pub use alerts::{AlertFilter, AlertPage, AlertStore, AlertSummary};
pub use dataset::{DatasetError, DatasetStats, DatasetStore, MergeReport};
pub use households::{HouseholdAnalytics, HouseholdStore};

/// In-process stores shared by every handler.
#[derive(Debug)]
pub struct Repositories {
    pub alerts: AlertStore,
    pub households: HouseholdStore,
    pub dataset: DatasetStore,
}

impl Repositories {
    pub fn new(cfg: &Config) -> Result<Self> {
        let now = Utc::now();
        let dataset = DatasetStore::open(cfg.forecast.data_file.clone(), now.month())?;
        let alerts = AlertStore::new();
        if cfg.alerts.seed_samples {
            alerts.seed_samples(now);
        }
        Ok(Self {
            alerts,
            households: HouseholdStore::new(cfg.tariff.birr_per_kwh),
            dataset,
        })
    }
}
