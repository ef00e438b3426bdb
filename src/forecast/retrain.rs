use anyhow::Result;
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

use super::engine::ForecastEngine;
use super::patterns::PatternStore;
use super::predictor::{build_predictor, PredictorKind};
use crate::config::ForecastConfig;
use crate::domain::{DemandRecord, PatternTable};
use crate::ml::{
    FeatureVector, ModelArtifact, ModelTrainer, TrainingConfig, TrainingDataset, ValidationMetrics,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainingOutcome {
    Trained { metrics: ValidationMetrics },
    Skipped { records: usize, required: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub records: usize,
    pub patterns: Arc<PatternTable>,
    pub training: TrainingOutcome,
    pub predictor: PredictorKind,
}

/// Recomputes patterns, refits the regression and publishes the resulting
/// predictor. CPU bound; call from a blocking context.
#[derive(Debug, Clone)]
pub struct Retrainer {
    min_records: usize,
    model_file: Option<PathBuf>,
    training: TrainingConfig,
}

impl Retrainer {
    pub fn new(cfg: &ForecastConfig) -> Self {
        Self {
            min_records: cfg.min_training_records,
            model_file: cfg.model_file.clone(),
            training: TrainingConfig::default(),
        }
    }

    pub fn with_training_config(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    /// `fallback` is kept as the model when fitting is skipped or fails.
    pub fn rebuild(
        &self,
        dataset: &[DemandRecord],
        patterns: &PatternStore,
        engine: &ForecastEngine,
        fallback: Option<Arc<ModelArtifact>>,
    ) -> RebuildReport {
        let table = patterns.recompute(dataset);
        let (model, training) = match self.fit(dataset) {
            Ok(artifact) => {
                let metrics = artifact.metrics();
                info!(r2 = metrics.r2, mae = metrics.mae, records = dataset.len(), "model retrained");
                self.persist(&artifact);
                (Some(Arc::new(artifact)), TrainingOutcome::Trained { metrics })
            }
            Err(outcome) => (fallback, outcome),
        };
        let predictor = build_predictor(table.clone(), model);
        let kind = predictor.kind();
        engine.install(predictor);
        RebuildReport {
            records: dataset.len(),
            patterns: table,
            training,
            predictor: kind,
        }
    }

    fn fit(&self, dataset: &[DemandRecord]) -> Result<ModelArtifact, TrainingOutcome> {
        let rows = training_set(dataset).map_err(|e| TrainingOutcome::Failed {
            reason: e.to_string(),
        })?;
        if rows.len() < self.min_records {
            return Err(TrainingOutcome::Skipped {
                records: rows.len(),
                required: self.min_records,
            });
        }
        ModelTrainer::new(self.training.clone())
            .fit_artifact(&rows)
            .map_err(|e| {
                warn!(error = %e, "model training failed, keeping previous model");
                TrainingOutcome::Failed {
                    reason: e.to_string(),
                }
            })
    }

    fn persist(&self, artifact: &ModelArtifact) {
        if let Some(path) = &self.model_file {
            if let Err(e) = artifact.save(path) {
                warn!(path = %path.display(), error = %e, "could not persist model artifact");
            }
        }
    }
}

/// Full feature rows for every record with finite values.
pub fn training_set(dataset: &[DemandRecord]) -> Result<TrainingDataset> {
    let mut features = Vec::with_capacity(dataset.len());
    let mut targets = Vec::with_capacity(dataset.len());
    for r in dataset {
        let row = vec![
            r.temperature,
            r.hour as f64,
            r.day_of_week as f64,
            r.month as f64,
            r.humidity,
            if r.is_holiday { 1.0 } else { 0.0 },
        ];
        if r.demand.is_finite() && row.iter().all(|v| v.is_finite()) {
            features.push(FeatureVector::demand_features(row)?);
            targets.push(r.demand);
        }
    }
    TrainingDataset::new(features, targets)
}
