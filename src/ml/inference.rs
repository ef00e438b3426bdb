//! The persisted regression artifact and how it is applied at predict time.

use super::{models::LinearRegressionModel, FeatureVector, MLModel, StandardScaler, ValidationMetrics};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scaler and model fitted together; applied as `model(scale(x))`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub scaler: StandardScaler,
    pub model: LinearRegressionModel,
}

impl ModelArtifact {
    pub fn new(scaler: StandardScaler, model: LinearRegressionModel) -> Result<Self> {
        if scaler.n_features() != model.n_features() {
            anyhow::bail!(
                "Scaler expects {} features but model expects {}",
                scaler.n_features(),
                model.n_features()
            );
        }
        Ok(Self { scaler, model })
    }

    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    pub fn metrics(&self) -> ValidationMetrics {
        self.model.metadata.validation_metrics
    }

    pub fn apply(&self, raw: &[f64]) -> Result<f64> {
        let features = FeatureVector::demand_features(raw.to_vec())?;
        let scaled = self.scaler.transform(&features)?;
        self.model.predict(&scaled)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading model artifact {}", path.display()))?;
        let artifact: Self = serde_json::from_slice(&bytes).context("model artifact JSON parse failed")?;
        Self::new(artifact.scaler, artifact.model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing model artifact {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::ModelMetadata;

    fn artifact(coefficients: Vec<f64>, intercept: f64) -> ModelArtifact {
        let n = coefficients.len();
        let metadata = ModelMetadata {
            model_id: "fixture".into(),
            version: "0".into(),
            trained_at: chrono::Utc::now(),
            training_samples: 0,
            validation_metrics: ValidationMetrics::new(0.0, 0.0, 0.0, 1.0),
            feature_names: vec![],
        };
        ModelArtifact::new(
            StandardScaler {
                means: vec![0.0; n],
                stds: vec![1.0; n],
            },
            LinearRegressionModel::new(coefficients, intercept, metadata),
        )
        .unwrap()
    }

    #[test]
    fn applies_scale_then_model() {
        let mut a = artifact(vec![1.0, 0.0], 5.0);
        a.scaler.means = vec![10.0, 0.0];
        a.scaler.stds = vec![2.0, 1.0];
        assert_eq!(a.apply(&[14.0, 99.0]).unwrap(), 7.0);
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let a = artifact(vec![1.0, 1.0], 0.0);
        assert!(a.apply(&[1.0]).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/model.json");
        let a = artifact(vec![0.5, 2.0, -1.0, 3.0], 4000.0);
        a.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.model.coefficients, a.model.coefficients);
        assert_eq!(loaded.scaler, a.scaler);
    }
}
