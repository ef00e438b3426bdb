//! Statistical models used to refine the pattern forecast.
//!
//! - `models`: the linear regression model and the `MLModel` seam
//! - `training`: dataset split, gradient-descent fitting, holdout metrics
//! - `inference`: the persisted artifact (scaler + model) applied at predict time

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod inference;
pub mod models;
pub mod training;

pub use inference::ModelArtifact;
pub use models::{LinearRegressionModel, MLModel};
pub use training::{ModelTrainer, TrainingConfig, TrainingDataset};

/// Demand model features, in artifact order. Artifacts may use a prefix.
pub const FEATURE_NAMES: [&str; 6] = [
    "temperature",
    "hour",
    "day_of_week",
    "month",
    "humidity",
    "is_holiday",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub version: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub training_samples: usize,
    pub validation_metrics: ValidationMetrics,
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub mae: f64,  // Mean Absolute Error
    pub rmse: f64, // Root Mean Square Error
    pub mape: f64, // Mean Absolute Percentage Error
    pub r2: f64,   // R-squared
}

impl ValidationMetrics {
    pub fn new(mae: f64, rmse: f64, mape: f64, r2: f64) -> Self {
        Self { mae, rmse, mape, r2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub features: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureVector {
    pub fn new(features: Vec<f64>, feature_names: Vec<String>) -> Result<Self> {
        if features.len() != feature_names.len() {
            anyhow::bail!(
                "Feature count mismatch: {} features, {} names",
                features.len(),
                feature_names.len()
            );
        }
        Ok(Self {
            features,
            feature_names,
        })
    }

    /// Names taken from [`FEATURE_NAMES`] by position.
    pub fn demand_features(features: Vec<f64>) -> Result<Self> {
        if features.len() > FEATURE_NAMES.len() {
            anyhow::bail!("at most {} demand features supported", FEATURE_NAMES.len());
        }
        let names = FEATURE_NAMES[..features.len()]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self::new(features, names)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Standardize features using z-score normalization
    pub fn standardize(&self, means: &[f64], stds: &[f64]) -> Result<Self> {
        if means.len() != self.features.len() || stds.len() != self.features.len() {
            anyhow::bail!("Standardization parameter count mismatch");
        }

        let standardized = self
            .features
            .iter()
            .zip(means.iter().zip(stds.iter()))
            .map(|(f, (mean, std))| {
                if std.abs() < 1e-10 {
                    0.0
                } else {
                    (f - mean) / std
                }
            })
            .collect();

        Ok(Self {
            features: standardized,
            feature_names: self.feature_names.clone(),
        })
    }
}

/// Per-feature z-score parameters fitted on the training split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(samples: &[FeatureVector]) -> Result<Self> {
        let Some(first) = samples.first() else {
            anyhow::bail!("Cannot fit scaler on empty sample set");
        };
        let width = first.len();
        let n = samples.len() as f64;
        let mut means = vec![0.0; width];
        for s in samples {
            if s.len() != width {
                anyhow::bail!("Ragged feature vectors: expected {}, got {}", width, s.len());
            }
            for (m, f) in means.iter_mut().zip(&s.features) {
                *m += f / n;
            }
        }
        let mut stds = vec![0.0; width];
        for s in samples {
            for ((v, f), m) in stds.iter_mut().zip(&s.features).zip(&means) {
                *v += (f - m).powi(2) / n;
            }
        }
        for v in &mut stds {
            *v = v.sqrt();
        }
        Ok(Self { means, stds })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn transform(&self, features: &FeatureVector) -> Result<FeatureVector> {
        features.standardize(&self.means, &self.stds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: &[f64]) -> FeatureVector {
        FeatureVector::demand_features(values.to_vec()).unwrap()
    }

    #[test]
    fn test_feature_vector_creation() {
        let v = fv(&[25.0, 12.0, 2.0, 6.0]);
        assert_eq!(v.len(), 4);
        assert_eq!(v.feature_names[3], "month");
        assert!(FeatureVector::demand_features(vec![0.0; 7]).is_err());
    }

    #[test]
    fn test_feature_vector_standardize() {
        let v = FeatureVector::new(vec![10.0, 20.0, 30.0], vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        let out = v.standardize(&[10.0, 10.0, 30.0], &[2.0, 5.0, 0.0]).unwrap();
        assert_eq!(out.features, vec![0.0, 2.0, 0.0]);
    }

    #[test]
    fn scaler_centres_and_scales() {
        let samples = vec![fv(&[1.0, 10.0]), fv(&[3.0, 10.0])];
        let scaler = StandardScaler::fit(&samples).unwrap();
        assert_eq!(scaler.means, vec![2.0, 10.0]);
        assert_eq!(scaler.stds, vec![1.0, 0.0]);
        let t = scaler.transform(&fv(&[3.0, 12.0])).unwrap();
        assert_eq!(t.features, vec![1.0, 0.0]);
    }

    #[test]
    fn scaler_rejects_empty_input() {
        assert!(StandardScaler::fit(&[]).is_err());
    }
}
