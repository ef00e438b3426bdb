use super::{FeatureVector, ModelMetadata};
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub trait MLModel: Send + Sync {
    /// Predict a value from (already scaled) features
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    fn metadata(&self) -> &ModelMetadata;
}

/// Ordinary least squares model over standardized features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub metadata: ModelMetadata,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64, metadata: ModelMetadata) -> Self {
        Self {
            metadata,
            coefficients,
            intercept,
        }
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    pub(crate) fn dot(&self, features: &[f64]) -> f64 {
        features
            .iter()
            .zip(self.coefficients.iter())
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept
    }
}

impl MLModel for LinearRegressionModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            anyhow::bail!(
                "Feature count mismatch: expected {}, got {}",
                self.coefficients.len(),
                features.len()
            );
        }
        Ok(self.dot(&features.features))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
