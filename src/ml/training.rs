//! Offline fitting of the demand regression.

use super::{
    models::LinearRegressionModel, FeatureVector, ModelArtifact, ModelMetadata, StandardScaler,
    ValidationMetrics,
};
use anyhow::Result;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub features: Vec<FeatureVector>,
    pub targets: Vec<f64>,
}

impl TrainingDataset {
    pub fn new(features: Vec<FeatureVector>, targets: Vec<f64>) -> Result<Self> {
        if features.len() != targets.len() {
            anyhow::bail!(
                "Feature and target count mismatch: {} features, {} targets",
                features.len(),
                targets.len()
            );
        }
        Ok(Self { features, targets })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Same rows, reproducibly permuted.
    pub fn shuffled(&self, seed: u64) -> Self {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        Self {
            features: order.iter().map(|&i| self.features[i].clone()).collect(),
            targets: order.iter().map(|&i| self.targets[i]).collect(),
        }
    }

    /// Split dataset into training and validation sets
    pub fn split(&self, train_ratio: f64) -> Result<(TrainingDataset, TrainingDataset)> {
        if train_ratio <= 0.0 || train_ratio >= 1.0 {
            anyhow::bail!("Train ratio must be between 0 and 1");
        }

        let split_idx = (self.len() as f64 * train_ratio).floor() as usize;

        let train = TrainingDataset {
            features: self.features[..split_idx].to_vec(),
            targets: self.targets[..split_idx].to_vec(),
        };

        let val = TrainingDataset {
            features: self.features[split_idx..].to_vec(),
            targets: self.targets[split_idx..].to_vec(),
        };

        Ok((train, val))
    }

    fn scaled(&self, scaler: &StandardScaler) -> Result<Self> {
        let features = self
            .features
            .iter()
            .map(|f| scaler.transform(f))
            .collect::<Result<Vec<_>>>()?;
        Self::new(features, self.targets.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub max_iterations: usize,
    /// Stop once the squared gradient norm falls below this.
    pub tolerance: f64,
    pub validation_split: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iterations: 5000,
            tolerance: 1e-10,
            validation_split: 0.2,
            seed: 42,
        }
    }
}

pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn calculate_metrics(&self, predictions: &[f64], targets: &[f64]) -> Result<ValidationMetrics> {
        if predictions.len() != targets.len() {
            anyhow::bail!("Prediction and target count mismatch");
        }

        if predictions.is_empty() {
            anyhow::bail!("No predictions to evaluate");
        }

        let n = predictions.len() as f64;

        let mae: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(p, t)| (p - t).abs())
            .sum::<f64>()
            / n;

        let mse: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(p, t)| (p - t).powi(2))
            .sum::<f64>()
            / n;
        let rmse = mse.sqrt();

        let mape: f64 = predictions
            .iter()
            .zip(targets.iter())
            .filter(|(_, t)| t.abs() > 1e-10)
            .map(|(p, t)| ((p - t) / t).abs() * 100.0)
            .sum::<f64>()
            / n;

        let mean_target: f64 = targets.iter().sum::<f64>() / n;
        let ss_tot: f64 = targets.iter().map(|t| (t - mean_target).powi(2)).sum();
        let ss_res: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(p, t)| (t - p).powi(2))
            .sum();

        let r2 = if ss_tot.abs() < 1e-10 {
            0.0
        } else {
            1.0 - (ss_res / ss_tot)
        };

        Ok(ValidationMetrics::new(mae, rmse, mape, r2))
    }

    /// Batch gradient descent on already-scaled features.
    pub fn train_linear_regression(&self, dataset: &TrainingDataset) -> Result<LinearRegressionModel> {
        if dataset.is_empty() {
            anyhow::bail!("Cannot train on empty dataset");
        }

        let n_features = dataset.features[0].len();
        let n = dataset.len() as f64;
        let mut coefficients = vec![0.0; n_features];
        let mut intercept = 0.0;
        let mut iterations = 0;

        for _ in 0..self.config.max_iterations {
            iterations += 1;
            let mut coef_gradients = vec![0.0; n_features];
            let mut intercept_gradient = 0.0;

            for (features, target) in dataset.features.iter().zip(dataset.targets.iter()) {
                let prediction: f64 = features
                    .features
                    .iter()
                    .zip(coefficients.iter())
                    .map(|(f, c)| f * c)
                    .sum::<f64>()
                    + intercept;

                let error = prediction - target;

                for (g, feature_val) in coef_gradients.iter_mut().zip(&features.features) {
                    *g += error * feature_val / n;
                }
                intercept_gradient += error / n;
            }

            for (c, g) in coefficients.iter_mut().zip(&coef_gradients) {
                *c -= self.config.learning_rate * g;
            }
            intercept -= self.config.learning_rate * intercept_gradient;

            let norm: f64 =
                coef_gradients.iter().map(|g| g * g).sum::<f64>() + intercept_gradient.powi(2);
            if norm < self.config.tolerance {
                break;
            }
        }
        debug!(iterations, "linear regression converged");

        let predictions: Vec<f64> = dataset
            .features
            .iter()
            .map(|f| {
                f.features
                    .iter()
                    .zip(coefficients.iter())
                    .map(|(feat, coef)| feat * coef)
                    .sum::<f64>()
                    + intercept
            })
            .collect();

        let metrics = self.calculate_metrics(&predictions, &dataset.targets)?;

        let metadata = ModelMetadata {
            model_id: format!("linear_regression_{}", uuid::Uuid::new_v4()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: chrono::Utc::now(),
            training_samples: dataset.len(),
            validation_metrics: metrics,
            feature_names: dataset.features[0].feature_names.clone(),
        };

        Ok(LinearRegressionModel::new(coefficients, intercept, metadata))
    }

    /// Shuffle, split, fit a scaler on the training rows, fit the model and
    /// score it on the holdout. Tiny datasets are scored on the training rows.
    pub fn fit_artifact(&self, dataset: &TrainingDataset) -> Result<ModelArtifact> {
        let shuffled = dataset.shuffled(self.config.seed);
        let (train, holdout) = shuffled.split(1.0 - self.config.validation_split)?;
        let (train, holdout) = if train.is_empty() || holdout.is_empty() {
            (shuffled.clone(), shuffled)
        } else {
            (train, holdout)
        };

        let scaler = StandardScaler::fit(&train.features)?;
        let mut model = self.train_linear_regression(&train.scaled(&scaler)?)?;

        let holdout = holdout.scaled(&scaler)?;
        let predictions: Vec<f64> = holdout.features.iter().map(|f| model.dot(&f.features)).collect();
        model.metadata.validation_metrics = self.calculate_metrics(&predictions, &holdout.targets)?;
        model.metadata.training_samples = train.len();

        ModelArtifact::new(scaler, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_rows(n: usize) -> TrainingDataset {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for i in 0..n {
            let temp = 15.0 + (i % 17) as f64;
            let hour = (i % 24) as f64;
            features.push(FeatureVector::demand_features(vec![temp, hour]).unwrap());
            targets.push(1000.0 + 20.0 * temp + 50.0 * hour);
        }
        TrainingDataset::new(features, targets).unwrap()
    }

    #[test]
    fn test_dataset_split() {
        let (train, val) = linear_rows(10).split(0.8).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(val.len(), 2);
        assert!(linear_rows(4).split(1.0).is_err());
    }

    #[test]
    fn shuffle_is_reproducible() {
        let data = linear_rows(30);
        assert_eq!(data.shuffled(7).targets, data.shuffled(7).targets);
        assert_eq!(data.shuffled(7).len(), 30);
    }

    #[test]
    fn test_calculate_metrics() {
        let trainer = ModelTrainer::new(TrainingConfig::default());

        let predictions = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let targets = vec![1.1, 2.1, 2.9, 4.2, 4.8];

        let metrics = trainer.calculate_metrics(&predictions, &targets).unwrap();

        assert!(metrics.mae < 0.3);
        assert!(metrics.rmse < 0.4);
        assert!(metrics.r2 > 0.9);
    }

    #[test]
    fn fits_exact_linear_relation() {
        let trainer = ModelTrainer::new(TrainingConfig::default());
        let artifact = trainer.fit_artifact(&linear_rows(200)).unwrap();
        let metrics = artifact.metrics();
        assert!(metrics.r2 > 0.999, "r2 = {}", metrics.r2);
        assert!(metrics.mae < 1.0, "mae = {}", metrics.mae);

        let y = artifact.apply(&[20.0, 10.0]).unwrap();
        assert!((y - 1900.0).abs() < 1.0, "y = {y}");
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let trainer = ModelTrainer::new(TrainingConfig::default());
        let empty = TrainingDataset::new(vec![], vec![]).unwrap();
        assert!(trainer.train_linear_regression(&empty).is_err());
        assert!(trainer.fit_artifact(&empty).is_err());
    }
}
