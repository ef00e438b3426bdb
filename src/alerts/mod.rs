//! Threshold evaluation and notification dispatch for grid alerts.

pub mod evaluator;
pub mod notify;

use thiserror::Error;

pub use evaluator::{evaluate, evaluate_forecast, thresholds, ThresholdTable};
pub use notify::{dispatch, Channel, Notifier, TracingNotifier};

#[derive(Debug, Error, PartialEq)]
pub enum AlertError {
    #[error("grid capacity must be a positive number of MW, got {0}")]
    InvalidCapacity(f64),
    #[error("demand must be a finite number of MW")]
    NonFiniteDemand,
    #[error("alert {0} not found")]
    NotFound(String),
    #[error("no subscription for {0}")]
    SubscriptionNotFound(String),
}
