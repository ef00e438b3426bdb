use anyhow::Context;
use axum::{extract::State, Json};
use chrono::Datelike;
use serde::Serialize;
use tracing::info;

use crate::{
    api::error::ApiError,
    forecast::{PredictorKind, TrainingOutcome},
    repo::{dataset::parse_csv, DatasetStats},
    state::AppState,
    utils::local_now,
};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    message: String,
    records_processed: usize,
    total_records: usize,
    training: TrainingOutcome,
    predictor: PredictorKind,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    message: String,
    records: usize,
    predictor: PredictorKind,
}

/// POST /upload - Merge a CSV body into the dataset and retrain
pub async fn upload(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<UploadResponse>, ApiError> {
    let records = parse_csv(body.as_bytes(), local_now().month())?;
    let repos = state.repos.clone();
    let merged = tokio::task::spawn_blocking(move || repos.dataset.merge(records))
        .await
        .context("dataset merge task panicked")??;

    let report = state.rebuild().await?;
    let message = match &report.training {
        TrainingOutcome::Trained { metrics } => format!(
            "Data uploaded and model retrained! R²={:.3}, MAE={:.1}MW",
            metrics.r2, metrics.mae
        ),
        _ => format!(
            "Data uploaded ({} total records). Using {} prediction.",
            merged.total,
            describe(report.predictor)
        ),
    };
    Ok(Json(UploadResponse {
        message,
        records_processed: merged.received,
        total_records: merged.total,
        training: report.training,
        predictor: report.predictor,
    }))
}

fn describe(kind: PredictorKind) -> &'static str {
    match kind {
        PredictorKind::Pattern => "pattern-based",
        PredictorKind::Blended => "blended pattern and regression",
    }
}

/// GET /data/stats - Summary of the loaded dataset
pub async fn stats(State(state): State<AppState>) -> Json<DatasetStats> {
    Json(state.repos.dataset.stats())
}

/// DELETE /data/reset - Restore the dataset loaded at startup
pub async fn reset(State(state): State<AppState>) -> Result<Json<ResetResponse>, ApiError> {
    let repos = state.repos.clone();
    let records = tokio::task::spawn_blocking(move || repos.dataset.reset())
        .await
        .context("dataset reset task panicked")??;
    let report = state.rebuild_from_startup().await?;
    info!(records, predictor = ?report.predictor, "dataset reset");
    Ok(Json(ResetResponse {
        message: format!("Data reset to the startup dataset ({records} records)"),
        records,
        predictor: report.predictor,
    }))
}
