use axum::{
    extract::{rejection::QueryRejection, Path, Query},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    api::error::ApiError,
    reports::{
        daily_report, export, regional_report, weekly_report, DailyReport, ExportFormat,
        RegionalReport, ReportPeriod, WeeklyReport,
    },
    utils::local_now,
};

#[derive(Debug, Deserialize, Default)]
pub struct ExportQuery {
    #[serde(default)]
    pub report_type: ReportPeriod,
}

/// GET /reports/daily
pub async fn daily() -> Json<DailyReport> {
    Json(daily_report(local_now()))
}

/// GET /reports/weekly
pub async fn weekly() -> Json<WeeklyReport> {
    Json(weekly_report(local_now()))
}

/// GET /reports/regional
pub async fn regional() -> Json<RegionalReport> {
    Json(regional_report(local_now()))
}

/// GET /reports/export/{format} - Download as an attachment
pub async fn export_report(
    Path(format): Path<String>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let format: ExportFormat = format
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("unsupported export format '{format}', use csv or json")))?;
    let Query(q) = query?;
    let file = export(format, q.report_type, local_now())?;
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.body,
    ))
}
