use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    alerts::{dispatch, evaluate, thresholds, Channel, ThresholdTable},
    api::error::ApiError,
    domain::{Alert, AlertConfig, AlertSeverity, AlertType, NewAlert, Subscription},
    repo::{AlertFilter, AlertPage, AlertSummary},
    state::AppState,
    utils::round2,
};

const DEFAULT_ACKNOWLEDGER: &str = "operator";

#[derive(Debug, Deserialize, Validate)]
pub struct AlertQuery {
    pub severity: Option<AlertSeverity>,
    #[serde(rename = "type", alias = "alert_type")]
    pub alert_type: Option<AlertType>,
    pub acknowledged: Option<bool>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AlertCreated {
    message: &'static str,
    alert: Alert,
    notified: Vec<Channel>,
}

#[derive(Debug, Serialize)]
pub struct AlertMessage {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert: Option<Alert>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AcknowledgeRequest {
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CurrentSettings {
    email_enabled: bool,
    sms_enabled: bool,
    min_severity: AlertSeverity,
}

#[derive(Debug, Serialize)]
pub struct ThresholdsResponse {
    thresholds: ThresholdTable,
    capacity_mw: f64,
    current_settings: CurrentSettings,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DemandCheck {
    #[validate(range(min = 0.0))]
    pub demand_mw: f64,
    /// Defaults to the configured grid capacity.
    pub capacity_mw: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DemandCheckResult {
    demand_mw: f64,
    capacity_mw: f64,
    utilization_percent: f64,
    alerts_generated: usize,
    alerts: Vec<Alert>,
}

#[derive(Debug, Serialize)]
pub struct ConfigUpdated {
    message: &'static str,
    config: AlertConfig,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub alert_types: Vec<AlertType>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    message: String,
    subscription: Subscription,
}

/// Store and fan out a new alert.
fn raise(state: &AppState, new: NewAlert) -> (Alert, Vec<Channel>) {
    let alert = state.repos.alerts.insert(new);
    let channels = dispatch(
        state.notifier.as_ref(),
        &state.repos.alerts.config(),
        &state.repos.alerts.subscriptions(),
        &alert,
    );
    (alert, channels)
}

/// GET /alerts - Filtered alert log, newest first
pub async fn list_alerts(
    State(state): State<AppState>,
    query: Result<Query<AlertQuery>, QueryRejection>,
) -> Result<Json<AlertPage>, ApiError> {
    let Query(q) = query?;
    q.validate()?;
    let filter = AlertFilter {
        severity: q.severity,
        alert_type: q.alert_type,
        acknowledged: q.acknowledged,
        limit: q.limit,
    };
    Ok(Json(state.repos.alerts.list(&filter)))
}

/// POST /alerts - Raise an alert by hand
pub async fn create_alert(
    State(state): State<AppState>,
    payload: Result<Json<NewAlert>, JsonRejection>,
) -> Result<(StatusCode, Json<AlertCreated>), ApiError> {
    let Json(new) = payload?;
    new.validate()?;
    let (alert, notified) = raise(&state, new);
    Ok((
        StatusCode::CREATED,
        Json(AlertCreated {
            message: "Alert created",
            alert,
            notified,
        }),
    ))
}

/// POST /alerts/{id}/acknowledge
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<AcknowledgeRequest>>,
) -> Result<Json<AlertMessage>, ApiError> {
    let user = body
        .and_then(|Json(b)| b.user)
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ACKNOWLEDGER.to_string());
    let alert = state.repos.alerts.acknowledge(&id, &user)?;
    Ok(Json(AlertMessage {
        message: "Alert acknowledged".to_string(),
        alert: Some(alert),
    }))
}

/// DELETE /alerts/{id}
pub async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AlertMessage>, ApiError> {
    state.repos.alerts.delete(&id)?;
    Ok(Json(AlertMessage {
        message: "Alert deleted".to_string(),
        alert: None,
    }))
}

/// GET /alerts/summary - Dashboard counts
pub async fn summary(State(state): State<AppState>) -> Json<AlertSummary> {
    Json(state.repos.alerts.summary(Utc::now()))
}

/// GET /alerts/thresholds
pub async fn get_thresholds(State(state): State<AppState>) -> Json<ThresholdsResponse> {
    let config = state.repos.alerts.config();
    Json(ThresholdsResponse {
        thresholds: thresholds(),
        capacity_mw: state.cfg.grid.capacity_mw,
        current_settings: CurrentSettings {
            email_enabled: config.email_enabled,
            sms_enabled: config.sms_enabled,
            min_severity: config.min_severity,
        },
    })
}

/// POST /alerts/check-demand - Evaluate a demand reading against capacity
pub async fn check_demand(
    State(state): State<AppState>,
    payload: Result<Json<DemandCheck>, JsonRejection>,
) -> Result<Json<DemandCheckResult>, ApiError> {
    let Json(check) = payload?;
    check.validate()?;
    let capacity = check.capacity_mw.unwrap_or(state.cfg.grid.capacity_mw);
    let alerts: Vec<Alert> = evaluate(check.demand_mw, capacity)?
        .into_iter()
        .map(|new| raise(&state, new).0)
        .collect();
    Ok(Json(DemandCheckResult {
        demand_mw: check.demand_mw,
        capacity_mw: capacity,
        utilization_percent: round2(check.demand_mw / capacity * 100.0),
        alerts_generated: alerts.len(),
        alerts,
    }))
}

/// GET /alerts/config
pub async fn get_config(State(state): State<AppState>) -> Json<AlertConfig> {
    Json(state.repos.alerts.config())
}

/// PUT /alerts/config
pub async fn update_config(
    State(state): State<AppState>,
    payload: Result<Json<AlertConfig>, JsonRejection>,
) -> Result<Json<ConfigUpdated>, ApiError> {
    let Json(config) = payload?;
    config.validate()?;
    Ok(Json(ConfigUpdated {
        message: "Configuration updated",
        config: state.repos.alerts.set_config(config),
    }))
}

/// POST /alerts/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;
    let subscription = state.repos.alerts.subscribe(&req.email, req.alert_types);
    Ok(Json(SubscriptionResponse {
        message: format!("Subscribed {} to alerts", subscription.email),
        subscription,
    }))
}

/// DELETE /alerts/subscribe/{email}
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = state.repos.alerts.unsubscribe(&email)?;
    Ok(Json(SubscriptionResponse {
        message: format!("Unsubscribed {email}"),
        subscription,
    }))
}
