use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use eeu_forecast::{api, config::Config, state::AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.alerts.seed_samples = false;
    cfg.forecast.data_file = None;
    cfg.forecast.model_file = None;
    cfg.weather.api_key = None;
    cfg
}

fn app() -> Router {
    let cfg = test_config();
    let state = AppState::new(cfg.clone()).expect("state");
    api::router(state, &cfg)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post_csv(app: &Router, csv: String) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_pattern_predictor() {
    let app = app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["predictor"]["kind"], "pattern");
    assert_eq!(body["checks"]["dataset"]["records"], 0);
}

#[tokio::test]
async fn post_forecast_uses_default_patterns() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/forecast",
        Some(json!({"temperature": 25.0, "hour": 12, "day_of_week": 2, "month": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let demand = body["forecasted_demand"].as_f64().unwrap();
    assert!((demand - 3500.0 * 1.15 * 1.05 * 0.98).abs() < 0.01);
    assert_eq!(body["predictor"], "pattern");
}

#[tokio::test]
async fn post_forecast_rejects_out_of_range_hour() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/forecast",
        Some(json!({"temperature": 25.0, "hour": 24, "day_of_week": 2, "month": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn day_ahead_forecast_has_24_contiguous_hours() {
    let app = app();
    let (status, body) = get(&app, "/forecast/24h?base_temperature=22").await;
    assert_eq!(status, StatusCode::OK);
    let points = body["forecasts"].as_array().unwrap();
    assert_eq!(points.len(), 24);
    let first = points[0]["hour"].as_u64().unwrap();
    for (i, p) in points.iter().enumerate() {
        assert_eq!(p["hour"].as_u64().unwrap(), (first + i as u64) % 24);
        assert!(p["predicted_demand_mw"].as_f64().unwrap() >= 100.0);
    }
    let peak = body["peak_demand_mw"].as_f64().unwrap();
    let avg = body["avg_demand_mw"].as_f64().unwrap();
    let min = body["min_demand_mw"].as_f64().unwrap();
    assert!(peak >= avg && avg >= min);
    assert_eq!(body["base_temperature"], 22.0);
}

#[tokio::test]
async fn weekly_forecast_and_analytics() {
    let app = app();
    let (status, body) = get(&app, "/forecast/weekly").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forecasts"].as_array().unwrap().len(), 7);

    let (status, body) = get(&app, "/analytics").await;
    assert_eq!(status, StatusCode::OK);
    let energy = body["total_energy_24h"].as_f64().unwrap();
    let cost = body["estimated_cost_birr"].as_f64().unwrap();
    assert!((cost - energy * 2750.0).abs() < 1.0);
}

#[tokio::test]
async fn check_demand_raises_one_emergency_and_alert_lifecycle() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/alerts/check-demand",
        Some(json!({"demand_mw": 8640.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alerts_generated"], 1);
    assert_eq!(body["alerts"][0]["severity"], "emergency");
    let id = body["alerts"][0]["id"].as_str().unwrap().to_string();

    let (_, body) = send(
        &app,
        Method::POST,
        "/alerts/check-demand",
        Some(json!({"demand_mw": 4500.0})),
    )
    .await;
    assert_eq!(body["alerts_generated"], 0);

    let (status, body) = get(&app, "/alerts?severity=emergency").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["unacknowledged"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/alerts/{id}/acknowledge"),
        Some(json!({"user": "shift-lead"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alert"]["acknowledged"], true);
    assert_eq!(body["alert"]["acknowledged_by"], "shift-lead");

    let (status, _) = send(&app, Method::DELETE, &format!("/alerts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::DELETE, &format!("/alerts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn check_demand_rejects_zero_capacity() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/alerts/check-demand",
        Some(json!({"demand_mw": 100.0, "capacity_mw": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn manual_alert_and_subscriptions() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/alerts",
        Some(json!({
            "type": "weather",
            "severity": "warning",
            "title": "Heavy rain",
            "message": "Flooding risk near Bahir Dar substation"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["alert"]["type"], "weather");

    let (status, body) = send(
        &app,
        Method::POST,
        "/alerts/subscribe",
        Some(json!({"email": "ops@example.com", "alert_types": ["weather"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["types"], json!(["weather"]));

    let (status, _) = send(&app, Method::DELETE, "/alerts/subscribe/ops@example.com", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, "/alerts/subscribe/ops@example.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/alerts/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_alerts"], 1);
}

#[tokio::test]
async fn alert_config_round_trip() {
    let app = app();
    let (status, mut config) = get(&app, "/alerts/config").await;
    assert_eq!(status, StatusCode::OK);
    config["sms_enabled"] = json!(true);
    config["min_severity"] = json!("critical");
    let (status, body) = send(&app, Method::PUT, "/alerts/config", Some(config)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["min_severity"], "critical");

    let (_, body) = get(&app, "/alerts/thresholds").await;
    assert_eq!(body["current_settings"]["sms_enabled"], true);
    assert_eq!(body["capacity_mw"], 9000.0);
}

#[tokio::test]
async fn household_crud() {
    let app = app();
    let (_, body) = get(&app, "/households/analytics/summary").await;
    assert!(body["total_households"].as_u64().unwrap() > 0, "sample shown when empty");

    let (status, body) = send(
        &app,
        Method::POST,
        "/households",
        Some(json!({
            "name": "Bekele family",
            "region": "Oromia",
            "num_people": 4,
            "num_rooms": 3,
            "has_ac": true,
            "appliances": ["fridge", "tv"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["estimated_monthly_kwh"], 410.0);
    assert_eq!(body["estimated_monthly_cost"], 1127.5);
    let id = body["id"].as_u64().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/households/{id}"),
        Some(json!({
            "name": "Bekele family",
            "region": "Oromia",
            "num_people": 4,
            "num_rooms": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["estimated_monthly_kwh"], 230.0);

    let (_, body) = get(&app, "/households").await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/households/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, &format!("/households/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/households/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn household_validation() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/households",
        Some(json!({"name": "", "region": "Afar", "num_people": 0, "num_rooms": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn chat_routes_by_intent() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/chat/message", Some(json!({"message": "help"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "help");

    let (_, body) = send(
        &app,
        Method::POST,
        "/chat/message",
        Some(json!({"message": "What is the peak demand tomorrow?"})),
    )
    .await;
    assert_eq!(body["intent"], "forecast");
    assert!(body["response"].as_str().unwrap().contains("MW"));

    let (status, _) = send(&app, Method::POST, "/chat/message", Some(json!({"message": "   "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = get(&app, "/chat/suggestions").await;
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn upload_merges_retrains_and_resets() {
    let app = app();
    let mut csv = String::from("datetime,demand,temperature\n");
    for h in 0..24 {
        csv.push_str(&format!(
            "2024-03-04 {h:02}:00:00,{},{}\n",
            3000 + h * 40,
            18 + h % 8
        ));
    }
    let (status, body) = post_csv(&app, csv).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records_processed"], 24);
    assert_eq!(body["total_records"], 24);

    let (_, stats) = get(&app, "/data/stats").await;
    assert_eq!(stats["records"], 24);
    assert_eq!(stats["regions"], json!(["National"]));

    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["checks"]["predictor"]["patterns_from_dataset"], true);

    let (status, body) = send(&app, Method::DELETE, "/data/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], 0);
    assert_eq!(body["predictor"], "pattern");
    let (_, stats) = get(&app, "/data/stats").await;
    assert_eq!(stats["records"], 0);
}

#[tokio::test]
async fn upload_without_demand_column_is_rejected() {
    let app = app();
    let (status, body) = post_csv(&app, "datetime,temperature\n2024-03-04 00:00:00,20\n".into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn simulated_views_respond() {
    let app = app();
    for uri in [
        "/realtime/status",
        "/realtime/power-plants",
        "/realtime/regional",
        "/realtime/weather",
        "/realtime/alerts",
        "/realtime/summary",
        "/ai/insights",
        "/ai/national",
        "/ai/predict/weekly",
        "/ai/alerts",
        "/ai/model/metrics",
        "/reports/daily",
        "/reports/weekly",
        "/reports/regional",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.is_object(), "{uri}");
    }
}

#[tokio::test]
async fn weather_lookup_by_city() {
    let app = app();
    let (status, body) = get(&app, "/external/weather/current/Adama").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["region"], "Oromia");
    assert_eq!(body["source"], "simulated");

    let (status, _) = get(&app, "/external/weather/current/Nairobi").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/external/weather/all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cities"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn csv_export_is_an_attachment() {
    let app = app();
    let req = Request::builder()
        .uri("/reports/export/csv?report_type=daily")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv");
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"eeu_demand_report_daily_"));
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.lines().next().unwrap().contains("demand_mw"));

    let (status, _) = get(&app, "/reports/export/xlsx").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
