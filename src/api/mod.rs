pub mod alerts;
pub mod chat;
pub mod data;
pub mod error;
pub mod forecast;
pub mod health;
pub mod households;
pub mod insights;
pub mod realtime;
pub mod reports;
pub mod weather;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::{config::Config, state::AppState};

pub fn router(state: AppState, cfg: &Config) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .merge(forecast_routes())
        .merge(data_routes())
        .nest("/alerts", alert_routes())
        .nest("/households", household_routes())
        .nest("/chat", chat_routes())
        .nest("/realtime", realtime_routes())
        .nest("/ai", insight_routes())
        .nest("/external", weather_routes())
        .nest("/reports", report_routes())
        .with_state(state);

    if cfg.server.enable_cors {
        match cfg.server.allowed_origin.parse::<HeaderValue>() {
            Ok(origin) => {
                let cors = CorsLayer::new()
                    .allow_origin(AllowOrigin::exact(origin))
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                    .allow_headers([header::CONTENT_TYPE]);
                router = router.layer(cors);
            }
            Err(e) => {
                warn!(origin = %cfg.server.allowed_origin, error = %e, "invalid CORS origin, CORS disabled");
            }
        }
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(cfg.server.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}

fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/forecast", get(forecast::current_forecast).post(forecast::predict))
        .route("/forecast/24h", get(forecast::forecast_24h))
        .route("/forecast/weekly", get(forecast::forecast_weekly))
        .route("/analytics", get(forecast::analytics))
}

fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(data::upload))
        .route("/data/stats", get(data::stats))
        .route("/data/reset", delete(data::reset))
}

fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(alerts::list_alerts).post(alerts::create_alert))
        .route("/summary", get(alerts::summary))
        .route("/thresholds", get(alerts::get_thresholds))
        .route("/check-demand", post(alerts::check_demand))
        .route("/config", get(alerts::get_config).put(alerts::update_config))
        .route("/subscribe", post(alerts::subscribe))
        .route("/subscribe/:email", delete(alerts::unsubscribe))
        .route("/:id/acknowledge", post(alerts::acknowledge_alert))
        .route("/:id", delete(alerts::delete_alert))
}

fn household_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(households::list).post(households::create))
        .route("/analytics/summary", get(households::analytics))
        .route(
            "/:id",
            get(households::get)
                .put(households::update)
                .delete(households::delete),
        )
}

fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/message", post(chat::message))
        .route("/suggestions", get(chat::suggestions))
}

fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(realtime::status))
        .route("/power-plants", get(realtime::power_plants))
        .route("/regional", get(realtime::regional))
        .route("/weather", get(realtime::weather))
        .route("/alerts", get(realtime::alerts))
        .route("/summary", get(realtime::summary))
}

fn insight_routes() -> Router<AppState> {
    Router::new()
        .route("/insights", get(insights::ai_insights))
        .route("/national", get(insights::national_analytics))
        .route("/predict/weekly", get(insights::weekly))
        .route("/alerts", get(insights::forecast_alerts))
        .route("/model/metrics", get(insights::metrics))
}

fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/weather/current/:city", get(weather::current))
        .route("/weather/all", get(weather::all))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/daily", get(reports::daily))
        .route("/weekly", get(reports::weekly))
        .route("/regional", get(reports::regional))
        .route("/export/:format", get(reports::export_report))
}

#[cfg(feature = "metrics")]
pub fn with_metrics(app: Router) -> Router {
    use axum_prometheus::PrometheusMetricLayer;
    let (layer, handle) = PrometheusMetricLayer::pair();

    let metrics_router = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    app.layer(layer).merge(metrics_router)
}
