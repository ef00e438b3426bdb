use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::alerts::{Notifier, TracingNotifier};
use crate::config::Config;
use crate::domain::ForecastPoint;
use crate::forecast::{
    build_predictor, compute_patterns, ForecastEngine, ForecastError, OpenWeatherClient,
    PatternStore, RebuildReport, Retrainer, WeatherProvider,
};
use crate::ml::ModelArtifact;
use crate::repo::Repositories;
use crate::simulation::RealtimeSimulator;

/// Everything a handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub patterns: Arc<PatternStore>,
    pub engine: Arc<ForecastEngine>,
    pub repos: Arc<Repositories>,
    pub weather: Arc<dyn WeatherProvider>,
    pub realtime: Arc<RealtimeSimulator>,
    pub notifier: Arc<dyn Notifier>,
    retrainer: Retrainer,
    /// Model loaded at startup; restored on dataset reset.
    startup_model: Option<Arc<ModelArtifact>>,
    /// One rebuild at a time so publishes land in request order.
    rebuild_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let repos = Repositories::new(&cfg).context("loading dataset")?;
        let weather = OpenWeatherClient::new(&cfg.weather).context("building weather client")?;
        let startup_model = load_model(&cfg);

        let dataset = repos.dataset.snapshot();
        let patterns = Arc::new(PatternStore::new(compute_patterns(&dataset)));
        let predictor = build_predictor(patterns.snapshot(), startup_model.clone());
        info!(
            records = dataset.len(),
            predictor = ?predictor.kind(),
            base_demand_mw = patterns.snapshot().base_demand_mw,
            "forecast state ready"
        );

        Ok(Self {
            retrainer: Retrainer::new(&cfg.forecast),
            cfg: Arc::new(cfg),
            patterns,
            engine: Arc::new(ForecastEngine::new(predictor)),
            repos: Arc::new(repos),
            weather: Arc::new(weather),
            realtime: Arc::new(RealtimeSimulator::new(None)),
            notifier: Arc::new(TracingNotifier),
            startup_model,
            rebuild_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherProvider>) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_realtime(mut self, realtime: RealtimeSimulator) -> Self {
        self.realtime = Arc::new(realtime);
        self
    }

    pub fn current_model(&self) -> Option<Arc<ModelArtifact>> {
        let predictor = self.engine.predictor();
        predictor.model().cloned()
    }

    /// Next 24 hours from `now` at the configured base temperature.
    pub fn day_ahead(&self, now: DateTime<FixedOffset>) -> Result<Vec<ForecastPoint>, ForecastError> {
        self.engine
            .forecast_hourly(now, 24, self.cfg.forecast.default_base_temperature_c)
    }

    /// Recompute patterns and refit from the current dataset, keeping the
    /// active model if fitting is skipped or fails.
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        let fallback = self.current_model();
        self.rebuild_with(fallback).await
    }

    /// Rebuild after a reset: the startup model is the fallback.
    pub async fn rebuild_from_startup(&self) -> Result<RebuildReport> {
        self.rebuild_with(self.startup_model.clone()).await
    }

    async fn rebuild_with(&self, fallback: Option<Arc<ModelArtifact>>) -> Result<RebuildReport> {
        let _guard = self.rebuild_lock.lock().await;
        let dataset = self.repos.dataset.snapshot();
        let retrainer = self.retrainer.clone();
        let patterns = self.patterns.clone();
        let engine = self.engine.clone();
        let report = tokio::task::spawn_blocking(move || {
            retrainer.rebuild(&dataset, &patterns, &engine, fallback)
        })
        .await
        .context("rebuild task panicked")?;
        Ok(report)
    }
}

fn load_model(cfg: &Config) -> Option<Arc<ModelArtifact>> {
    let path = cfg.forecast.model_file.as_deref().filter(|p| p.exists())?;
    match ModelArtifact::load(path) {
        Ok(model) => {
            info!(path = %path.display(), r2 = model.metrics().r2, "model artifact loaded");
            Some(Arc::new(model))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable model artifact");
            None
        }
    }
}
