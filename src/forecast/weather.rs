//! Current weather for the served cities (OpenWeatherMap)
//!
//! Live readings are cached per city. Any failure on the live path (no API
//! key, network error, non-2xx, unparsable body) degrades to a simulated
//! reading so callers never see a weather error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::WeatherConfig;
use crate::domain::grid::{City, CITIES};
use crate::domain::DIURNAL_OFFSETS_C;
use crate::utils::{local_now, round1};

/// Comfort band; outside it heating or cooling load appears.
const HEATING_BELOW_C: f64 = 20.0;
const COOLING_ABOVE_C: f64 = 25.0;
const HEATING_MW_PER_C: f64 = 25.0;
const COOLING_MW_PER_C: f64 = 35.0;
const HUMID_ABOVE_PERCENT: f64 = 70.0;
const HUMIDITY_MW_PER_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    Openweathermap,
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city: String,
    pub region: String,
    pub coordinates: Coordinates,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_percent: f64,
    pub pressure_hpa: f64,
    pub wind_speed_ms: f64,
    pub description: String,
    pub icon: String,
    pub timestamp: DateTime<Utc>,
    pub source: WeatherSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactType {
    Heating,
    Cooling,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherImpact {
    pub temperature_impact_mw: f64,
    pub humidity_impact_mw: f64,
    pub total_impact_mw: f64,
    pub impact_type: ImpactType,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NationalAverage {
    pub temperature_c: f64,
    pub humidity_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NationalWeather {
    pub timestamp: DateTime<Utc>,
    pub cities: Vec<CurrentWeather>,
    pub national_average: NationalAverage,
    pub demand_impact: WeatherImpact,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Never fails; falls back to a simulated reading.
    async fn current(&self, city: &'static City) -> CurrentWeather;
}

#[derive(Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    cache: Arc<RwLock<HashMap<&'static str, (Instant, CurrentWeather)>>>,
    ttl: Duration,
}

impl OpenWeatherClient {
    pub fn new(cfg: &WeatherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("eeu-forecast/0.1"));
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.read_timeout_secs))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            client,
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl: cfg.cache_ttl(),
        })
    }

    async fn cached(&self, city: &City) -> Option<CurrentWeather> {
        let c = self.cache.read().await;
        c.get(city.name)
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, w)| w.clone())
    }

    async fn fetch_live(&self, api_key: &str, city: &City) -> Result<CurrentWeather> {
        let url = format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(url)
            .query(&[
                ("lat", city.lat.to_string()),
                ("lon", city.lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .context("weather GET failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("weather API error: HTTP {status}");
        }
        let raw: RawWeather = resp.json().await.context("weather JSON parse failed")?;
        let condition = raw.weather.into_iter().next().unwrap_or_default();
        Ok(CurrentWeather {
            city: city.name.to_string(),
            region: city.region.to_string(),
            coordinates: Coordinates {
                lat: city.lat,
                lon: city.lon,
            },
            temperature_c: round1(raw.main.temp),
            feels_like_c: round1(raw.main.feels_like),
            humidity_percent: raw.main.humidity,
            pressure_hpa: raw.main.pressure,
            wind_speed_ms: raw.wind.speed,
            description: condition.description,
            icon: condition.icon,
            timestamp: Utc::now(),
            source: WeatherSource::Openweathermap,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, city: &'static City) -> CurrentWeather {
        if let Some(hit) = self.cached(city).await {
            return hit;
        }
        let Some(key) = self.api_key.as_deref() else {
            debug!(city = city.name, "no weather API key, simulating");
            return simulate(city, local_now().hour(), &mut rand::thread_rng());
        };
        match self.fetch_live(key, city).await {
            Ok(w) => {
                let mut c = self.cache.write().await;
                c.insert(city.name, (Instant::now(), w.clone()));
                w
            }
            Err(e) => {
                warn!(city = city.name, error = %e, "live weather unavailable, simulating");
                simulate(city, local_now().hour(), &mut rand::thread_rng())
            }
        }
    }
}

/// Plausible reading around the city's typical temperature for `hour`.
pub fn simulate<R: Rng>(city: &City, hour: u32, rng: &mut R) -> CurrentWeather {
    let offset = DIURNAL_OFFSETS_C.get(hour as usize).copied().unwrap_or(0.0);
    let temperature = city.base_temperature_c + offset + rng.gen_range(-2.0..=2.0_f64);
    CurrentWeather {
        city: city.name.to_string(),
        region: city.region.to_string(),
        coordinates: Coordinates {
            lat: city.lat,
            lon: city.lon,
        },
        temperature_c: round1(temperature),
        feels_like_c: round1(temperature - 1.0),
        humidity_percent: (55.0 + rng.gen_range(-15.0..=15.0_f64)).round(),
        pressure_hpa: (1013.0 + rng.gen_range(-5.0..=5.0_f64)).round(),
        wind_speed_ms: round1(2.0 + rng.gen_range(0.0..=4.0_f64)),
        description: if rng.gen_bool(0.5) { "partly cloudy" } else { "clear sky" }.to_string(),
        icon: if hour < 18 { "02d" } else { "02n" }.to_string(),
        timestamp: Utc::now(),
        source: WeatherSource::Simulated,
    }
}

/// Extra load caused by the weather, relative to the comfort band.
pub fn demand_impact(temperature_c: f64, humidity_percent: f64) -> WeatherImpact {
    let (temperature_impact, impact_type) = if temperature_c < HEATING_BELOW_C {
        ((HEATING_BELOW_C - temperature_c) * HEATING_MW_PER_C, ImpactType::Heating)
    } else if temperature_c > COOLING_ABOVE_C {
        ((temperature_c - COOLING_ABOVE_C) * COOLING_MW_PER_C, ImpactType::Cooling)
    } else {
        (0.0, ImpactType::Neutral)
    };
    let humidity_impact = if temperature_c > COOLING_ABOVE_C {
        ((humidity_percent - HUMID_ABOVE_PERCENT) * HUMIDITY_MW_PER_PERCENT).max(0.0)
    } else {
        0.0
    };
    let total = temperature_impact + humidity_impact;
    WeatherImpact {
        temperature_impact_mw: round1(temperature_impact),
        humidity_impact_mw: round1(humidity_impact),
        total_impact_mw: round1(total),
        impact_type,
        description: if total > 0.0 {
            "Weather conditions increasing demand".to_string()
        } else {
            "Weather conditions not significantly affecting demand".to_string()
        },
    }
}

/// Current weather for every served city plus the national picture.
pub async fn national_weather(provider: &dyn WeatherProvider) -> NationalWeather {
    let cities = futures::future::join_all(CITIES.iter().map(|c| provider.current(c))).await;
    let n = cities.len().max(1) as f64;
    let avg_temp = cities.iter().map(|w| w.temperature_c).sum::<f64>() / n;
    let avg_humidity = cities.iter().map(|w| w.humidity_percent).sum::<f64>() / n;
    NationalWeather {
        timestamp: Utc::now(),
        cities,
        national_average: NationalAverage {
            temperature_c: round1(avg_temp),
            humidity_percent: round1(avg_humidity),
        },
        demand_impact: demand_impact(avg_temp, avg_humidity),
    }
}

#[derive(Debug, Deserialize)]
struct RawWeather {
    main: RawMain,
    #[serde(default)]
    wind: RawWind,
    #[serde(default)]
    weather: Vec<RawCondition>,
}

#[derive(Debug, Deserialize)]
struct RawMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawCondition {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}
