use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub forecast: ForecastConfig,
    pub grid: GridConfig,
    pub tariff: TariffConfig,
    pub weather: WeatherConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub allowed_origin: String,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: true,
            allowed_origin: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Reference temperature used when a request does not supply one.
    pub default_base_temperature_c: f64,
    /// Historical demand CSV. Loaded at startup and rewritten on upload.
    pub data_file: Option<PathBuf>,
    /// Trained linear model artifact (JSON).
    pub model_file: Option<PathBuf>,
    pub min_training_records: usize,
    pub cost_per_mwh_birr: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_base_temperature_c: 25.0,
            data_file: None,
            model_file: None,
            min_training_records: 10,
            cost_per_mwh_birr: 2750.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub capacity_mw: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { capacity_mw: 9000.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffConfig {
    pub birr_per_kwh: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self { birr_per_kwh: 2.75 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub cache_minutes: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org".to_string(),
            connect_timeout_secs: 5,
            read_timeout_secs: 10,
            cache_minutes: 30,
        }
    }
}

impl WeatherConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_minutes * 60)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    pub seed_samples: bool,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self { seed_samples: true }
    }
}

impl Config {
    /// Compiled defaults, then `config/default.toml`, then `EEU__*` env vars.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("EEU__").split("__"));
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_grid_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.grid.capacity_mw, 9000.0);
        assert_eq!(cfg.tariff.birr_per_kwh, 2.75);
        assert_eq!(cfg.forecast.cost_per_mwh_birr, 2750.0);
        assert_eq!(cfg.weather.cache_ttl(), Duration::from_secs(1800));
    }

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("EEU__SERVER__PORT", "9100");
            jail.set_env("EEU__GRID__CAPACITY_MW", "7500.5");
            let cfg = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(cfg.server.port, 9100);
            assert_eq!(cfg.grid.capacity_mw, 7500.5);
            Ok(())
        });
    }

    #[test]
    fn socket_addr_parses() {
        let server = ServerConfig::default();
        assert_eq!(server.socket_addr().unwrap().port(), 8000);
    }
}
