//! Simulated live grid telemetry.
//!
//! Every figure is the national daily shape evaluated at the current hour,
//! jittered by a seeded RNG. Nothing here is measured.

use chrono::{DateTime, FixedOffset, Timelike};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::grid::{
    operational_capacity_mw, total_capacity_mw, PlantKind, PlantStatus, POWER_PLANTS, REGIONAL_PEAK_FACTOR,
    REGIONS,
};
use crate::domain::{AlertSeverity, DEFAULT_HOURLY};
use crate::forecast::weekday_name;
use crate::utils::{round1, round2};

/// National mean load the live view is scaled from.
pub const LIVE_BASE_DEMAND_MW: f64 = 3680.0;
/// Generation runs slightly ahead of demand to cover losses.
const GENERATION_MARGIN: f64 = 1.02;
/// Reserve margin below which the grid is reported as stressed.
const STRESSED_RESERVE_PERCENT: f64 = 15.0;
const NOMINAL_FREQUENCY_HZ: f64 = 50.0;
const TROUGH_FACTOR: f64 = 0.46;
const DAILY_MEAN_FACTOR: f64 = 0.95;

/// Typical Addis Ababa temperature through the day.
const REFERENCE_TEMPERATURE_PROFILE_C: [f64; 24] = [
    15.0, 14.0, 13.0, 12.0, 12.0, 13.0, 15.0, 18.0, 21.0, 23.0, 25.0, 26.0, //
    27.0, 27.0, 27.0, 26.0, 25.0, 23.0, 21.0, 19.0, 18.0, 17.0, 16.0, 15.0,
];
const COMFORT_TEMPERATURE_C: f64 = 22.0;

pub fn hour_factor(hour: u32) -> f64 {
    DEFAULT_HOURLY.get(hour as usize).copied().unwrap_or(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridCondition {
    Normal,
    Stressed,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoltageLevels {
    #[serde(rename = "230kV")]
    pub kv230: f64,
    #[serde(rename = "132kV")]
    pub kv132: f64,
    #[serde(rename = "66kV")]
    pub kv66: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridStatus {
    pub timestamp: DateTime<FixedOffset>,
    pub grid_status: GridCondition,
    pub current_demand_mw: f64,
    pub current_generation_mw: f64,
    pub total_capacity_mw: f64,
    pub operational_capacity_mw: f64,
    pub reserve_margin_percent: f64,
    pub frequency_hz: f64,
    pub voltage_levels: VoltageLevels,
    pub load_factor: f64,
    pub peak_today_mw: f64,
    pub min_today_mw: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlantReading {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: PlantKind,
    pub capacity_mw: f64,
    pub current_output_mw: f64,
    pub utilization_percent: f64,
    pub location: &'static str,
    pub status: PlantStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationMix {
    pub hydro_percent: f64,
    pub wind_percent: f64,
    pub other_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetStatus {
    pub timestamp: DateTime<FixedOffset>,
    pub plants: Vec<PlantReading>,
    pub total_output_mw: f64,
    pub generation_mix: GenerationMix,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionReading {
    pub region: &'static str,
    pub current_demand_mw: f64,
    pub peak_demand_mw: f64,
    pub population: u64,
    pub households: u64,
    pub per_capita_kw: f64,
    pub substations: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionalDemand {
    pub timestamp: DateTime<FixedOffset>,
    pub regions: Vec<RegionReading>,
    pub total_demand_mw: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveWeatherImpact {
    pub temperature_impact_mw: f64,
    pub humidity_impact_mw: f64,
    pub total_impact_mw: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureOutlook {
    pub next_6h_temp_avg: f64,
    pub expected_peak_temp: f64,
    pub expected_low_temp: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveWeather {
    pub timestamp: DateTime<FixedOffset>,
    pub location: &'static str,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub conditions: &'static str,
    pub demand_impact: LiveWeatherImpact,
    pub forecast: TemperatureOutlook,
}

#[derive(Debug, Clone, Serialize)]
pub struct Advisory {
    pub id: u32,
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub category: &'static str,
    pub message: String,
    pub recommendation: &'static str,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryBoard {
    pub timestamp: DateTime<FixedOffset>,
    pub alerts: Vec<Advisory>,
    pub alert_count: usize,
    pub critical_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveSummary {
    pub timestamp: DateTime<FixedOffset>,
    pub current_time: String,
    pub current_date: String,
    pub day_of_week: &'static str,
    pub demand: BTreeMap<&'static str, f64>,
    pub generation: BTreeMap<&'static str, f64>,
    pub grid_health: GridHealth,
    pub quick_stats: QuickStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridHealth {
    pub status: GridCondition,
    pub frequency_hz: f64,
    pub stability: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickStats {
    pub households_served: &'static str,
    pub population_served: &'static str,
    pub regions_connected: usize,
    pub power_plants_online: usize,
}

pub struct RealtimeSimulator {
    rng: Mutex<StdRng>,
}

impl RealtimeSimulator {
    /// `None` seeds from entropy; tests pass a fixed seed.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    fn jitter(&self, spread: f64) -> f64 {
        self.rng.lock().gen_range(-spread..=spread)
    }

    pub fn status(&self, now: DateTime<FixedOffset>) -> GridStatus {
        let factor = hour_factor(now.hour());
        let demand = LIVE_BASE_DEMAND_MW * factor + self.jitter(50.0);
        let operational = operational_capacity_mw();
        let reserve = (operational - demand) / operational * 100.0;
        GridStatus {
            timestamp: now,
            grid_status: if reserve > STRESSED_RESERVE_PERCENT {
                GridCondition::Normal
            } else {
                GridCondition::Stressed
            },
            current_demand_mw: round2(demand),
            current_generation_mw: round2(demand * GENERATION_MARGIN),
            total_capacity_mw: total_capacity_mw(),
            operational_capacity_mw: operational,
            reserve_margin_percent: round2(reserve),
            frequency_hz: round3(NOMINAL_FREQUENCY_HZ + self.jitter(0.05)),
            voltage_levels: VoltageLevels {
                kv230: round2(230.0 + self.jitter(2.0)),
                kv132: round2(132.0 + self.jitter(1.0)),
                kv66: round2(66.0 + self.jitter(0.5)),
            },
            load_factor: round3(factor),
            peak_today_mw: round2(LIVE_BASE_DEMAND_MW * REGIONAL_PEAK_FACTOR),
            min_today_mw: round2(LIVE_BASE_DEMAND_MW * TROUGH_FACTOR),
        }
    }

    pub fn power_plants(&self, now: DateTime<FixedOffset>) -> FleetStatus {
        let factor = hour_factor(now.hour());
        let mut plants: Vec<PlantReading> = {
            let mut rng = self.rng.lock();
            POWER_PLANTS
                .iter()
                .map(|p| {
                    let output_factor = match (p.status, p.kind) {
                        (PlantStatus::Maintenance, _) => 0.0,
                        (_, PlantKind::Hydro) => 0.7 + (factor - 0.5) * 0.4,
                        (_, PlantKind::Wind) => rng.gen_range(0.2..0.6),
                        (_, PlantKind::Biomass) => 0.8,
                    };
                    let output = p.capacity_mw * output_factor;
                    PlantReading {
                        name: p.name,
                        kind: p.kind,
                        capacity_mw: p.capacity_mw,
                        current_output_mw: round2(output),
                        utilization_percent: round1(output / p.capacity_mw * 100.0),
                        location: p.location,
                        status: p.status,
                    }
                })
                .collect()
        };
        plants.sort_by(|a, b| b.capacity_mw.total_cmp(&a.capacity_mw));

        let total: f64 = plants.iter().map(|p| p.current_output_mw).sum();
        let share = |pred: &dyn Fn(PlantKind) -> bool| {
            let part: f64 = plants
                .iter()
                .filter(|p| pred(p.kind))
                .map(|p| p.current_output_mw)
                .sum();
            if total > 0.0 {
                round1(part / total * 100.0)
            } else {
                0.0
            }
        };
        let generation_mix = GenerationMix {
            hydro_percent: share(&|k| k == PlantKind::Hydro),
            wind_percent: share(&|k| k == PlantKind::Wind),
            other_percent: share(&|k| !matches!(k, PlantKind::Hydro | PlantKind::Wind)),
        };
        FleetStatus {
            timestamp: now,
            plants,
            total_output_mw: round2(total),
            generation_mix,
        }
    }

    /// Deterministic for a given hour.
    pub fn regional(&self, now: DateTime<FixedOffset>) -> RegionalDemand {
        let factor = hour_factor(now.hour());
        let mut regions: Vec<RegionReading> = REGIONS
            .iter()
            .map(|r| {
                let demand = r.base_demand_mw * factor;
                RegionReading {
                    region: r.name,
                    current_demand_mw: round2(demand),
                    peak_demand_mw: round2(r.base_demand_mw * REGIONAL_PEAK_FACTOR),
                    population: r.population,
                    households: r.households,
                    per_capita_kw: round4(demand * 1000.0 / r.population as f64),
                    substations: r.substations,
                }
            })
            .collect();
        regions.sort_by(|a, b| b.current_demand_mw.total_cmp(&a.current_demand_mw));
        let total = regions.iter().map(|r| r.current_demand_mw).sum();
        RegionalDemand {
            timestamp: now,
            regions,
            total_demand_mw: round2(total),
        }
    }

    pub fn weather(&self, now: DateTime<FixedOffset>) -> LiveWeather {
        let hour = now.hour() as usize % 24;
        let temperature = REFERENCE_TEMPERATURE_PROFILE_C[hour] + self.jitter(2.0);
        let humidity = 60.0 + self.jitter(10.0);
        let temperature_impact = (temperature - COMFORT_TEMPERATURE_C) * 15.0;
        let humidity_impact = if humidity > 70.0 {
            (humidity - 60.0) * 2.0
        } else {
            0.0
        };
        let next_6h = (0..6)
            .map(|i| REFERENCE_TEMPERATURE_PROFILE_C[(hour + i) % 24])
            .sum::<f64>()
            / 6.0;
        let profile = REFERENCE_TEMPERATURE_PROFILE_C.iter().copied();
        LiveWeather {
            timestamp: now,
            location: "Addis Ababa (Reference)",
            temperature_c: round1(temperature),
            humidity_percent: round1(humidity),
            conditions: if humidity < 60.0 {
                "Clear"
            } else if humidity < 75.0 {
                "Partly Cloudy"
            } else {
                "Cloudy"
            },
            demand_impact: LiveWeatherImpact {
                temperature_impact_mw: round2(temperature_impact),
                humidity_impact_mw: round2(humidity_impact),
                total_impact_mw: round2(temperature_impact + humidity_impact),
            },
            forecast: TemperatureOutlook {
                next_6h_temp_avg: round1(next_6h),
                expected_peak_temp: profile.clone().fold(f64::MIN, f64::max),
                expected_low_temp: profile.fold(f64::MAX, f64::min),
            },
        }
    }

    /// Hour-of-day advisories. Deterministic for a given hour.
    pub fn advisories(&self, now: DateTime<FixedOffset>) -> AdvisoryBoard {
        let hour = now.hour();
        let factor = hour_factor(hour);
        let mut alerts = Vec::new();
        let mut push = |id: u32,
                        severity: AlertSeverity,
                        category: &'static str,
                        message: String,
                        recommendation: &'static str| {
            alerts.push(Advisory {
                id,
                severity,
                category,
                message,
                recommendation,
                timestamp: now,
            })
        };
        if (18..=21).contains(&hour) {
            push(
                1,
                AlertSeverity::Warning,
                "Peak Demand",
                "Currently in evening peak period (18:00-21:00)".into(),
                "Industrial users should reduce non-essential loads",
            );
        }
        if factor > 1.2 {
            push(
                2,
                AlertSeverity::Critical,
                "High Demand",
                format!("Demand at {:.0}% of base load", factor * 100.0),
                "Activate all available generation capacity",
            );
        }
        push(
            3,
            AlertSeverity::Info,
            "Maintenance",
            "Ashegoda Wind Farm under scheduled maintenance".into(),
            "120 MW capacity temporarily unavailable",
        );
        if factor < 0.6 {
            push(
                4,
                AlertSeverity::Info,
                "Low Demand",
                "Off-peak period - optimal for maintenance".into(),
                "Schedule grid maintenance activities",
            );
        }
        let count = |s: AlertSeverity| alerts.iter().filter(|a| a.severity == s).count();
        AdvisoryBoard {
            timestamp: now,
            alert_count: alerts.len(),
            critical_count: count(AlertSeverity::Critical),
            warning_count: count(AlertSeverity::Warning),
            alerts,
        }
    }

    pub fn summary(&self, now: DateTime<FixedOffset>) -> LiveSummary {
        let demand = LIVE_BASE_DEMAND_MW * hour_factor(now.hour());
        let available = operational_capacity_mw();
        let online = POWER_PLANTS
            .iter()
            .filter(|p| p.status == PlantStatus::Operational)
            .count();
        LiveSummary {
            timestamp: now,
            current_time: now.format("%H:%M:%S").to_string(),
            current_date: now.format("%Y-%m-%d").to_string(),
            day_of_week: weekday_name(chrono::Datelike::weekday(&now)),
            demand: BTreeMap::from([
                ("current_mw", round2(demand)),
                ("peak_today_mw", round2(LIVE_BASE_DEMAND_MW * REGIONAL_PEAK_FACTOR)),
                ("min_today_mw", round2(LIVE_BASE_DEMAND_MW * TROUGH_FACTOR)),
                ("avg_today_mw", round2(LIVE_BASE_DEMAND_MW * DAILY_MEAN_FACTOR)),
            ]),
            generation: BTreeMap::from([
                ("total_capacity_mw", total_capacity_mw()),
                ("available_mw", available),
                ("current_output_mw", round2(demand * GENERATION_MARGIN)),
                ("reserve_mw", round2(available - demand)),
            ]),
            grid_health: GridHealth {
                status: GridCondition::Normal,
                frequency_hz: round3(NOMINAL_FREQUENCY_HZ + self.jitter(0.02)),
                stability: "stable",
            },
            quick_stats: QuickStats {
                households_served: "4.6M",
                population_served: "23M",
                regions_connected: REGIONS.len(),
                power_plants_online: online,
            },
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(&format!("2024-05-01T{hour:02}:15:00+03:00")).unwrap()
    }

    #[test]
    fn evening_peak_status_stays_within_jitter() {
        let sim = RealtimeSimulator::new(Some(7));
        let s = sim.status(at(19));
        let expected = LIVE_BASE_DEMAND_MW * 1.28;
        assert!((s.current_demand_mw - expected).abs() <= 50.0);
        assert_eq!(s.grid_status, GridCondition::Normal);
        assert!((49.95..=50.05).contains(&s.frequency_hz));
        assert_eq!(s.total_capacity_mw, 9049.0);
    }

    #[test]
    fn maintenance_plant_produces_nothing() {
        let fleet = RealtimeSimulator::new(Some(1)).power_plants(at(12));
        let ashegoda = fleet.plants.iter().find(|p| p.name == "Ashegoda Wind").unwrap();
        assert_eq!(ashegoda.current_output_mw, 0.0);
        assert_eq!(fleet.plants[0].name, "GERD");
        let mix = &fleet.generation_mix;
        let sum = mix.hydro_percent + mix.wind_percent + mix.other_percent;
        assert!((sum - 100.0).abs() < 0.5);
    }

    #[test]
    fn regional_view_is_sorted_and_sums() {
        let r = RealtimeSimulator::new(Some(1)).regional(at(12));
        assert_eq!(r.regions.len(), 11);
        assert_eq!(r.regions[0].region, "Addis Ababa");
        assert_eq!(r.regions[0].current_demand_mw, 1380.0);
        let sum: f64 = r.regions.iter().map(|x| x.current_demand_mw).sum();
        assert!((sum - r.total_demand_mw).abs() < 0.01);
    }

    #[test]
    fn advisories_follow_the_clock() {
        let sim = RealtimeSimulator::new(Some(1));
        let evening = sim.advisories(at(19));
        assert_eq!(evening.warning_count, 1);
        assert_eq!(evening.critical_count, 1);
        assert_eq!(evening.alert_count, 3);

        let night = sim.advisories(at(3));
        assert_eq!(night.alert_count, 2);
        assert_eq!(night.alerts[1].category, "Low Demand");
    }

    #[test]
    fn summary_reports_fleet() {
        let s = RealtimeSimulator::new(Some(1)).summary(at(12));
        assert_eq!(s.quick_stats.power_plants_online, 12);
        assert_eq!(s.generation["available_mw"], 8929.0);
        assert_eq!(s.day_of_week, "Wednesday");
    }
}
