//! Static reference data for the national grid: regions, generation fleet
//! and the cities used for weather lookups.

use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionProfile {
    pub name: &'static str,
    pub base_demand_mw: f64,
    pub population: u64,
    pub households: u64,
    pub substations: &'static [&'static str],
}

pub const REGIONS: [RegionProfile; 11] = [
    RegionProfile {
        name: "Addis Ababa",
        base_demand_mw: 1200.0,
        population: 4_200_000,
        households: 850_000,
        substations: &["Kality", "Kotebe", "Megenagna", "Bole", "Akaki"],
    },
    RegionProfile {
        name: "Oromia",
        base_demand_mw: 800.0,
        population: 6_000_000,
        households: 1_200_000,
        substations: &["Adama", "Bishoftu", "Jimma", "Nekemte", "Shashemene"],
    },
    RegionProfile {
        name: "Amhara",
        base_demand_mw: 500.0,
        population: 4_000_000,
        households: 800_000,
        substations: &["Bahir Dar", "Gondar", "Dessie", "Debre Markos"],
    },
    RegionProfile {
        name: "Tigray",
        base_demand_mw: 300.0,
        population: 2_000_000,
        households: 400_000,
        substations: &["Mekelle", "Axum", "Adigrat"],
    },
    RegionProfile {
        name: "SNNPR",
        base_demand_mw: 400.0,
        population: 3_000_000,
        households: 600_000,
        substations: &["Hawassa", "Arba Minch", "Wolaita Sodo"],
    },
    RegionProfile {
        name: "Somali",
        base_demand_mw: 150.0,
        population: 1_500_000,
        households: 300_000,
        substations: &[],
    },
    RegionProfile {
        name: "Afar",
        base_demand_mw: 80.0,
        population: 750_000,
        households: 150_000,
        substations: &[],
    },
    RegionProfile {
        name: "Benishangul-Gumuz",
        base_demand_mw: 60.0,
        population: 500_000,
        households: 100_000,
        substations: &[],
    },
    RegionProfile {
        name: "Gambela",
        base_demand_mw: 40.0,
        population: 400_000,
        households: 80_000,
        substations: &[],
    },
    RegionProfile {
        name: "Harari",
        base_demand_mw: 50.0,
        population: 250_000,
        households: 50_000,
        substations: &[],
    },
    RegionProfile {
        name: "Dire Dawa",
        base_demand_mw: 100.0,
        population: 500_000,
        households: 100_000,
        substations: &[],
    },
];

/// Ratio of regional evening peak to regional base demand.
pub const REGIONAL_PEAK_FACTOR: f64 = 1.28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum PlantKind {
    Hydro,
    Wind,
    Biomass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlantStatus {
    Operational,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerPlant {
    pub name: &'static str,
    pub kind: PlantKind,
    pub capacity_mw: f64,
    pub location: &'static str,
    pub status: PlantStatus,
}

const fn plant(
    name: &'static str,
    kind: PlantKind,
    capacity_mw: f64,
    location: &'static str,
    status: PlantStatus,
) -> PowerPlant {
    PowerPlant {
        name,
        kind,
        capacity_mw,
        location,
        status,
    }
}

pub const POWER_PLANTS: [PowerPlant; 13] = [
    plant("GERD", PlantKind::Hydro, 5150.0, "Benishangul-Gumuz", PlantStatus::Operational),
    plant("Gilgel Gibe III", PlantKind::Hydro, 1870.0, "SNNPR", PlantStatus::Operational),
    plant("Gilgel Gibe II", PlantKind::Hydro, 420.0, "SNNPR", PlantStatus::Operational),
    plant("Gilgel Gibe I", PlantKind::Hydro, 184.0, "SNNPR", PlantStatus::Operational),
    plant("Tekeze", PlantKind::Hydro, 300.0, "Tigray", PlantStatus::Operational),
    plant("Tana Beles", PlantKind::Hydro, 460.0, "Amhara", PlantStatus::Operational),
    plant("Fincha-Amerti-Neshe", PlantKind::Hydro, 134.0, "Oromia", PlantStatus::Operational),
    plant("Koka", PlantKind::Hydro, 43.0, "Oromia", PlantStatus::Operational),
    plant("Awash II & III", PlantKind::Hydro, 64.0, "Afar", PlantStatus::Operational),
    plant("Metahara Sugar", PlantKind::Biomass, 100.0, "Oromia", PlantStatus::Operational),
    plant("Adama Wind I", PlantKind::Wind, 51.0, "Oromia", PlantStatus::Operational),
    plant("Adama Wind II", PlantKind::Wind, 153.0, "Oromia", PlantStatus::Operational),
    plant("Ashegoda Wind", PlantKind::Wind, 120.0, "Tigray", PlantStatus::Maintenance),
];

pub fn total_capacity_mw() -> f64 {
    POWER_PLANTS.iter().map(|p| p.capacity_mw).sum()
}

pub fn operational_capacity_mw() -> f64 {
    POWER_PLANTS
        .iter()
        .filter(|p| p.status == PlantStatus::Operational)
        .map(|p| p.capacity_mw)
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct City {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub region: &'static str,
    /// Typical daily mean, used when simulating weather.
    pub base_temperature_c: f64,
}

pub static CITIES: [City; 10] = [
    City { name: "Addis Ababa", lat: 9.0320, lon: 38.7469, region: "Addis Ababa", base_temperature_c: 18.0 },
    City { name: "Dire Dawa", lat: 9.6009, lon: 41.8501, region: "Dire Dawa", base_temperature_c: 28.0 },
    City { name: "Mekelle", lat: 13.4967, lon: 39.4753, region: "Tigray", base_temperature_c: 20.0 },
    City { name: "Gondar", lat: 12.6030, lon: 37.4521, region: "Amhara", base_temperature_c: 19.0 },
    City { name: "Bahir Dar", lat: 11.5742, lon: 37.3614, region: "Amhara", base_temperature_c: 21.0 },
    City { name: "Hawassa", lat: 7.0504, lon: 38.4955, region: "SNNPR", base_temperature_c: 22.0 },
    City { name: "Adama", lat: 8.5400, lon: 39.2700, region: "Oromia", base_temperature_c: 24.0 },
    City { name: "Jimma", lat: 7.6667, lon: 36.8333, region: "Oromia", base_temperature_c: 20.0 },
    City { name: "Dessie", lat: 11.1333, lon: 39.6333, region: "Amhara", base_temperature_c: 17.0 },
    City { name: "Jijiga", lat: 9.3500, lon: 42.8000, region: "Somali", base_temperature_c: 26.0 },
];

pub fn find_city(name: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fleet_capacity() {
        assert_eq!(total_capacity_mw(), 9049.0);
        assert_eq!(operational_capacity_mw(), 8929.0);
    }

    #[test]
    fn city_lookup_ignores_case() {
        assert_eq!(find_city("addis ababa").map(|c| c.region), Some("Addis Ababa"));
        assert!(find_city("Nairobi").is_none());
    }
}
