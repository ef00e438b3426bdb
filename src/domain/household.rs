use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::round2;

const BASE_KWH: f64 = 50.0;
const PER_PERSON_KWH: f64 = 30.0;
const PER_ROOM_KWH: f64 = 20.0;
const AC_KWH: f64 = 150.0;
const HEATER_KWH: f64 = 100.0;
const EV_KWH: f64 = 200.0;
const PER_APPLIANCE_KWH: f64 = 15.0;

/// Household attributes as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct HouseholdSpec {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 80))]
    pub region: String,
    #[validate(range(min = 1, max = 100))]
    pub num_people: u32,
    #[validate(range(min = 1, max = 100))]
    pub num_rooms: u32,
    #[serde(default)]
    pub has_ac: bool,
    #[serde(default)]
    pub has_heater: bool,
    #[serde(default)]
    pub has_ev: bool,
    #[serde(default)]
    pub appliances: Vec<String>,
}

impl HouseholdSpec {
    /// Monthly kWh from occupancy and equipment.
    pub fn estimated_monthly_kwh(&self) -> f64 {
        let mut total = BASE_KWH
            + self.num_people as f64 * PER_PERSON_KWH
            + self.num_rooms as f64 * PER_ROOM_KWH
            + self.appliances.len() as f64 * PER_APPLIANCE_KWH;
        if self.has_ac {
            total += AC_KWH;
        }
        if self.has_heater {
            total += HEATER_KWH;
        }
        if self.has_ev {
            total += EV_KWH;
        }
        total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: u64,
    #[serde(flatten)]
    pub spec: HouseholdSpec,
    pub estimated_monthly_kwh: f64,
    pub estimated_monthly_cost: f64,
}

impl Household {
    pub fn new(id: u64, spec: HouseholdSpec, tariff_birr_per_kwh: f64) -> Self {
        let kwh = spec.estimated_monthly_kwh();
        Self {
            id,
            spec,
            estimated_monthly_kwh: round2(kwh),
            estimated_monthly_cost: round2(kwh * tariff_birr_per_kwh),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> HouseholdSpec {
        HouseholdSpec {
            name: "Abebe".into(),
            region: "Addis Ababa".into(),
            num_people: 4,
            num_rooms: 3,
            has_ac: false,
            has_heater: true,
            has_ev: false,
            appliances: vec!["fridge".into(), "tv".into()],
        }
    }

    #[test]
    fn estimate_adds_equipment_loads() {
        // 50 + 120 + 60 + 100 + 30
        assert_eq!(spec().estimated_monthly_kwh(), 360.0);
    }

    #[test]
    fn cost_follows_tariff() {
        let h = Household::new(1, spec(), 2.75);
        assert_eq!(h.estimated_monthly_kwh, 360.0);
        assert_eq!(h.estimated_monthly_cost, 990.0);
    }

    #[test]
    fn zero_occupants_rejected() {
        let mut s = spec();
        s.num_people = 0;
        assert!(s.validate().is_err());
    }
}
