use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{Household, HouseholdSpec};
use crate::utils::round2;

/// Peak kW drawn per resident, in MW.
const PEAK_MW_PER_PERSON: f64 = 0.008;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RegionTotals {
    pub households: u64,
    pub population: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseholdAnalytics {
    pub total_households: u64,
    pub total_population: u64,
    pub avg_consumption_kwh: f64,
    pub peak_demand_mw: f64,
    pub regions: BTreeMap<String, RegionTotals>,
}

impl HouseholdAnalytics {
    /// National sample shown before any household is registered.
    pub fn sample() -> Self {
        let regions = [
            ("Addis Ababa", 50_000, 250_000),
            ("Oromia", 30_000, 150_000),
            ("Amhara", 25_000, 125_000),
            ("Tigray", 10_000, 50_000),
            ("SNNPR", 10_000, 50_000),
        ]
        .into_iter()
        .map(|(name, households, population)| {
            (
                name.to_string(),
                RegionTotals {
                    households,
                    population,
                },
            )
        })
        .collect();
        Self {
            total_households: 125_000,
            total_population: 625_000,
            avg_consumption_kwh: 180.5,
            peak_demand_mw: 4850.0,
            regions,
        }
    }
}

#[derive(Debug, Default)]
struct HouseholdState {
    next_id: u64,
    items: BTreeMap<u64, Household>,
}

#[derive(Debug)]
pub struct HouseholdStore {
    tariff_birr_per_kwh: f64,
    inner: RwLock<HouseholdState>,
}

impl HouseholdStore {
    pub fn new(tariff_birr_per_kwh: f64) -> Self {
        Self {
            tariff_birr_per_kwh,
            inner: RwLock::new(HouseholdState::default()),
        }
    }

    pub fn create(&self, spec: HouseholdSpec) -> Household {
        let mut s = self.inner.write();
        s.next_id += 1;
        let household = Household::new(s.next_id, spec, self.tariff_birr_per_kwh);
        s.items.insert(household.id, household.clone());
        household
    }

    pub fn list(&self) -> Vec<Household> {
        self.inner.read().items.values().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Option<Household> {
        self.inner.read().items.get(&id).cloned()
    }

    /// Replaces the attributes and re-derives the estimate.
    pub fn update(&self, id: u64, spec: HouseholdSpec) -> Option<Household> {
        let mut s = self.inner.write();
        let slot = s.items.get_mut(&id)?;
        *slot = Household::new(id, spec, self.tariff_birr_per_kwh);
        Some(slot.clone())
    }

    pub fn delete(&self, id: u64) -> Option<Household> {
        self.inner.write().items.remove(&id)
    }

    pub fn analytics(&self) -> HouseholdAnalytics {
        let s = self.inner.read();
        if s.items.is_empty() {
            return HouseholdAnalytics::sample();
        }
        let mut regions: BTreeMap<String, RegionTotals> = BTreeMap::new();
        let mut population = 0u64;
        let mut kwh = 0.0;
        for h in s.items.values() {
            let r = regions.entry(h.spec.region.clone()).or_default();
            r.households += 1;
            r.population += h.spec.num_people as u64;
            population += h.spec.num_people as u64;
            kwh += h.estimated_monthly_kwh;
        }
        let count = s.items.len();
        HouseholdAnalytics {
            total_households: count as u64,
            total_population: population,
            avg_consumption_kwh: round2(kwh / count as f64),
            peak_demand_mw: round2(population as f64 * PEAK_MW_PER_PERSON),
            regions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(region: &str, people: u32, has_ac: bool) -> HouseholdSpec {
        HouseholdSpec {
            name: "home".into(),
            region: region.into(),
            num_people: people,
            num_rooms: 2,
            has_ac,
            has_heater: false,
            has_ev: false,
            appliances: vec![],
        }
    }

    #[test]
    fn empty_store_reports_sample() {
        let store = HouseholdStore::new(2.75);
        assert_eq!(store.analytics(), HouseholdAnalytics::sample());
    }

    #[test]
    fn crud_round() {
        let store = HouseholdStore::new(2.75);
        let h = store.create(spec("Oromia", 3, false));
        assert_eq!(h.id, 1);
        assert_eq!(h.estimated_monthly_kwh, 180.0);

        let updated = store.update(h.id, spec("Oromia", 3, true)).unwrap();
        assert_eq!(updated.estimated_monthly_kwh, 330.0);
        assert_eq!(store.get(h.id), Some(updated));

        assert!(store.delete(h.id).is_some());
        assert!(store.get(h.id).is_none());
        assert!(store.update(h.id, spec("Oromia", 1, false)).is_none());
    }

    #[test]
    fn ids_are_not_reused() {
        let store = HouseholdStore::new(2.75);
        let a = store.create(spec("Afar", 1, false));
        store.delete(a.id);
        assert_eq!(store.create(spec("Afar", 1, false)).id, 2);
    }

    #[test]
    fn analytics_group_by_region() {
        let store = HouseholdStore::new(2.75);
        store.create(spec("Amhara", 4, false));
        store.create(spec("Amhara", 2, false));
        store.create(spec("Tigray", 5, false));
        let a = store.analytics();
        assert_eq!(a.total_households, 3);
        assert_eq!(a.total_population, 11);
        assert_eq!(a.peak_demand_mw, 0.09);
        assert_eq!(
            a.regions["Amhara"],
            RegionTotals {
                households: 2,
                population: 6
            }
        );
    }
}
