// core/src/rollup.rs
use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::types::{ActivitySummary, AthleteProfile, ZonePercentages, ZoneSeconds};
use crate::zones::{HR_ZONE_NAMES, POWER_ZONE_NAMES};

/// Akkumulerte tall for én sporttype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportTypeStats {
    pub count: u32,
    pub total_distance: f64,  // meter
    pub total_duration: f64,  // sek (moving_time)
    pub total_elevation: f64, // meter
    pub hr_zones: ZoneSeconds,
    pub power_zones: ZoneSeconds,

    // --- avledet i andre pass (finalize) ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_elevation: Option<f64>,
    /// Fraværende når total sonetid er 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_zone_percentages: Option<ZonePercentages>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_zone_percentages: Option<ZonePercentages>,
}

impl SportTypeStats {
    fn empty() -> Self {
        Self {
            count: 0,
            total_distance: 0.0,
            total_duration: 0.0,
            total_elevation: 0.0,
            hr_zones: ZoneSeconds::zeroed(HR_ZONE_NAMES),
            power_zones: ZoneSeconds::zeroed(POWER_ZONE_NAMES),
            avg_distance: None,
            avg_duration: None,
            avg_elevation: None,
            hr_zone_percentages: None,
            power_zone_percentages: None,
        }
    }

    fn derive(&mut self) {
        if self.count > 0 {
            let n = self.count as f64;
            self.avg_distance = Some(self.total_distance / n);
            self.avg_duration = Some(self.total_duration / n);
            self.avg_elevation = Some(self.total_elevation / n);
        }
        self.hr_zone_percentages = self.hr_zones.percentages();
        self.power_zone_percentages = self.power_zones.percentages();
    }
}

/// Sporttype → statistikk. Bygges i to pass: `fold` for hver aktivitet,
/// deretter `finalize` som utleder snitt og prosenter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SportRollup {
    pub sports: BTreeMap<String, SportTypeStats>,
}

impl SportRollup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brett inn én aktivitet. Ukjente sonenavn ignoreres (ingen nye bøtter).
    /// Kraftsoner telles bare for kraft-sporttyper i profilen.
    pub fn fold(&mut self, a: &ActivitySummary, profile: &AthleteProfile) {
        let s = self
            .sports
            .entry(a.sport_type.clone())
            .or_insert_with(SportTypeStats::empty);

        s.count += 1;
        s.total_distance += a.distance_m.filter(|v| v.is_finite()).unwrap_or(0.0);
        s.total_duration += a.moving_time_s.filter(|v| v.is_finite()).unwrap_or(0.0);
        s.total_elevation += a.elevation_gain_m.filter(|v| v.is_finite()).unwrap_or(0.0);

        if let Some(z) = &a.hr_zones {
            let ignored = s.hr_zones.merge_known(z);
            if ignored > 0 {
                debug!("activity {}: ignored {} unknown hr zone(s)", a.id, ignored);
            }
        }
        if profile.is_power_sport(&a.sport_type) {
            if let Some(z) = &a.power_zones {
                let ignored = s.power_zones.merge_known(z);
                if ignored > 0 {
                    debug!("activity {}: ignored {} unknown power zone(s)", a.id, ignored);
                }
            }
        }
    }

    /// Andre pass: snitt og prosentfordeling (hoppes over ved total 0).
    pub fn finalize(&mut self) {
        for s in self.sports.values_mut() {
            s.derive();
        }
    }

    /// Brett alle og finaliser.
    pub fn build<'a, I>(activities: I, profile: &AthleteProfile) -> Self
    where
        I: IntoIterator<Item = &'a ActivitySummary>,
    {
        let mut r = Self::new();
        for a in activities {
            r.fold(a, profile);
        }
        r.finalize();
        r
    }

    pub fn get(&self, sport_type: &str) -> Option<&SportTypeStats> {
        self.sports.get(sport_type)
    }

    pub fn sport_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.sports.keys().map(|k| k.as_str())
    }
}
