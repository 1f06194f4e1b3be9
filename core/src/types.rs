use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ──────────────────────────────────────────────────────────────────────────────
// Utøverprofil (konfig)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AthleteProfile {
    pub max_hr: f64,
    pub ftp: f64,
    /// Sporttyper som får kraftsoner (aggregering og rollup)
    pub power_sport_types: Vec<String>,
    /// Sporttyper som får tempo (min/km)
    pub pace_sport_types: Vec<String>,
    /// Overskriften planen letes etter i coach-teksten
    pub plan_heading: String,
    /// Kilder i helse-eksporten som ignoreres
    pub excluded_sleep_sources: Vec<String>,
}

impl Default for AthleteProfile {
    fn default() -> Self {
        Self {
            max_hr: 190.0,
            ftp: 330.0,
            power_sport_types: vec!["Ride".into(), "VirtualRide".into()],
            pace_sport_types: vec!["Run".into(), "Swim".into()],
            plan_heading: "4-Week Training Plan".into(),
            excluded_sleep_sources: vec!["AutoSleep".into()],
        }
    }
}

impl AthleteProfile {
    pub fn is_power_sport(&self, sport_type: &str) -> bool {
        self.power_sport_types.iter().any(|s| s == sport_type)
    }

    pub fn is_pace_sport(&self, sport_type: &str) -> bool {
        self.pace_sport_types.iter().any(|s| s == sport_type)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// ZoneMap – ordnet sone → verdi (sekunder eller prosent)
// ──────────────────────────────────────────────────────────────────────────────

/// Sonenavn → verdi, i sonetabellens rekkefølge.
/// Serialiseres som et vanlig JSON-objekt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZoneMap {
    entries: Vec<(String, f64)>,
}

impl ZoneMap {
    /// Alle navn med 0.0
    pub fn zeroed<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            entries: names.into_iter().map(|n| (n.to_string(), 0.0)).collect(),
        }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut m = ZoneMap::default();
        for (k, v) in pairs {
            let k = k.into();
            match m.entries.iter_mut().find(|(n, _)| *n == k) {
                Some(e) => e.1 += v,
                None => m.entries.push((k, v)),
            }
        }
        m
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Legg til på en eksisterende sone. Ukjent navn → false, ingen ny bøtte.
    pub fn add(&mut self, name: &str, value: f64) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(e) => {
                e.1 += value;
                true
            }
            None => false,
        }
    }

    /// Summer inn `other` på kjente soner; returnerer antall ignorerte navn.
    pub fn merge_known(&mut self, other: &ZoneMap) -> usize {
        let mut ignored = 0;
        for (name, v) in other.iter() {
            if !self.add(name, v) {
                ignored += 1;
            }
        }
        ignored
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| *v).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Prosentfordeling: 100 * verdi / total.
    /// Total 0 (eller ikke-finitt) → None, aldri NaN. Soner med 0 s beholdes som 0.0.
    pub fn percentages(&self) -> Option<ZoneMap> {
        let total = self.total();
        if !(total.is_finite() && total > 0.0) {
            return None;
        }
        Some(ZoneMap {
            entries: self
                .entries
                .iter()
                .map(|(n, v)| (n.clone(), 100.0 * v / total))
                .collect(),
        })
    }
}

impl Serialize for ZoneMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ZoneMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ZoneMapVisitor;

        impl<'de> Visitor<'de> for ZoneMapVisitor {
            type Value = ZoneMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of zone name to number")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ZoneMap, A::Error> {
                let mut pairs: Vec<(String, f64)> = Vec::new();
                // null-verdier i eldre eksport tolkes som 0
                while let Some((k, v)) = access.next_entry::<String, Option<f64>>()? {
                    pairs.push((k, v.unwrap_or(0.0)));
                }
                Ok(ZoneMap::from_pairs(pairs))
            }
        }

        deserializer.deserialize_map(ZoneMapVisitor)
    }
}

pub type ZoneSeconds = ZoneMap;
pub type ZonePercentages = ZoneMap;

// ──────────────────────────────────────────────────────────────────────────────
// Strømstatistikk
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p10: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
}

/// Fordelingsstatistikk for én strøm (null-verdier fjernet).
/// `std` er utvalgsstandardavvik (n-1), None for ett enkelt punkt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: Option<f64>,
    pub percentiles: Percentiles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerStats {
    #[serde(flatten)]
    pub distribution: Distribution,
    /// Utelatt ved færre enn 30 punkter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_power: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartrate: Option<Distribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<PowerStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<Distribution>,
}

impl StreamStats {
    pub fn is_empty(&self) -> bool {
        self.heartrate.is_none() && self.power.is_none() && self.speed.is_none()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Aktivitetssammendrag
// ──────────────────────────────────────────────────────────────────────────────

/// Én aktivitet etter aggregering. Bygges én gang, muteres ikke etterpå.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sport_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,

    pub distance_m: Option<f64>,
    pub moving_time_s: Option<f64>,
    pub elevation_gain_m: Option<f64>,
    pub distance_km: Option<f64>,
    pub moving_time_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace_min_per_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace_formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_speed_kmh: Option<f64>,

    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
    pub average_watts: Option<f64>,
    pub weighted_average_watts: Option<f64>,

    /// Snitt Δt i strømmen (sek)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_interval_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_stats: Option<StreamStats>,

    /// None = metrikken finnes ikke i strømmen (ikke det samme som alle nuller)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_zones: Option<ZoneSeconds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_zones: Option<ZoneSeconds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_zone_percentages: Option<ZonePercentages>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_zone_percentages: Option<ZonePercentages>,

    /// IF = NP/FTP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity_factor: Option<f64>,
    /// VI = NP/AvgPower
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variability_index: Option<f64>,
}
