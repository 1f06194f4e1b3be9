// core/src/zones.rs
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ZoneMap;

/// Brøker av makspuls: Z1..Z5 nedre grenser + øvre grense for Z5
pub const HR_ZONE_FRACTIONS: [f64; 6] = [0.0, 0.6, 0.7, 0.8, 0.9, 1.0];
pub const HR_ZONE_NAMES: [&str; 5] = [
    "Zone 1 (Recovery)",
    "Zone 2 (Endurance)",
    "Zone 3 (Tempo)",
    "Zone 4 (Threshold)",
    "Zone 5 (VO2 Max)",
];

/// Brøker av FTP (Coggan), siste grense er åpen
pub const POWER_ZONE_FRACTIONS: [f64; 8] = [0.0, 0.55, 0.75, 0.9, 1.05, 1.2, 1.5, f64::INFINITY];
pub const POWER_ZONE_NAMES: [&str; 7] = [
    "Zone 1 (Active Recovery)",
    "Zone 2 (Endurance)",
    "Zone 3 (Tempo)",
    "Zone 4 (Threshold)",
    "Zone 5 (VO2 Max)",
    "Zone 6 (Anaerobic)",
    "Zone 7 (Neuromuscular)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneMetric {
    HeartRate,
    Power,
}

/// Halvåpent bånd [lower, upper)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBand {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

/// Resultat av klassifisering av én verdi.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    Zone(&'a str),
    /// Under første bånd: teller ikke
    Unclassified,
    /// Manglende verdi: hoppes over av kaller
    Skipped,
}

/// Ordnet, sammenhengende sonetabell. Siste bånd er åpent oppover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTable {
    metric: ZoneMetric,
    bands: Vec<ZoneBand>,
}

impl ZoneTable {
    /// Valider rekkefølge og kontinuitet (upper[i] == lower[i+1]).
    pub fn new(metric: ZoneMetric, bands: Vec<ZoneBand>) -> Result<Self, CoreError> {
        if bands.is_empty() {
            return Err(CoreError::InvalidZoneTable("no bands".into()));
        }
        for (i, b) in bands.iter().enumerate() {
            if b.lower.is_nan() || b.upper.is_nan() || b.lower > b.upper {
                return Err(CoreError::InvalidZoneTable(format!(
                    "band '{}' has invalid bounds [{}, {})",
                    b.name, b.lower, b.upper
                )));
            }
            if let Some(next) = bands.get(i + 1) {
                if b.upper != next.lower {
                    return Err(CoreError::InvalidZoneTable(format!(
                        "gap or overlap between '{}' (upper {}) and '{}' (lower {})",
                        b.name, b.upper, next.name, next.lower
                    )));
                }
            }
            if bands[..i].iter().any(|o| o.name == b.name) {
                return Err(CoreError::InvalidZoneTable(format!(
                    "duplicate zone name '{}'",
                    b.name
                )));
            }
        }
        Ok(Self { metric, bands })
    }

    /// Grenser = floor(brøk × referanse), samme heltallsgrenser som eksporten bruker.
    fn from_fractions(
        metric: ZoneMetric,
        names: &[&str],
        fractions: &[f64],
        reference: f64,
    ) -> Result<Self, CoreError> {
        if !(reference.is_finite() && reference > 0.0) {
            return Err(CoreError::InvalidZoneTable(format!(
                "reference value must be positive, got {reference}"
            )));
        }
        let bound = |f: f64| if f.is_finite() { (f * reference).floor() } else { f64::INFINITY };
        let bands = names
            .iter()
            .enumerate()
            .map(|(i, name)| ZoneBand {
                name: (*name).to_string(),
                lower: bound(fractions[i]),
                upper: bound(fractions[i + 1]),
            })
            .collect();
        Self::new(metric, bands)
    }

    pub fn heart_rate(max_hr: f64) -> Result<Self, CoreError> {
        Self::from_fractions(ZoneMetric::HeartRate, &HR_ZONE_NAMES, &HR_ZONE_FRACTIONS, max_hr)
    }

    pub fn power(ftp: f64) -> Result<Self, CoreError> {
        Self::from_fractions(ZoneMetric::Power, &POWER_ZONE_NAMES, &POWER_ZONE_FRACTIONS, ftp)
    }

    pub fn metric(&self) -> ZoneMetric {
        self.metric
    }

    pub fn bands(&self) -> &[ZoneBand] {
        &self.bands
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.bands.iter().map(|b| b.name.as_str())
    }

    /// Nullstilt varighetskart med tabellens soner
    pub fn empty_durations(&self) -> ZoneMap {
        ZoneMap::zeroed(self.names())
    }

    /// Første bånd med lower ≤ v < upper; siste bånd behandles som [lower, ∞).
    pub fn classify(&self, value: Option<f64>) -> Classification<'_> {
        let v = match value {
            Some(v) if !v.is_nan() => v,
            _ => return Classification::Skipped,
        };
        let last = self.bands.len() - 1;
        for (i, b) in self.bands.iter().enumerate() {
            let upper = if i == last { f64::INFINITY } else { b.upper };
            if b.lower <= v && v < upper {
                return Classification::Zone(&b.name);
            }
        }
        Classification::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hr_table_from_max_190() {
        let t = ZoneTable::heart_rate(190.0).unwrap();
        let bounds: Vec<(f64, f64)> = t.bands().iter().map(|b| (b.lower, b.upper)).collect();
        assert_eq!(
            bounds,
            vec![(0.0, 114.0), (114.0, 133.0), (133.0, 152.0), (152.0, 171.0), (171.0, 190.0)]
        );
    }

    #[test]
    fn last_band_is_unbounded() {
        let t = ZoneTable::heart_rate(190.0).unwrap();
        assert_eq!(t.classify(Some(250.0)), Classification::Zone("Zone 5 (VO2 Max)"));
        let p = ZoneTable::power(330.0).unwrap();
        assert_eq!(p.classify(Some(2000.0)), Classification::Zone("Zone 7 (Neuromuscular)"));
    }

    #[test]
    fn null_and_negative_values() {
        let t = ZoneTable::heart_rate(190.0).unwrap();
        assert_eq!(t.classify(None), Classification::Skipped);
        assert_eq!(t.classify(Some(f64::NAN)), Classification::Skipped);
        assert_eq!(t.classify(Some(-1.0)), Classification::Unclassified);
        assert_eq!(t.classify(Some(0.0)), Classification::Zone("Zone 1 (Recovery)"));
    }

    #[test]
    fn rejects_gaps_and_bad_reference() {
        let bands = vec![
            ZoneBand { name: "a".into(), lower: 0.0, upper: 10.0 },
            ZoneBand { name: "b".into(), lower: 11.0, upper: 20.0 },
        ];
        assert!(ZoneTable::new(ZoneMetric::Power, bands).is_err());
        assert!(ZoneTable::heart_rate(0.0).is_err());
        assert!(ZoneTable::power(f64::NAN).is_err());
    }
}
