// core/src/sleep.rs
use std::collections::BTreeMap;
use std::io::Read;

use chrono::{DateTime, FixedOffset, Timelike};
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::metrics::{rate_of_change, RateOfChange};
use crate::stats::{mean, quantile_sorted, sample_std, sorted};
use crate::types::AthleteProfile;

pub const HEART_RATE: &str = "HKQuantityTypeIdentifierHeartRate";
pub const HRV_SDNN: &str = "HKQuantityTypeIdentifierHeartRateVariabilitySDNN";
pub const SLEEP_ANALYSIS: &str = "HKCategoryTypeIdentifierSleepAnalysis";

/// Datoformat i helse-eksporten
pub const HEALTH_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

fn de_health_date<'de, D>(de: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    DateTime::parse_from_str(s.trim(), HEALTH_DATE_FORMAT).map_err(serde::de::Error::custom)
}

/// Én rad i helse-eksporten (puls, HRV eller søvnfase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub record_type: String,
    #[serde(default, rename = "sourceName")]
    pub source_name: Option<String>,
    pub value: String,
    #[serde(rename = "start_date", deserialize_with = "de_health_date")]
    pub start: DateTime<FixedOffset>,
    #[serde(rename = "end_date", deserialize_with = "de_health_date")]
    pub end: DateTime<FixedOffset>,
}

impl HealthRecord {
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// Les eksport-CSV. Ukjente kolonner ignoreres; en rad som ikke kan leses
/// logges og hoppes over.
pub fn read_health_csv<R: Read>(reader: R) -> Result<Vec<HealthRecord>, CoreError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<HealthRecord>().enumerate() {
        match row {
            Ok(r) => out.push(r),
            Err(e) => warn!("health csv row {}: skipped: {}", i + 1, e),
        }
    }
    Ok(out)
}

/// Lesbare navn for søvnfaser; ukjente verdier beholdes som de er.
pub fn sleep_stage_label(raw: &str) -> &str {
    match raw {
        "HKCategoryValueSleepAnalysisAsleepREM" => "REM sleep",
        "HKCategoryValueSleepAnalysisAsleepDeep" => "Deep sleep",
        "HKCategoryValueSleepAnalysisAsleepCore" => "Asleep",
        "HKCategoryValueSleepAnalysisAwake" => "Awake",
        other => other,
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Rapport-typer
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPercentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub hour: u32,
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub std: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variability {
    pub range: f64,
    /// std/mean·100; fraværende når snitt er 0 eller std mangler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficient_of_variation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateNight {
    pub basic: BasicStats,
    pub percentiles: SleepPercentiles,
    pub hourly: Vec<HourlyBucket>,
    pub variability: Variability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_of_change: Option<RateOfChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepReport {
    pub sleep_start: DateTime<FixedOffset>,
    pub sleep_end: DateTime<FixedOffset>,
    pub time_in_bed_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<HeartRateNight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv_sdnn: Option<BasicStats>,
    /// Fase → timer
    pub stage_hours: BTreeMap<String, f64>,
}

pub fn basic_stats(values: &[f64]) -> Option<BasicStats> {
    let xs = sorted(values);
    let n = xs.len();
    if n == 0 {
        return None;
    }
    Some(BasicStats {
        count: n,
        min: xs[0],
        max: xs[n - 1],
        mean: mean(&xs)?,
        median: quantile_sorted(&xs, 0.5)?,
        std: sample_std(&xs),
    })
}

fn overlaps(r: &HealthRecord, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> bool {
    r.end >= start && r.start <= end
}

fn heart_rate_night(records: &[&HealthRecord]) -> Option<HeartRateNight> {
    let mut points: Vec<(DateTime<FixedOffset>, f64)> = records
        .iter()
        .filter_map(|r| r.numeric_value().map(|v| (r.start, v)))
        .collect();
    points.sort_by_key(|(t, _)| *t);

    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let basic = basic_stats(&values)?;

    let xs = sorted(&values);
    let q = |p: f64| quantile_sorted(&xs, p).unwrap_or(basic.min);
    let percentiles = SleepPercentiles {
        p5: q(0.05),
        p25: q(0.25),
        p50: q(0.50),
        p75: q(0.75),
        p95: q(0.95),
    };

    // time på døgnet i postens egen tidssone
    let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (t, v) in &points {
        by_hour.entry(t.hour()).or_default().push(*v);
    }
    let hourly = by_hour
        .into_iter()
        .filter_map(|(hour, vs)| {
            let b = basic_stats(&vs)?;
            Some(HourlyBucket {
                hour,
                count: b.count,
                avg: b.mean,
                min: b.min,
                max: b.max,
                std: b.std,
            })
        })
        .collect();

    let coefficient_of_variation = match basic.std {
        Some(s) if basic.mean != 0.0 => Some(s / basic.mean * 100.0),
        _ => None,
    };
    let variability = Variability {
        range: basic.max - basic.min,
        coefficient_of_variation,
    };

    let t0 = points.first().map(|(t, _)| *t)?;
    let series: Vec<(f64, f64)> = points
        .iter()
        .map(|(t, v)| ((*t - t0).num_milliseconds() as f64 / 1000.0, *v))
        .collect();

    Some(HeartRateNight {
        basic,
        percentiles,
        hourly,
        variability,
        rate_of_change: rate_of_change(&series),
    })
}

/// Analyse av én natt.
///
/// Søvnvinduet er [min start, maks slutt] for søvnposter som starter innenfor
/// [window_start, window_end]. Puls og HRV tas med når posten overlapper
/// søvnvinduet. Ingen søvnposter → None.
pub fn analyze_night(
    records: &[HealthRecord],
    window_start: DateTime<FixedOffset>,
    window_end: DateTime<FixedOffset>,
    profile: &AthleteProfile,
) -> Option<SleepReport> {
    let kept: Vec<&HealthRecord> = records
        .iter()
        .filter(|r| {
            r.source_name
                .as_deref()
                .map_or(true, |s| !profile.excluded_sleep_sources.iter().any(|x| x == s))
        })
        .collect();

    let sleep: Vec<&HealthRecord> = kept
        .iter()
        .copied()
        .filter(|r| r.record_type == SLEEP_ANALYSIS && r.start >= window_start && r.start <= window_end)
        .collect();

    let sleep_start = sleep.iter().map(|r| r.start).min()?;
    let sleep_end = sleep.iter().map(|r| r.end).max()?;

    let hr: Vec<&HealthRecord> = kept
        .iter()
        .copied()
        .filter(|r| r.record_type == HEART_RATE && overlaps(r, sleep_start, sleep_end))
        .collect();
    let hrv: Vec<f64> = kept
        .iter()
        .filter(|r| r.record_type == HRV_SDNN && overlaps(r, sleep_start, sleep_end))
        .filter_map(|r| r.numeric_value())
        .collect();

    let mut stage_hours: BTreeMap<String, f64> = BTreeMap::new();
    for r in &sleep {
        let secs = (r.end - r.start).num_milliseconds() as f64 / 1000.0;
        *stage_hours
            .entry(sleep_stage_label(r.value.trim()).to_string())
            .or_insert(0.0) += secs.max(0.0) / 3600.0;
    }

    info!(
        "sleep: {} stage records, {} hr readings, {} hrv readings",
        sleep.len(),
        hr.len(),
        hrv.len()
    );

    Some(SleepReport {
        sleep_start,
        sleep_end,
        time_in_bed_hours: (sleep_end - sleep_start).num_milliseconds() as f64 / 3_600_000.0,
        heart_rate: heart_rate_night(&hr),
        hrv_sdnn: basic_stats(&hrv),
        stage_hours,
    })
}
