// core/src/lib.rs
pub mod activity;
pub mod aggregate;
pub mod calendar;
pub mod cli;
pub mod coach;
pub mod coach_api;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod plan;
pub mod prompt;
pub mod rollup;
pub mod sleep;
pub mod stats;
pub mod storage;
pub mod streams;
pub mod telemetry;
pub mod types;
pub mod zones;

#[cfg(feature = "python")]
mod py;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

pub use crate::activity::{summarize_activity, SkipScope, SkippedItem, ZoneContext};
pub use crate::aggregate::{time_in_zones, time_in_zones_for_stream};
pub use crate::calendar::{render_ics, schedule, to_csv_rows, to_ics, write_csv, CalendarEvent, CsvRow};
pub use crate::coach::{CoachConfig, CoachProvider, StaticCoachProvider};
pub use crate::coach_api::ChatCompletionsClient;
pub use crate::error::{CoreError, CoreResult};
pub use crate::metrics::{normalized_power, rate_of_change, RateOfChange};
pub use crate::models::{ActivityRecord, Sample, WorkoutEntry};
pub use crate::pipeline::{
    analyze_batch, load_export_dir, plan_from_recommendation, run_coaching, ActivityInput,
    AnalysisReport, PlanBundle,
};
pub use crate::plan::{extract_plan, fallback_plan, PlanExtraction, PlanSource};
pub use crate::rollup::{SportRollup, SportTypeStats};
pub use crate::storage::{load_profile, save_json, save_profile};
pub use crate::streams::StreamTable;
pub use crate::telemetry::Telemetry;
pub use crate::types::{ActivitySummary, AthleteProfile, ZoneMap, ZonePercentages, ZoneSeconds};
pub use crate::zones::{ZoneMetric, ZoneTable};

// ──────────────────────────────────────────────────────────────────────────────
// JSON-fasade (brukes av py-modulen og av andre språk via streng inn/ut)
// ──────────────────────────────────────────────────────────────────────────────

fn from_json_str<T: serde::de::DeserializeOwned>(json_in: &str) -> CoreResult<T> {
    let mut de = serde_json::Deserializer::from_str(json_in);
    Ok(serde_path_to_error::deserialize(&mut de)?)
}

#[derive(Debug, Deserialize)]
struct TimeInZonesIn {
    metric: ZoneMetric,
    /// makspuls / FTP; mangler → profilens standardverdi
    #[serde(default)]
    reference: Option<f64>,
    samples: Vec<Sample>,
}

/// `{"metric": "heart_rate"|"power", "reference": 190, "samples": [{"t":0,"value":100}, ...]}`
/// → sonekart som JSON-objekt.
pub fn time_in_zones_json(json_in: &str) -> CoreResult<String> {
    let input: TimeInZonesIn = from_json_str(json_in)?;
    let defaults = AthleteProfile::default();
    let table = match input.metric {
        ZoneMetric::HeartRate => ZoneTable::heart_rate(input.reference.unwrap_or(defaults.max_hr))?,
        ZoneMetric::Power => ZoneTable::power(input.reference.unwrap_or(defaults.ftp))?,
    };
    let zones = time_in_zones(&input.samples, &table)?;
    Ok(serde_json::to_string(&zones)?)
}

#[derive(Debug, Deserialize)]
struct AnalyzeIn {
    #[serde(default)]
    profile: AthleteProfile,
    activities: Vec<ActivityInput>,
}

/// `{"profile": {...}?, "activities": [{"record": {...}, "streams": {...}?}]}`
/// → `AnalysisReport` som JSON.
pub fn analyze_activities_json(json_in: &str) -> CoreResult<String> {
    let input: AnalyzeIn = from_json_str(json_in)?;
    let telemetry = Telemetry::new()?;
    let report = analyze_batch(&input.activities, &input.profile, &telemetry)?;
    Ok(serde_json::to_string(&report)?)
}

#[derive(Debug, Deserialize)]
struct ExtractPlanIn {
    text: String,
    today: NaiveDate,
    #[serde(default)]
    profile: AthleteProfile,
}

/// `{"text": "...", "today": "2025-03-24", "profile": {...}?}` → `PlanBundle` som JSON.
pub fn extract_plan_json(json_in: &str) -> CoreResult<String> {
    let input: ExtractPlanIn = from_json_str(json_in)?;
    let telemetry = Telemetry::new()?;
    let bundle = plan_from_recommendation(
        &input.text,
        input.today,
        &input.profile,
        &telemetry,
        Utc::now(),
    );
    Ok(serde_json::to_string(&bundle)?)
}
