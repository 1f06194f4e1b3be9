// core/src/pipeline.rs
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::activity::{parse_activity_record, summarize_activity, SkipScope, SkippedItem, ZoneContext};
use crate::calendar::{render_ics, to_csv_rows, to_ics, CalendarEvent, CsvRow};
use crate::coach::CoachProvider;
use crate::error::CoreError;
use crate::plan::{extract_plan, PlanExtraction};
use crate::prompt::CoachPrompt;
use crate::rollup::SportRollup;
use crate::streams::StreamTable;
use crate::telemetry::Telemetry;
use crate::types::{ActivitySummary, AthleteProfile};

/// Én aktivitet slik den kommer fra eksporten: rå post + valgfri strømtabell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityInput {
    pub record: Value,
    #[serde(default)]
    pub streams: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summaries: Vec<ActivitySummary>,
    pub rollup: SportRollup,
    pub skipped: Vec<SkippedItem>,
}

// id for feilrapport før posten er lest
fn raw_id(v: &Value) -> String {
    match v.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "<unknown>".to_string(),
    }
}

/// Analyser en batch. Én ødelagt aktivitet stopper aldri resten; den
/// havner i `skipped`. Feil i profilen (ugyldig sonetabell) er fatal.
pub fn analyze_batch(
    inputs: &[ActivityInput],
    profile: &AthleteProfile,
    telemetry: &Telemetry,
) -> Result<AnalysisReport, CoreError> {
    let ctx = ZoneContext::from_profile(profile)?;
    let mut summaries = Vec::with_capacity(inputs.len());
    let mut skipped = Vec::new();

    for input in inputs {
        // 1️⃣ Post
        let record = match parse_activity_record(&input.record) {
            Ok(r) => r,
            Err(e) => {
                let id = raw_id(&input.record);
                warn!("activity {}: skipped: {}", id, e);
                skipped.push(SkippedItem::new(id, SkipScope::Activity, &e));
                telemetry.activities_skipped.inc();
                continue;
            }
        };

        // 2️⃣ Strøm (ødelagt → aktiviteten beholdes uten strømdata)
        let stream = match input.streams.as_ref().map(StreamTable::from_json) {
            None => None,
            Some(Ok(st)) => Some(st),
            Some(Err(e)) => {
                warn!("activity {}: skipping streams: {}", record.id, e);
                skipped.push(SkippedItem::new(&record.id, SkipScope::Streams, &e));
                telemetry.activities_skipped.inc();
                None
            }
        };

        // 3️⃣ Sammendrag
        let out = summarize_activity(&record, stream.as_ref(), &ctx);
        let zone_streams = out.summary.hr_zones.is_some() as u64
            + out.summary.power_zones.is_some() as u64;
        telemetry.zone_streams.inc_by(zone_streams);
        telemetry.activities_skipped.inc_by(out.skipped.len() as u64);
        telemetry.activities_processed.inc();

        skipped.extend(out.skipped);
        summaries.push(out.summary);
    }

    let rollup = SportRollup::build(&summaries, profile);
    info!(
        "analyzed {} activities ({} sport types, {} skipped items)",
        summaries.len(),
        rollup.sports.len(),
        skipped.len()
    );

    Ok(AnalysisReport {
        summaries,
        rollup,
        skipped,
    })
}

/// Plan + kalender fra én coach-tekst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanBundle {
    pub extraction: PlanExtraction,
    pub events: Vec<CalendarEvent>,
    pub ics: String,
    pub csv_rows: Vec<CsvRow>,
}

pub fn plan_from_recommendation(
    text: &str,
    today: NaiveDate,
    profile: &AthleteProfile,
    telemetry: &Telemetry,
    stamp: DateTime<Utc>,
) -> PlanBundle {
    let extraction = extract_plan(text, &profile.plan_heading, today);
    if extraction.is_fallback() {
        telemetry.plan_fallback.inc();
    } else {
        telemetry
            .plan_entries_parsed
            .inc_by(extraction.workouts.len() as u64);
    }

    let events = to_ics(&extraction.workouts);
    let ics = render_ics(&events, stamp);
    let csv_rows = to_csv_rows(&extraction.workouts);

    PlanBundle {
        extraction,
        events,
        ics,
        csv_rows,
    }
}

/// Coach-tekst + plan. Feil fra tjenesten propageres; en tekst uten
/// gyldig plan gir reserveplanen.
pub fn run_coaching<P: CoachProvider + ?Sized>(
    provider: &P,
    prompt: &CoachPrompt,
    today: NaiveDate,
    profile: &AthleteProfile,
    telemetry: &Telemetry,
) -> Result<(String, PlanBundle), CoreError> {
    let text = provider.recommend(prompt)?;
    let bundle = plan_from_recommendation(&text, today, profile, telemetry, Utc::now());
    Ok((text, bundle))
}

// ──────────────────────────────────────────────────────────────────────────────
// Eksportkatalog
// ──────────────────────────────────────────────────────────────────────────────

pub const ACTIVITIES_FILE: &str = "activities.json";

pub fn streams_file_name(id: &str) -> String {
    format!("activity_{id}_streams.json")
}

/// Les `activities.json` (liste av poster) og tilhørende
/// `activity_<id>_streams.json` der de finnes.
pub fn load_export_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Vec<ActivityInput>> {
    let dir = dir.as_ref();
    let path = dir.join(ACTIVITIES_FILE);
    let txt = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<Value> = serde_json::from_str(&txt)
        .with_context(|| format!("parsing {}", path.display()))?;

    let mut inputs = Vec::with_capacity(records.len());
    for record in records {
        let stream_path = dir.join(streams_file_name(&raw_id(&record)));
        let streams = if stream_path.exists() {
            let s = std::fs::read_to_string(&stream_path)
                .with_context(|| format!("reading {}", stream_path.display()))?;
            Some(
                serde_json::from_str::<Value>(&s)
                    .with_context(|| format!("parsing {}", stream_path.display()))?,
            )
        } else {
            None
        };
        inputs.push(ActivityInput { record, streams });
    }

    info!("📂 {} activities loaded from {}", inputs.len(), dir.display());
    Ok(inputs)
}
