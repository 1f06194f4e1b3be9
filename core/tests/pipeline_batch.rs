// tests/pipeline_batch.rs
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use zoneplan_core::prompt::{build_prompt, UpcomingEvent};
use zoneplan_core::{
    analyze_activities_json, analyze_batch, extract_plan_json, load_export_dir, load_profile,
    plan_from_recommendation, run_coaching, save_profile, time_in_zones_json, ActivityInput,
    AthleteProfile, CoreError, SkipScope, StaticCoachProvider, Telemetry,
};
use zoneplan_core::cli::{format_rollup_report, print_rollup_report};
use zoneplan_core::coach::CoachProvider;
use zoneplan_core::prompt::CoachPrompt;

fn ride(id: u64) -> ActivityInput {
    let n = 120;
    let time: Vec<u64> = (0..n).collect();
    let hr: Vec<f64> = (0..n).map(|i| if i < 60 { 120.0 } else { 160.0 }).collect();
    let watts: Vec<f64> = (0..n).map(|i| if i < 60 { 150.0 } else { 300.0 }).collect();
    ActivityInput {
        record: json!({
            "id": id,
            "name": "Morning Ride",
            "sport_type": "Ride",
            "start_date": "2025-03-23T07:00:00Z",
            "distance": 40000.0,
            "moving_time": 3600,
            "total_elevation_gain": 350.0,
            "average_speed": 11.1,
            "average_watts": 225.0
        }),
        streams: Some(json!({
            "time": {"data": time},
            "heartrate": {"data": hr},
            "watts": {"data": watts}
        })),
    }
}

fn run(id: &str) -> ActivityInput {
    ActivityInput {
        record: json!({
            "id": id,
            "sport_type": "Run",
            "start_date": "2025-03-22T17:30:00Z",
            "distance": 10000.0,
            "moving_time": 3000
        }),
        streams: Some(json!({
            "time": [0, 10, 20, 30],
            "heartrate": [110, 140, 140, null],
            "watts": [200, 210, 220, 230]
        })),
    }
}

#[test]
fn batch_isolates_broken_activities() {
    let inputs = vec![
        ride(1),
        ActivityInput {
            record: json!({"id": 2, "sport_type": "Ride", "moving_time": "an hour"}),
            streams: None,
        },
        ActivityInput {
            record: json!({"id": 3, "sport_type": "Run", "distance": 5000.0, "moving_time": 1500}),
            streams: Some(json!({"time": [0, 1, 2], "heartrate": [100, 101]})),
        },
        run("r4"),
    ];
    let profile = AthleteProfile::default();
    let telemetry = Telemetry::new().unwrap();
    let report = analyze_batch(&inputs, &profile, &telemetry).unwrap();

    // post 2 er uleselig; post 3 beholdes uten strømdata
    let ids: Vec<&str> = report.summaries.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3", "r4"]);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].activity_id, "2");
    assert_eq!(report.skipped[0].scope, SkipScope::Activity);
    assert!(report.skipped[0].reason.contains("moving_time"));
    assert_eq!(report.skipped[1].activity_id, "3");
    assert_eq!(report.skipped[1].scope, SkipScope::Streams);

    let three = &report.summaries[1];
    assert_eq!(three.pace_formatted.as_deref(), Some("5:00"));
    assert!(three.hr_zones.is_none());

    assert_eq!(telemetry.activities_processed.get(), 3);
    assert_eq!(telemetry.activities_skipped.get(), 2);
    // ride: hr + watt, run: bare hr
    assert_eq!(telemetry.zone_streams.get(), 3);
}

#[test]
fn ride_summary_and_rollup() {
    let profile = AthleteProfile::default();
    let telemetry = Telemetry::new().unwrap();
    let report = analyze_batch(&[ride(1), ride(2), run("r3")], &profile, &telemetry).unwrap();

    let r = &report.summaries[0];
    assert!((r.avg_speed_kmh.unwrap() - 39.96).abs() < 1e-9);
    assert_eq!(r.distance_km, Some(40.0));
    assert_eq!(r.sample_interval_s, Some(1.0));

    let hr = r.hr_zones.as_ref().unwrap();
    assert_eq!(hr.get("Zone 2 (Endurance)"), Some(60.0));
    assert_eq!(hr.get("Zone 4 (Threshold)"), Some(60.0));
    let pz = r.power_zones.as_ref().unwrap();
    // FTP 330: 150 W → Z1 [0,181), 300 W → Z4 [297,346)
    assert_eq!(pz.get("Zone 1 (Active Recovery)"), Some(60.0));
    assert_eq!(pz.get("Zone 4 (Threshold)"), Some(60.0));
    let np = r.stream_stats.as_ref().unwrap().power.as_ref().unwrap().normalized_power.unwrap();
    assert!(np > 225.0);
    assert!((r.intensity_factor.unwrap() - np / 330.0).abs() < 1e-12);
    assert!((r.variability_index.unwrap() - np / 225.0).abs() < 1e-12);

    // løp har wattstrøm, men er ikke en kraft-sport
    let run = &report.summaries[2];
    assert!(run.power_zones.is_none());
    assert_eq!(run.pace_formatted.as_deref(), Some("5:00"));
    let run_hr = run.hr_zones.as_ref().unwrap();
    assert_eq!(run_hr.get("Zone 1 (Recovery)"), Some(10.0));
    assert_eq!(run_hr.get("Zone 3 (Tempo)"), Some(20.0));
    assert_eq!(run_hr.total(), 30.0);

    let rides = report.rollup.get("Ride").unwrap();
    assert_eq!(rides.count, 2);
    assert_eq!(rides.total_distance, 80_000.0);
    assert_eq!(rides.avg_distance, Some(40_000.0));
    assert_eq!(rides.hr_zones.get("Zone 2 (Endurance)"), Some(120.0));
    let pct = rides.hr_zone_percentages.as_ref().unwrap();
    assert_eq!(pct.get("Zone 2 (Endurance)"), Some(50.0));
    assert_eq!(pct.get("Zone 5 (VO2 Max)"), Some(0.0));

    let runs = report.rollup.get("Run").unwrap();
    assert_eq!(runs.power_zones.total(), 0.0);
    assert!(runs.power_zone_percentages.is_none());

    assert_eq!(report.rollup.sport_types().collect::<Vec<_>>(), vec!["Ride", "Run"]);

    let txt = format_rollup_report(&report.rollup);
    assert!(txt.contains("Ride:"));
    assert!(txt.contains("Activities: 2"));
    assert!(txt.contains("Total distance: 80.0 km"));
    assert!(txt.find("Ride:") < txt.find("Run:"));
    print_rollup_report(&report.rollup);
}

#[test]
fn plan_bundle_counts_parsed_and_fallback() {
    let profile = AthleteProfile::default();
    let telemetry = Telemetry::new().unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
    let stamp = Utc.with_ymd_and_hms(2025, 3, 24, 6, 0, 0).unwrap();

    let text = "4-Week Training Plan\n\
[DATE: 2025-03-25] Easy Run | DURATION: 45 min | DESCRIPTION: zone 2\n\
[DATE: 2025-03-26] Intervals | DURATION: 60 min | DESCRIPTION: 6x400m\n";
    let b = plan_from_recommendation(text, today, &profile, &telemetry, stamp);
    assert!(!b.extraction.is_fallback());
    assert_eq!(b.events.len(), 2);
    assert_eq!(b.csv_rows.len(), 2);
    assert_eq!(b.ics.matches("BEGIN:VEVENT").count(), 2);

    let fb = plan_from_recommendation("nothing useful", today, &profile, &telemetry, stamp);
    assert!(fb.extraction.is_fallback());
    assert_eq!(fb.events.len(), 28);

    assert_eq!(telemetry.plan_entries_parsed.get(), 2);
    assert_eq!(telemetry.plan_fallback.get(), 1);
    let metrics = telemetry.render().unwrap();
    assert!(metrics.contains("zoneplan_plan_entries_parsed_total 2"));
}

struct FailingCoach;

impl CoachProvider for FailingCoach {
    fn recommend(&self, _prompt: &CoachPrompt) -> Result<String, CoreError> {
        Err(CoreError::Coach("HTTP 503".into()))
    }
}

#[test]
fn coaching_with_static_provider() {
    let profile = AthleteProfile::default();
    let telemetry = Telemetry::new().unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
    let report = analyze_batch(&[ride(1), run("r2")], &profile, &telemetry).unwrap();
    let events = vec![UpcomingEvent {
        name: "Spring Half Marathon".into(),
        date: NaiveDate::from_ymd_opt(2025, 4, 20).unwrap(),
    }];
    let prompt = build_prompt(None, &report.summaries, &events, today, &profile);
    assert!(prompt.user.contains("4-Week Training Plan"));
    assert!(prompt.user.contains("Spring Half Marathon on April 20, 2025 (in 27 days)"));
    assert!(prompt.user.contains("[DATE: 2025-03-25] Easy Run"));

    let coach = StaticCoachProvider::new(
        "## 4-Week Training Plan\n[DATE: 2025-03-25] Recovery Spin | DURATION: 40 min | DESCRIPTION: easy",
    );
    let (text, bundle) = run_coaching(&coach, &prompt, today, &profile, &telemetry).unwrap();
    assert!(text.contains("Recovery Spin"));
    assert_eq!(bundle.extraction.workouts[0].title, "Recovery Spin");
    assert_eq!(bundle.csv_rows[0].end_time, "07:40 AM");

    let err = run_coaching(&FailingCoach, &prompt, today, &profile, &telemetry).unwrap_err();
    assert!(matches!(err, CoreError::Coach(_)));
}

#[test]
fn prompt_only_includes_recent_activities() {
    let profile = AthleteProfile::default();
    let telemetry = Telemetry::new().unwrap();
    let mut old = run("old");
    old.record["start_date"] = json!("2025-03-01T08:00:00Z");
    let report = analyze_batch(&[run("new"), old], &profile, &telemetry).unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
    let recent = zoneplan_core::prompt::recent_activities(&report.summaries, today);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, "new");
}

#[test]
fn json_facade() {
    let out = time_in_zones_json(
        r#"{"metric": "heart_rate", "reference": 190,
            "samples": [{"t":0,"value":100},{"t":60,"value":150},{"t":120,"value":null},{"t":180,"value":120}]}"#,
    )
    .unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["Zone 1 (Recovery)"], json!(60.0));
    assert_eq!(v["Zone 3 (Tempo)"], json!(60.0));

    let bad = time_in_zones_json(r#"{"metric": "heart_rate", "samples": [{"t": "x"}]}"#).unwrap_err();
    assert!(bad.to_string().contains("samples[0].t"));

    let payload = json!({"activities": [ride(7), run("r8")]}).to_string();
    let report: Value = serde_json::from_str(&analyze_activities_json(&payload).unwrap()).unwrap();
    assert_eq!(report["summaries"].as_array().unwrap().len(), 2);
    assert_eq!(report["rollup"]["sports"]["Ride"]["count"], json!(1));

    let plan: Value = serde_json::from_str(
        &extract_plan_json(r#"{"text": "no plan", "today": "2025-03-24"}"#).unwrap(),
    )
    .unwrap();
    assert_eq!(plan["extraction"]["source"]["kind"], json!("fallback"));
    assert_eq!(plan["extraction"]["source"]["reason"], json!("section_not_found"));
    assert_eq!(plan["csv_rows"].as_array().unwrap().len(), 28);
}

#[test]
fn export_dir_and_profile_round_trip() {
    let dir = std::env::temp_dir().join(format!("zoneplan_export_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    let r = ride(42);
    std::fs::write(
        dir.join("activities.json"),
        json!([r.record, {"id": 43, "sport_type": "Walk"}]).to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("activity_42_streams.json"), r.streams.unwrap().to_string()).unwrap();

    let inputs = load_export_dir(&dir).unwrap();
    assert_eq!(inputs.len(), 2);
    assert!(inputs[0].streams.is_some());
    assert!(inputs[1].streams.is_none());

    // profil: mangler → default, så lagre og les tilbake
    let path = dir.join("profile.json");
    assert_eq!(load_profile(&path).unwrap(), AthleteProfile::default());
    let profile = AthleteProfile {
        max_hr: 182.0,
        ftp: 280.0,
        ..AthleteProfile::default()
    };
    save_profile(&profile, &path).unwrap();
    assert_eq!(load_profile(&path).unwrap(), profile);

    // delvis profil fyller inn standardverdier
    std::fs::write(&path, r#"{"ftp": 250}"#).unwrap();
    let partial = load_profile(&path).unwrap();
    assert_eq!(partial.ftp, 250.0);
    assert_eq!(partial.max_hr, 190.0);

    assert!(load_export_dir(dir.join("missing")).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
