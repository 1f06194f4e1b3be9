// core/src/activity.rs
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::time_in_zones_for_stream;
use crate::error::CoreError;
use crate::metrics::{intensity_factor, variability_index};
use crate::models::ActivityRecord;
use crate::stats::stream_stats;
use crate::streams::StreamTable;
use crate::types::{ActivitySummary, AthleteProfile, StreamStats, ZoneSeconds};
use crate::zones::ZoneTable;

/// Hva som ble hoppet over for en aktivitet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipScope {
    /// Posten kunne ikke leses; hele aktiviteten utelatt
    Activity,
    /// Strømtabellen er ødelagt; post-nivå tall beholdes
    Streams,
    HeartRate,
    Power,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub activity_id: String,
    pub scope: SkipScope,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(activity_id: impl Into<String>, scope: SkipScope, err: &CoreError) -> Self {
        Self {
            activity_id: activity_id.into(),
            scope,
            reason: err.to_string(),
        }
    }
}

/// Sonetabeller utledet fra profilen, bygget én gang per batch.
#[derive(Debug, Clone)]
pub struct ZoneContext {
    pub profile: AthleteProfile,
    pub hr: ZoneTable,
    pub power: ZoneTable,
}

impl ZoneContext {
    pub fn from_profile(profile: &AthleteProfile) -> Result<Self, CoreError> {
        Ok(Self {
            profile: profile.clone(),
            hr: ZoneTable::heart_rate(profile.max_hr)?,
            power: ZoneTable::power(profile.ftp)?,
        })
    }
}

/// Les én rå post med sti i feilmeldingen (f.eks. `moving_time`).
pub fn parse_activity_record(v: &Value) -> Result<ActivityRecord, CoreError> {
    let txt = v.to_string();
    let mut de = serde_json::Deserializer::from_str(&txt);
    Ok(serde_path_to_error::deserialize(&mut de)?)
}

/// Resultat for én aktivitet: sammendrag + det som måtte hoppes over.
#[derive(Debug, Clone)]
pub struct ActivityOutcome {
    pub summary: ActivitySummary,
    pub skipped: Vec<SkippedItem>,
}

fn positive(x: Option<f64>) -> Option<f64> {
    x.filter(|v| v.is_finite() && *v > 0.0)
}

/// "m:ss" fra sekunder per km
fn format_pace(s_per_km: f64) -> String {
    let total = s_per_km.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Sammendrag for én aktivitet.
///
/// Feil i strømmen isoleres: sammendraget bygges uansett fra posten, og
/// hver feil rapporteres som [`SkippedItem`].
pub fn summarize_activity(
    record: &ActivityRecord,
    stream: Option<&StreamTable>,
    ctx: &ZoneContext,
) -> ActivityOutcome {
    let profile = &ctx.profile;
    let mut skipped = Vec::new();

    let distance_km = positive(record.distance).map(|m| m / 1000.0);
    let moving_s = positive(record.moving_time);
    let moving_time_hours = moving_s.map(|s| s / 3600.0);

    // 1️⃣ Tempo (løp/svøm) eller fart (resten)
    let (pace_min_per_km, pace_formatted, avg_speed_kmh) = if profile.is_pace_sport(&record.sport_type) {
        match (moving_s, distance_km) {
            (Some(s), Some(km)) => {
                let s_per_km = s / km;
                (Some(s_per_km / 60.0), Some(format_pace(s_per_km)), None)
            }
            _ => (None, None, None),
        }
    } else {
        let kmh = record
            .average_speed
            .map(|v| v * 3.6)
            .or_else(|| match (distance_km, moving_time_hours) {
                (Some(km), Some(h)) => Some(km / h),
                _ => None,
            });
        (None, None, kmh)
    };

    // 2️⃣ Strøm: statistikk + soner
    let mut stats: Option<StreamStats> = None;
    let mut hr_zones: Option<ZoneSeconds> = None;
    let mut power_zones: Option<ZoneSeconds> = None;
    let mut sample_interval_s = None;

    if let Some(st) = stream {
        match st.validate() {
            Err(e) => {
                warn!("activity {}: skipping streams: {}", record.id, e);
                skipped.push(SkippedItem::new(&record.id, SkipScope::Streams, &e));
            }
            Ok(()) => {
                sample_interval_s = st.mean_sample_interval();
                let s = stream_stats(st);
                if !s.is_empty() {
                    stats = Some(s);
                }

                match time_in_zones_for_stream(st, &ctx.hr) {
                    Ok(z) => hr_zones = z,
                    Err(e) => {
                        warn!("activity {}: heart-rate zones skipped: {}", record.id, e);
                        skipped.push(SkippedItem::new(&record.id, SkipScope::HeartRate, &e));
                    }
                }

                if profile.is_power_sport(&record.sport_type) {
                    match time_in_zones_for_stream(st, &ctx.power) {
                        Ok(z) => power_zones = z,
                        Err(e) => {
                            warn!("activity {}: power zones skipped: {}", record.id, e);
                            skipped.push(SkippedItem::new(&record.id, SkipScope::Power, &e));
                        }
                    }
                }
            }
        }
    } else {
        debug!("activity {}: no streams", record.id);
    }

    // 3️⃣ Belastning: NP fra strøm, ellers plattformens vektede snitt
    let stream_power = stats.as_ref().and_then(|s| s.power.as_ref());
    let np = stream_power
        .and_then(|p| p.normalized_power)
        .or(record.weighted_average_watts);
    let avg_p = record
        .average_watts
        .or_else(|| stream_power.map(|p| p.distribution.mean));

    let hr_zone_percentages = hr_zones.as_ref().and_then(|z| z.percentages());
    let power_zone_percentages = power_zones.as_ref().and_then(|z| z.percentages());

    let summary = ActivitySummary {
        id: record.id.clone(),
        name: record.name.clone(),
        sport_type: record.sport_type.clone(),
        start_date: record.start_date,
        distance_m: record.distance,
        moving_time_s: record.moving_time,
        elevation_gain_m: record.total_elevation_gain,
        distance_km,
        moving_time_hours,
        pace_min_per_km,
        pace_formatted,
        avg_speed_kmh,
        average_heartrate: record.average_heartrate,
        max_heartrate: record.max_heartrate,
        average_watts: record.average_watts,
        weighted_average_watts: record.weighted_average_watts,
        sample_interval_s,
        stream_stats: stats,
        hr_zones,
        power_zones,
        hr_zone_percentages,
        power_zone_percentages,
        intensity_factor: intensity_factor(np, Some(profile.ftp)),
        variability_index: variability_index(np, avg_p),
    };

    ActivityOutcome { summary, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pace_is_formatted_as_minutes_seconds() {
        assert_eq!(format_pace(330.0), "5:30");
        assert_eq!(format_pace(299.9), "4:59");
    }

    #[test]
    fn run_gets_pace_ride_gets_speed() {
        let ctx = ZoneContext::from_profile(&AthleteProfile::default()).unwrap();

        let mut run = ActivityRecord::new("1", "Run");
        run.distance = Some(10_000.0);
        run.moving_time = Some(3000.0);
        let out = summarize_activity(&run, None, &ctx);
        assert_eq!(out.summary.pace_formatted.as_deref(), Some("5:00"));
        assert!(out.summary.avg_speed_kmh.is_none());
        assert!(out.summary.hr_zones.is_none());

        let mut ride = ActivityRecord::new("2", "Ride");
        ride.distance = Some(30_000.0);
        ride.moving_time = Some(3600.0);
        let out = summarize_activity(&ride, None, &ctx);
        assert!(out.summary.pace_min_per_km.is_none());
        assert!((out.summary.avg_speed_kmh.unwrap() - 30.0).abs() < 1e-9);
    }
}
