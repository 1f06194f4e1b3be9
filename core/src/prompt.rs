// core/src/prompt.rs
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::sleep::SleepReport;
use crate::types::{ActivitySummary, AthleteProfile};

/// Antall dager bakover som tas med i prompten
pub const RECENT_DAYS: u64 = 3;

const SYSTEM_PROMPT: &str = "You are an expert sports science and training assistant. \
You analyze fitness data to provide personalized training recommendations. \
You understand exercise physiology, training load management and periodization. \
Balance performance gains with recovery needs. When making recommendations, consider \
sleep quality metrics (heart rate, HRV, sleep stages), recent training load and patterns, \
upcoming race events and goals, and the athlete's apparent strengths and preferences.";

/// Kommende konkurranse/mål
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingEvent {
    pub name: String,
    pub date: NaiveDate,
}

/// Ferdig prompt til coach-tjenesten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachPrompt {
    pub system: String,
    pub user: String,
}

/// Aktiviteter med startdato innenfor de siste `RECENT_DAYS` før `today`
/// (inkludert i dag). Aktiviteter uten dato tas ikke med.
pub fn recent_activities<'a>(
    activities: &'a [ActivitySummary],
    today: NaiveDate,
) -> Vec<&'a ActivitySummary> {
    let cutoff = today - Days::new(RECENT_DAYS);
    activities
        .iter()
        .filter(|a| {
            a.start_date
                .map(|d| {
                    let day = d.date_naive();
                    day >= cutoff && day <= today
                })
                .unwrap_or(false)
        })
        .collect()
}

// Kompakt visning: bare det coachen trenger
fn activity_brief(a: &ActivitySummary) -> Value {
    json!({
        "sport_type": a.sport_type,
        "date": a.start_date.map(|d| d.date_naive().to_string()),
        "distance_km": a.distance_km,
        "duration_min": a.moving_time_s.map(|s| s / 60.0),
        "pace": a.pace_formatted,
        "avg_hr": a.average_heartrate,
        "max_hr": a.max_heartrate,
        "normalized_power": a.stream_stats.as_ref()
            .and_then(|s| s.power.as_ref())
            .and_then(|p| p.normalized_power),
        "hr_zone_percentages": a.hr_zone_percentages,
        "power_zone_percentages": a.power_zone_percentages,
    })
}

pub fn build_prompt(
    sleep: Option<&SleepReport>,
    activities: &[ActivitySummary],
    events: &[UpcomingEvent],
    today: NaiveDate,
    profile: &AthleteProfile,
) -> CoachPrompt {
    let sleep_json = sleep
        .and_then(|s| serde_json::to_value(s).ok())
        .unwrap_or_else(|| json!({}));
    let workouts: Vec<Value> = recent_activities(activities, today)
        .into_iter()
        .map(activity_brief)
        .collect();

    let mut events_txt = String::new();
    for (i, e) in events.iter().enumerate() {
        let days_left = (e.date - today).num_days();
        events_txt.push_str(&format!(
            "{}. {} on {} (in {} days)\n",
            i + 1,
            e.name,
            e.date.format("%B %-d, %Y"),
            days_left
        ));
    }
    if events_txt.is_empty() {
        events_txt.push_str("None registered.\n");
    }

    let heading = profile.plan_heading.trim();
    let example_day = today + Days::new(1);
    let rest_day = today + Days::new(2);

    let user = format!(
        "Today is {today}. Based on the following data, provide:\n\
1. A readiness score (1-10) indicating how ready I am to work out today\n\
2. What type of athlete I am based on my workouts\n\
3. Specific workout(s) I should do today\n\
4. A training plan leading up to my upcoming events\n\n\
Sleep data from last night:\n{sleep}\n\n\
Workout data from the past {days} days:\n{workouts}\n\n\
My upcoming events:\n{events}\n\
Structure the response with sections for:\n\
- Today's Readiness Assessment\n\
- Athlete Profile\n\
- Today's Workout Recommendation\n\
- {heading}\n\n\
IMPORTANT: in the {heading} section, format each workout entry on one line like this:\n\
[DATE: YYYY-MM-DD] WORKOUT TITLE | DURATION: X min | DESCRIPTION: detailed workout description\n\n\
Example:\n\
[DATE: {example_day}] Easy Run | DURATION: 45 min | DESCRIPTION: Zone 2 easy run on flat terrain, focus on technique\n\
[DATE: {rest_day}] REST DAY | DURATION: 0 min | DESCRIPTION: Full rest day for recovery\n\n\
This format is required for calendar import.",
        sleep = sleep_json,
        days = RECENT_DAYS,
        workouts = Value::Array(workouts),
        events = events_txt,
    );

    CoachPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}
