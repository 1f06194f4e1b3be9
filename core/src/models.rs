use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Ett punkt i en strøm: tidspunkt (sek) og verdi (kan mangle).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub t: f64,            // sekunder (fra start eller epoch)
    pub value: Option<f64>, // None = hull i målingen
}

impl Sample {
    pub fn new(t: f64, value: Option<f64>) -> Self {
        Self { t, value }
    }
}

/// Rå aktivitetspost slik aktivitetsplattformen leverer den.
/// Kun `id` og `sport_type` er påkrevd, resten er valgfritt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(deserialize_with = "de_activity_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub sport_type: String,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distance: Option<f64>, // meter
    #[serde(default)]
    pub moving_time: Option<f64>, // sek
    #[serde(default)]
    pub elapsed_time: Option<f64>, // sek
    #[serde(default)]
    pub total_elevation_gain: Option<f64>, // meter
    #[serde(default)]
    pub average_speed: Option<f64>, // m/s
    #[serde(default)]
    pub max_speed: Option<f64>, // m/s
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub weighted_average_watts: Option<f64>,
    #[serde(default)]
    pub kilojoules: Option<f64>,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub suffer_score: Option<f64>,
}

impl ActivityRecord {
    /// Minimal post (brukes mest i tester).
    pub fn new(id: impl Into<String>, sport_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            sport_type: sport_type.into(),
            start_date: None,
            distance: None,
            moving_time: None,
            elapsed_time: None,
            total_elevation_gain: None,
            average_speed: None,
            max_speed: None,
            average_heartrate: None,
            max_heartrate: None,
            average_watts: None,
            weighted_average_watts: None,
            kilojoules: None,
            average_cadence: None,
            suffer_score: None,
        }
    }
}

// Plattformen sender id som tall, eksportfiler har den ofte som streng
fn de_activity_id<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "activity id must be a number or non-empty string, got {other}"
        ))),
    }
}

/// Én kalenderklar økt i en treningsplan.
///
/// `duration` er frasen slik den sto i teksten ("45 min"); minuttene
/// utledes alltid via [`WorkoutEntry::duration_minutes`] slik at alle
/// eksportformater regner likt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub date: NaiveDate,
    pub title: String,
    pub duration: String,
    pub description: String,
}

/// Standard varighet når frasen ikke inneholder sifre.
pub const DEFAULT_DURATION_MIN: u32 = 60;

impl WorkoutEntry {
    pub fn new(
        date: NaiveDate,
        title: impl Into<String>,
        duration: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date,
            title: title.into().trim().to_string(),
            duration: duration.into().trim().to_string(),
            description: description.into().trim().to_string(),
        }
    }

    pub fn duration_minutes(&self) -> u32 {
        parse_duration_minutes(&self.duration)
    }

    pub fn is_rest_day(&self) -> bool {
        self.duration_minutes() == 0
    }
}

/// Alle sifre i frasen slås sammen til ett tall ("45 min" → 45).
/// Ingen sifre (eller overflyt) → 60 min.
pub fn parse_duration_minutes(phrase: &str) -> u32 {
    let digits: String = phrase.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return DEFAULT_DURATION_MIN;
    }
    digits.parse::<u32>().unwrap_or(DEFAULT_DURATION_MIN)
}
