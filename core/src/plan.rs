// core/src/plan.rs
use chrono::{Days, NaiveDate};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::models::WorkoutEntry;

/// Én oppføring, fra dato-taggen til slutten av biten:
/// `[DATE: YYYY-MM-DD] TITTEL | DURATION: X min | DESCRIPTION: fritekst`
static ENTRY_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?s)^\[DATE:[ \t]*(\d{4}-\d{2}-\d{2})[ \t]*\][ \t]*([^|\n]*?)[ \t]*\|[ \t]*DURATION:[ \t]*([^|\n]*?)[ \t]*\|[ \t]*DESCRIPTION:[ \t]*(.*)$",
    )
    .ok()
});

/// Dato-tag hvor som helst i teksten ("1. [DATE: ...", "Week 2: [DATE: ...")
static DATE_TAG_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\[DATE:").ok());

pub const FALLBACK_DAYS: u64 = 28;

/// Arketyper i reserveplanen, valgt med `dag % 5`
const ARCHETYPES: [(&str, &str, &str); 5] = [
    ("Easy Run", "45 min", "Zone 2 easy run on flat terrain, focus on technique"),
    (
        "Interval Training",
        "60 min",
        "Warm up 15min, 6x400m sprints with 2min rest, cool down 15min",
    ),
    ("Strength Training", "45 min", "Full body workout with focus on core and legs"),
    ("Long Run", "90 min", "Easy pace long run to build endurance"),
    ("Cross Training", "60 min", "Swimming or cycling at moderate intensity"),
];

const REST_DAY: (&str, &str, &str) = ("REST DAY", "0 min", "Full rest day for recovery");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    SectionNotFound,
    NoEntries,
}

/// Hvor planen kom fra
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanSource {
    Parsed,
    Fallback { reason: FallbackReason },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExtraction {
    pub source: PlanSource,
    pub workouts: Vec<WorkoutEntry>,
}

impl PlanExtraction {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, PlanSource::Fallback { .. })
    }
}

/// Plan-seksjonen: fra overskriften (case-insensitivt) til slutten av teksten.
pub fn find_plan_section<'a>(text: &'a str, heading: &str) -> Option<&'a str> {
    let re = RegexBuilder::new(&regex::escape(heading.trim()))
        .case_insensitive(true)
        .build()
        .ok()?;
    let m = re.find(text)?;
    Some(&text[m.end()..])
}

// Beskrivelsen stopper ved første blanke linje; resten av biten er prosa
fn description(raw: &str) -> String {
    let mut lines = raw.lines();
    let kept: Vec<&str> = lines
        .by_ref()
        .take_while(|l| !l.trim().is_empty())
        .map(str::trim_end)
        .collect();
    let dropped = lines.filter(|l| !l.trim().is_empty()).count();
    if dropped > 0 {
        debug!("plan: {} line(s) after a blank line left out of the description", dropped);
    }
    kept.join("\n")
}

/// Best-effort: alle oppføringer i seksjonen, muligens tom.
///
/// Hver dato-tag starter en oppføring, også midt på en linje. Beskrivelsen
/// går til neste dato-tag, en blank linje eller slutten av teksten. Tekst
/// foran en tag på samme linje ("1. ", "Week 2: ") hører ikke til forrige
/// beskrivelse. Ugyldige datoer hoppes over.
pub fn parse_entries(section: &str) -> Vec<WorkoutEntry> {
    let (Some(entry_re), Some(tag_re)) = (ENTRY_RE.as_ref(), DATE_TAG_RE.as_ref()) else {
        warn!("plan: entry patterns failed to compile");
        return Vec::new();
    };

    let starts: Vec<usize> = tag_re.find_iter(section).map(|m| m.start()).collect();
    let mut out = Vec::with_capacity(starts.len());

    for (i, &start) in starts.iter().enumerate() {
        let end = match starts.get(i + 1) {
            // kutt ved linjeskiftet foran neste tag, ellers rett foran taggen
            Some(&next) => section[start..next].rfind('\n').map_or(next, |nl| start + nl),
            None => section.len(),
        };
        let chunk = &section[start..end];

        let Some(c) = entry_re.captures(chunk) else {
            debug!(
                "plan: date tag without the four-field format: {}",
                chunk.lines().next().unwrap_or_default().trim()
            );
            continue;
        };
        match NaiveDate::parse_from_str(&c[1], "%Y-%m-%d") {
            Ok(date) => out.push(WorkoutEntry::new(date, &c[2], &c[3], description(&c[4]))),
            Err(e) => warn!("plan: skipping entry with invalid date '{}': {}", &c[1], e),
        }
    }
    out
}

/// Deterministisk reserveplan: 28 dager fra dagen etter `today`.
/// Dag 6, 13, 20, 27 (0-indeksert) er hviledager på 0 min; øvrige dager
/// går gjennom arketypene med `dag % 5`.
pub fn fallback_plan(today: NaiveDate) -> Vec<WorkoutEntry> {
    (0..FALLBACK_DAYS)
        .map(|day| {
            let date = today + Days::new(day + 1);
            let (title, duration, description) = if day % 7 == 6 {
                REST_DAY
            } else {
                ARCHETYPES[(day % 5) as usize]
            };
            WorkoutEntry::new(date, title, duration, description)
        })
        .collect()
}

/// Plan fra coach-tekst. Returnerer aldri en tom plan: finnes ikke
/// seksjonen eller ingen oppføringer, brukes reserveplanen.
pub fn extract_plan(text: &str, heading: &str, today: NaiveDate) -> PlanExtraction {
    let Some(section) = find_plan_section(text, heading) else {
        warn!("plan: section '{}' not found, using fallback plan", heading);
        return PlanExtraction {
            source: PlanSource::Fallback {
                reason: FallbackReason::SectionNotFound,
            },
            workouts: fallback_plan(today),
        };
    };

    let workouts = parse_entries(section);
    if workouts.is_empty() {
        warn!("plan: no workouts in the expected format, using fallback plan");
        return PlanExtraction {
            source: PlanSource::Fallback {
                reason: FallbackReason::NoEntries,
            },
            workouts: fallback_plan(today),
        };
    }

    info!("plan: extracted {} workouts", workouts.len());
    PlanExtraction {
        source: PlanSource::Parsed,
        workouts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_description_ends_at_next_tag_or_blank() {
        let section = "\n[DATE: 2025-03-25] Easy Run | DURATION: 45 min | DESCRIPTION: zone 2\nkeep cadence high\n[DATE: 2025-03-26] REST DAY | DURATION: 0 min | DESCRIPTION: rest\n\nNotes: hydrate";
        let e = parse_entries(section);
        assert_eq!(e.len(), 2);
        assert_eq!(e[0].description, "zone 2\nkeep cadence high");
        assert_eq!(e[1].description, "rest");
        assert!(e[1].is_rest_day());
    }

    #[test]
    fn invalid_date_is_skipped() {
        let section = "[DATE: 2025-02-30] Bad | DURATION: 30 min | DESCRIPTION: x\nmore\n[DATE: 2025-03-01] Good | DURATION: 30 min | DESCRIPTION: y";
        let e = parse_entries(section);
        assert_eq!(e.len(), 1);
        assert_eq!(e[0].title, "Good");
    }

    #[test]
    fn markdown_bullets_are_tolerated() {
        let section = "- [DATE: 2025-04-01] Tempo Ride | DURATION: 75 min | DESCRIPTION: 3x10 min at threshold";
        let e = parse_entries(section);
        assert_eq!(e.len(), 1);
        assert_eq!(e[0].duration_minutes(), 75);
    }

    #[test]
    fn blank_line_ends_description() {
        let section = "[DATE: 2025-03-25] Easy Run | DURATION: 45 min | DESCRIPTION: zone 2\n  flat route  \n\nNotes: hydrate\nsleep well";
        let e = parse_entries(section);
        assert_eq!(e.len(), 1);
        assert_eq!(e[0].description, "zone 2\n  flat route");
    }

    #[test]
    fn two_entries_on_one_line() {
        let section = "[DATE: 2025-03-25] Easy Run | DURATION: 45 min | DESCRIPTION: z2 [DATE: 2025-03-26] Swim | DURATION: 30 min | DESCRIPTION: drills";
        let e = parse_entries(section);
        assert_eq!(e.len(), 2);
        assert_eq!(e[0].description, "z2");
        assert_eq!(e[1].title, "Swim");
    }

    #[test]
    fn heading_is_case_insensitive() {
        let t = "## 4-week training plan\n[DATE: 2025-03-25] Easy Run | DURATION: 45 min | DESCRIPTION: z2";
        assert!(find_plan_section(t, "4-Week Training Plan").is_some());
        assert!(find_plan_section(t, "8-Week Plan").is_none());
    }
}
