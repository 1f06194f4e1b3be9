// core/src/calendar.rs
use std::io::Write;

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::WorkoutEntry;

/// Alle økter legges kl. 07:00 lokal (flytende) tid
pub const START_HOUR: u32 = 7;

pub const CSV_HEADER: [&str; 5] = ["Subject", "Start Date", "Start Time", "End Time", "Description"];

/// Start og varighet for en økt. Eneste sted dette regnes ut; både ICS og
/// CSV går via denne.
pub fn schedule(entry: &WorkoutEntry) -> (NaiveDateTime, u32) {
    let start = entry
        .date
        .and_time(NaiveTime::from_hms_opt(START_HOUR, 0, 0).unwrap_or(NaiveTime::MIN));
    (start, entry.duration_minutes())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    pub subject: String,
    pub start_date: String, // %m/%d/%Y
    pub start_time: String, // %I:%M %p
    pub end_time: String,
    pub description: String,
}

impl CsvRow {
    pub fn as_record(&self) -> [&str; 5] {
        [
            &self.subject,
            &self.start_date,
            &self.start_time,
            &self.end_time,
            &self.description,
        ]
    }
}

pub fn to_ics(workouts: &[WorkoutEntry]) -> Vec<CalendarEvent> {
    workouts
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let (start, minutes) = schedule(w);
            CalendarEvent {
                uid: format!("{}-{:02}@zoneplan", w.date.format("%Y%m%d"), i),
                summary: w.title.trim().to_string(),
                description: w.description.trim().to_string(),
                start,
                end: start + Duration::minutes(minutes as i64),
                duration_minutes: minutes,
            }
        })
        .collect()
}

pub fn to_csv_rows(workouts: &[WorkoutEntry]) -> Vec<CsvRow> {
    workouts
        .iter()
        .map(|w| {
            let (start, minutes) = schedule(w);
            let end = start + Duration::minutes(minutes as i64);
            CsvRow {
                subject: w.title.trim().to_string(),
                start_date: start.format("%m/%d/%Y").to_string(),
                start_time: start.format("%I:%M %p").to_string(),
                end_time: end.format("%I:%M %p").to_string(),
                description: w.description.trim().to_string(),
            }
        })
        .collect()
}

// RFC 5545 §3.3.11
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Brett linjer over 75 oktetter (uten å splitte UTF-8 tegn)
fn fold_line(line: &str, out: &mut String) {
    let mut width = 0usize;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > 75 {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out.push_str("\r\n");
}

/// iCalendar-tekst. `stamp` blir DTSTAMP på alle hendelser.
pub fn render_ics(events: &[CalendarEvent], stamp: DateTime<Utc>) -> String {
    let fmt_local = "%Y%m%dT%H%M%S";
    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();

    let mut out = String::new();
    for l in ["BEGIN:VCALENDAR", "VERSION:2.0", "PRODID:-//zoneplan//training plan//EN"] {
        fold_line(l, &mut out);
    }
    for e in events {
        fold_line("BEGIN:VEVENT", &mut out);
        fold_line(&format!("UID:{}", e.uid), &mut out);
        fold_line(&format!("DTSTAMP:{dtstamp}"), &mut out);
        fold_line(&format!("DTSTART:{}", e.start.format(fmt_local)), &mut out);
        fold_line(&format!("DURATION:PT{}M", e.duration_minutes), &mut out);
        fold_line(&format!("SUMMARY:{}", escape_text(&e.summary)), &mut out);
        if !e.description.is_empty() {
            fold_line(&format!("DESCRIPTION:{}", escape_text(&e.description)), &mut out);
        }
        fold_line("END:VEVENT", &mut out);
    }
    fold_line("END:VCALENDAR", &mut out);
    out
}

/// CSV for kalender-import (header + rader).
pub fn write_csv<W: Write>(rows: &[CsvRow], writer: W) -> Result<(), CoreError> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(CSV_HEADER)?;
    for r in rows {
        w.write_record(r.as_record())?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_and_folds() {
        assert_eq!(escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");
        let mut out = String::new();
        fold_line(&"x".repeat(100), &mut out);
        let lines: Vec<&str> = out.split("\r\n").collect();
        assert_eq!(lines[0].len(), 75);
        assert!(lines[1].starts_with(' '));
        assert_eq!(lines[1].len(), 26);
    }
}
