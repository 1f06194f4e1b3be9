use std::fmt::Write as _;

use crate::rollup::SportRollup;
use crate::types::ZoneMap;

fn zone_lines(out: &mut String, label: &str, secs: &ZoneMap, pct: Option<&ZoneMap>) {
    let Some(pct) = pct else { return };
    let _ = writeln!(out, "  {label}:");
    for (name, s) in secs.iter() {
        let p = pct.get(name).unwrap_or(0.0);
        let _ = writeln!(out, "    {:<28} {:>6.1}%  ({:.0} min)", name, p, s / 60.0);
    }
}

/// Lesbar oppsummering per sporttype
pub fn format_rollup_report(rollup: &SportRollup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Activity Summary ---");
    if rollup.sports.is_empty() {
        let _ = writeln!(out, "No activities.");
        return out;
    }

    for (sport, s) in &rollup.sports {
        let _ = writeln!(out, "{sport}:");
        let _ = writeln!(out, "  Activities: {}", s.count);
        let _ = writeln!(out, "  Total distance: {:.1} km", s.total_distance / 1000.0);
        let _ = writeln!(out, "  Total time: {:.0} min", s.total_duration / 60.0);
        let _ = writeln!(out, "  Total elevation: {:.0} m", s.total_elevation);
        zone_lines(&mut out, "Heart rate zones", &s.hr_zones, s.hr_zone_percentages.as_ref());
        zone_lines(&mut out, "Power zones", &s.power_zones, s.power_zone_percentages.as_ref());
    }
    out
}

pub fn print_rollup_report(rollup: &SportRollup) {
    print!("{}", format_rollup_report(rollup));
}
