// core/src/telemetry.rs
use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

use crate::error::CoreError;

/// Tellere for én kjøring. Eget register per instans, ingen globale.
#[derive(Clone)]
pub struct Telemetry {
    registry: Registry,
    pub activities_processed: IntCounter,
    pub activities_skipped: IntCounter,
    pub zone_streams: IntCounter,
    pub plan_fallback: IntCounter,
    pub plan_entries_parsed: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, CoreError> {
    let c = IntCounter::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl Telemetry {
    pub fn new() -> Result<Self, CoreError> {
        let registry = Registry::new();
        Ok(Self {
            activities_processed: counter(
                &registry,
                "zoneplan_activities_processed_total",
                "Activities summarized",
            )?,
            activities_skipped: counter(
                &registry,
                "zoneplan_activities_skipped_total",
                "Activity records or streams skipped",
            )?,
            zone_streams: counter(
                &registry,
                "zoneplan_zone_streams_total",
                "Sample streams aggregated into zones",
            )?,
            plan_fallback: counter(
                &registry,
                "zoneplan_plan_fallback_total",
                "Plans replaced by the default four-week plan",
            )?,
            plan_entries_parsed: counter(
                &registry,
                "zoneplan_plan_entries_parsed_total",
                "Workout entries extracted from recommendation text",
            )?,
            registry,
        })
    }

    /// Prometheus tekstformat
    pub fn render(&self) -> Result<String, CoreError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| CoreError::MalformedInput(e.to_string()))
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("activities_processed", &self.activities_processed.get())
            .field("activities_skipped", &self.activities_skipped.get())
            .field("zone_streams", &self.zone_streams.get())
            .field("plan_fallback", &self.plan_fallback.get())
            .field("plan_entries_parsed", &self.plan_entries_parsed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lists_all_counters() {
        let t = Telemetry::new().unwrap();
        t.plan_fallback.inc();
        let txt = t.render().unwrap();
        assert!(txt.contains("zoneplan_plan_fallback_total 1"));
        assert!(txt.contains("zoneplan_activities_processed_total 0"));
    }
}
