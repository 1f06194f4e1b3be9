// core/src/aggregate.rs
use crate::error::CoreError;
use crate::models::Sample;
use crate::streams::{check_ascending, StreamTable};
use crate::types::ZoneSeconds;
use crate::zones::{Classification, ZoneTable};

/// Tid i soner for en stigende samplestrøm.
///
/// Intervallet [t[i], t[i+1]) tilskrives sonen til v[i] (verdien ved
/// intervallets start). Siste sample har ikke noe etterfølgende punkt, så
/// intervallet *estimeres* som snittet av alle foregående Δt. Dette er en
/// bevisst tilnærming (kanteffekt), ikke en målt varighet.
///
/// - null-verdier gir 0 s, men tidsaksen er tett: Δt beregnes uansett
/// - verdier under første bånd gir 0 s
/// - færre enn 2 samples → alle soner 0
/// - synkende tid → `UnsortedSamples` (ingen stille feilsortering)
pub fn time_in_zones(samples: &[Sample], table: &ZoneTable) -> Result<ZoneSeconds, CoreError> {
    let mut out = table.empty_durations();

    let times: Vec<f64> = samples.iter().map(|s| s.t).collect();
    check_ascending(&times)?;

    let n = samples.len();
    if n < 2 {
        return Ok(out);
    }

    let mut deltas: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    // estimat for siste punkt = snitt av foregående Δt
    let trailing = deltas.iter().sum::<f64>() / deltas.len() as f64;
    deltas.push(trailing);

    for (s, dt) in samples.iter().zip(deltas.iter()) {
        if let Classification::Zone(name) = table.classify(s.value) {
            out.add(name, *dt);
        }
    }

    Ok(out)
}

/// Som [`time_in_zones`], men direkte fra en strømtabell.
/// `Ok(None)` betyr at metrikken ikke finnes i strømmen ("ikke aktuelt"),
/// forskjellig fra et kart med bare nuller.
pub fn time_in_zones_for_stream(
    stream: &StreamTable,
    table: &ZoneTable,
) -> Result<Option<ZoneSeconds>, CoreError> {
    match stream.samples(table.metric()) {
        Some(samples) => time_in_zones(&samples, table).map(Some),
        None => Ok(None),
    }
}
