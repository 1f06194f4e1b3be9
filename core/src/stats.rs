// core/src/stats.rs
use ordered_float::OrderedFloat;

use crate::metrics::normalized_power;
use crate::streams::{non_null, StreamTable};
use crate::types::{Distribution, Percentiles, PowerStats, StreamStats};

/// Sortert kopi (NaN er allerede filtrert bort av kaller)
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut xs = values.to_vec();
    xs.sort_by_key(|v| OrderedFloat(*v));
    xs
}

/// Kvantil med lineær interpolasjon mellom ordensstatistikker:
/// pos = q·(n-1), verdi = x[lo] + (pos-lo)·(x[hi]-x[lo]).
/// Forventer sortert input.
pub fn quantile_sorted(xs: &[f64], q: f64) -> Option<f64> {
    if xs.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (xs.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(xs[lo] + frac * (xs[hi] - xs[lo]))
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

/// Utvalgsstandardavvik (n-1). None for n < 2.
pub fn sample_std(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (xs.len() - 1) as f64).sqrt())
}

/// Fordelingsstatistikk. Tom input → None.
pub fn summarize(values: &[f64]) -> Option<Distribution> {
    let xs = sorted(values);
    let n = xs.len();
    if n == 0 {
        return None;
    }
    let q = |p: f64| quantile_sorted(&xs, p).unwrap_or(xs[0]);
    Some(Distribution {
        count: n,
        min: xs[0],
        max: xs[n - 1],
        mean: mean(&xs)?,
        median: q(0.5),
        std: sample_std(&xs),
        percentiles: Percentiles {
            p10: q(0.10),
            p25: q(0.25),
            p75: q(0.75),
            p90: q(0.90),
        },
    })
}

/// Statistikk for puls, kraft (inkl. NP) og fart fra en strømtabell.
pub fn stream_stats(stream: &StreamTable) -> StreamStats {
    let hr = stream.heartrate.as_deref().map(non_null);
    let watts = stream.watts.as_deref().map(non_null);
    let speed = stream.velocity_smooth.as_deref().map(non_null);

    StreamStats {
        heartrate: hr.as_deref().and_then(summarize),
        power: watts.as_deref().and_then(|w| {
            summarize(w).map(|distribution| PowerStats {
                distribution,
                normalized_power: normalized_power(w),
            })
        }),
        speed: speed.as_deref().and_then(summarize),
    }
}
