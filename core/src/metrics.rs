use serde::{Deserialize, Serialize};

/// Vindu (antall punkter) for NP sitt rullende snitt
pub const NP_WINDOW: usize = 30;

/// Normalized Power:
/// 1) 30-punkts rullende snitt (bakoverskuende; de første 29 gir ingen verdi)
/// 2) ^4-middel
/// 3) fjerderot
///
/// Forventer null-fjernede verdier. Færre enn 30 → None (utelatt, ikke 0).
pub fn normalized_power(watts: &[f64]) -> Option<f64> {
    if watts.len() < NP_WINDOW {
        return None;
    }

    let window = NP_WINDOW;
    let mut smooth = Vec::with_capacity(watts.len() - window + 1);
    let mut sum = 0.0f64;

    for i in 0..watts.len() {
        sum += watts[i];
        if i >= window {
            sum -= watts[i - window];
        }
        if i + 1 >= window {
            smooth.push(sum / window as f64);
        }
    }
    if smooth.is_empty() {
        return None;
    }

    let fourth_power_avg = smooth.iter().map(|x| x.powi(4)).sum::<f64>() / smooth.len() as f64;

    Some(fourth_power_avg.powf(0.25))
}

/// IF = NP/FTP
pub fn intensity_factor(np: Option<f64>, ftp: Option<f64>) -> Option<f64> {
    match (np, ftp) {
        (Some(n), Some(f)) if f > 0.0 => Some(n / f),
        _ => None,
    }
}

/// VI = NP / AvgPower
pub fn variability_index(np: Option<f64>, avg_p: Option<f64>) -> Option<f64> {
    match (np, avg_p) {
        (Some(n), Some(a)) if a > 0.0 => Some(n / a),
        _ => None,
    }
}

/// Endringsrate per minutt for en tidsserie (t i sek).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateOfChange {
    pub avg_change_per_minute: f64,
    pub max_increase_per_minute: f64,
    pub max_decrease_per_minute: f64,
}

/// Δv/Δt (per minutt) for hvert påfølgende par. Par med Δt = 0 hoppes over.
/// Færre enn 2 punkter (eller ingen gyldige par) → None.
pub fn rate_of_change(points: &[(f64, f64)]) -> Option<RateOfChange> {
    let rates: Vec<f64> = points
        .windows(2)
        .filter_map(|w| {
            let dt_min = (w[1].0 - w[0].0) / 60.0;
            if dt_min.abs() < f64::EPSILON {
                None
            } else {
                Some((w[1].1 - w[0].1) / dt_min)
            }
        })
        .collect();
    if rates.is_empty() {
        return None;
    }
    Some(RateOfChange {
        avg_change_per_minute: rates.iter().sum::<f64>() / rates.len() as f64,
        max_increase_per_minute: rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        max_decrease_per_minute: rates.iter().copied().fold(f64::INFINITY, f64::min),
    })
}
