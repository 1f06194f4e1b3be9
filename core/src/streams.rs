// core/src/streams.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::models::Sample;
use crate::zones::ZoneMetric;

/// Parallelle strømmer for én aktivitet, alle med samme lengde som `time`.
/// Manglende strøm = None; manglende punkt = None i vektoren.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamTable {
    pub time: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartrate: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watts: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_smooth: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Vec<Option<f64>>>,
}

const SCALAR_KEYS: [&str; 7] = [
    "heartrate",
    "watts",
    "velocity_smooth",
    "distance",
    "altitude",
    "temp",
    "cadence",
];

// Plattform-format: {"watts": {"data": [...]}}; flatt format: {"watts": [...]}
fn stream_array<'a>(key: &str, v: &'a Value) -> Result<&'a Vec<Value>, CoreError> {
    let arr = match v {
        Value::Array(a) => Some(a),
        Value::Object(o) => o.get("data").and_then(Value::as_array),
        _ => None,
    };
    arr.ok_or_else(|| CoreError::MalformedInput(format!("stream '{key}' is not an array")))
}

fn num_or_null(key: &str, i: usize, v: &Value) -> Result<Option<f64>, CoreError> {
    match v {
        Value::Null => Ok(None),
        // Plattformen sender "moving" o.l. som bool; tall-strømmer skal være tall
        Value::Number(n) => Ok(n.as_f64()),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        other => Err(CoreError::MalformedInput(format!(
            "stream '{key}' index {i}: expected number or null, got {other}"
        ))),
    }
}

impl StreamTable {
    /// Les strømtabell fra JSON (plattform- eller flatt format) og valider den.
    pub fn from_json(v: &Value) -> Result<Self, CoreError> {
        let obj = v
            .as_object()
            .ok_or_else(|| CoreError::MalformedInput("stream table must be a JSON object".into()))?;

        let raw_time = obj
            .get("time")
            .ok_or_else(|| CoreError::MissingKey("time".into()))?;
        let mut time = Vec::new();
        for (i, x) in stream_array("time", raw_time)?.iter().enumerate() {
            match num_or_null("time", i, x)? {
                Some(t) => time.push(t),
                None => {
                    return Err(CoreError::MalformedInput(format!(
                        "stream 'time' index {i} is null"
                    )))
                }
            }
        }

        let mut table = StreamTable {
            time,
            ..Default::default()
        };

        for key in SCALAR_KEYS {
            let Some(raw) = obj.get(key) else { continue };
            let values = stream_array(key, raw)?
                .iter()
                .enumerate()
                .map(|(i, x)| num_or_null(key, i, x))
                .collect::<Result<Vec<_>, _>>()?;
            *table.slot_mut(key) = Some(values);
        }

        if let Some(raw) = obj.get("latlng") {
            let mut lat = Vec::new();
            let mut lng = Vec::new();
            for (i, pair) in stream_array("latlng", raw)?.iter().enumerate() {
                match pair {
                    Value::Array(p) if p.len() == 2 => {
                        lat.push(num_or_null("latlng", i, &p[0])?);
                        lng.push(num_or_null("latlng", i, &p[1])?);
                    }
                    Value::Null => {
                        lat.push(None);
                        lng.push(None);
                    }
                    other => {
                        return Err(CoreError::MalformedInput(format!(
                            "stream 'latlng' index {i}: expected [lat, lng], got {other}"
                        )))
                    }
                }
            }
            table.latitude = Some(lat);
            table.longitude = Some(lng);
        } else {
            // flatt format kan allerede ha splittet koordinatene
            for key in ["latitude", "longitude"] {
                let Some(raw) = obj.get(key) else { continue };
                let values = stream_array(key, raw)?
                    .iter()
                    .enumerate()
                    .map(|(i, x)| num_or_null(key, i, x))
                    .collect::<Result<Vec<_>, _>>()?;
                if key == "latitude" {
                    table.latitude = Some(values);
                } else {
                    table.longitude = Some(values);
                }
            }
        }

        table.validate()?;
        Ok(table)
    }

    fn slot_mut(&mut self, key: &str) -> &mut Option<Vec<Option<f64>>> {
        match key {
            "heartrate" => &mut self.heartrate,
            "watts" => &mut self.watts,
            "velocity_smooth" => &mut self.velocity_smooth,
            "distance" => &mut self.distance,
            "altitude" => &mut self.altitude,
            "temp" => &mut self.temp,
            "cadence" => &mut self.cadence,
            "latitude" => &mut self.latitude,
            _ => &mut self.longitude,
        }
    }

    fn named_streams(&self) -> [(&'static str, Option<&Vec<Option<f64>>>); 9] {
        [
            ("heartrate", self.heartrate.as_ref()),
            ("watts", self.watts.as_ref()),
            ("velocity_smooth", self.velocity_smooth.as_ref()),
            ("distance", self.distance.as_ref()),
            ("altitude", self.altitude.as_ref()),
            ("temp", self.temp.as_ref()),
            ("cadence", self.cadence.as_ref()),
            ("latitude", self.latitude.as_ref()),
            ("longitude", self.longitude.as_ref()),
        ]
    }

    /// Like lengder + stigende (ikke-synkende), endelige tidsstempler.
    pub fn validate(&self) -> Result<(), CoreError> {
        let n = self.time.len();
        for (key, stream) in self.named_streams() {
            if let Some(s) = stream {
                if s.len() != n {
                    return Err(CoreError::LengthMismatch {
                        key: key.to_string(),
                        expected: n,
                        got: s.len(),
                    });
                }
            }
        }
        check_ascending(&self.time)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn metric(&self, metric: ZoneMetric) -> Option<&Vec<Option<f64>>> {
        match metric {
            ZoneMetric::HeartRate => self.heartrate.as_ref(),
            ZoneMetric::Power => self.watts.as_ref(),
        }
    }

    /// Strømmen som samples på den tette tidsaksen; None hvis metrikken mangler.
    pub fn samples(&self, metric: ZoneMetric) -> Option<Vec<Sample>> {
        let values = self.metric(metric)?;
        Some(
            self.time
                .iter()
                .zip(values.iter())
                .map(|(t, v)| Sample::new(*t, *v))
                .collect(),
        )
    }

    /// Snitt av Δt mellom påfølgende tidsstempler.
    pub fn mean_sample_interval(&self) -> Option<f64> {
        let n = self.time.len();
        if n < 2 {
            return None;
        }
        Some((self.time[n - 1] - self.time[0]) / (n - 1) as f64)
    }
}

/// Null-verdier fjernet
pub fn non_null(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect()
}

pub(crate) fn check_ascending(time: &[f64]) -> Result<(), CoreError> {
    for (i, t) in time.iter().enumerate() {
        if !t.is_finite() {
            return Err(CoreError::MalformedInput(format!(
                "timestamp at index {i} is not finite"
            )));
        }
        if i > 0 && *t < time[i - 1] {
            return Err(CoreError::UnsortedSamples {
                index: i,
                prev: time[i - 1],
                next: *t,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_platform_shape_and_splits_latlng() {
        let v = json!({
            "time": {"data": [0, 1, 2]},
            "heartrate": {"data": [120, null, 122]},
            "latlng": {"data": [[59.9, 10.7], [59.91, 10.71], null]},
            "moving": {"data": [true, true, false]}
        });
        let t = StreamTable::from_json(&v).unwrap();
        assert_eq!(t.time, vec![0.0, 1.0, 2.0]);
        assert_eq!(t.heartrate, Some(vec![Some(120.0), None, Some(122.0)]));
        assert_eq!(t.latitude, Some(vec![Some(59.9), Some(59.91), None]));
        assert_eq!(t.longitude.as_ref().map(|l| l.len()), Some(3));
        assert!(t.watts.is_none());
    }

    #[test]
    fn missing_time_and_length_mismatch() {
        let no_time = json!({"heartrate": [1, 2]});
        assert!(matches!(StreamTable::from_json(&no_time), Err(CoreError::MissingKey(k)) if k == "time"));

        let short = json!({"time": [0, 1, 2], "watts": [100, 200]});
        assert!(matches!(
            StreamTable::from_json(&short),
            Err(CoreError::LengthMismatch { expected: 3, got: 2, .. })
        ));
    }

    #[test]
    fn out_of_order_time_fails_loudly() {
        let v = json!({"time": [0, 5, 3], "heartrate": [100, 110, 120]});
        assert!(matches!(
            StreamTable::from_json(&v),
            Err(CoreError::UnsortedSamples { index: 2, .. })
        ));
    }

    #[test]
    fn mean_interval() {
        let v = json!({"time": [0, 1, 3, 6]});
        let t = StreamTable::from_json(&v).unwrap();
        assert_eq!(t.mean_sample_interval(), Some(2.0));
    }
}
