// core/src/error.rs
use thiserror::Error;

/// Feiltyper for kjernen.
///
/// "For lite data" er aldri en feil her: det uttrykkes som `None` eller et
/// nullstilt sonekart. Feil betyr at input er ødelagt og at aktiviteten/metrikken
/// må hoppes over.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("stream is missing required key '{0}'")]
    MissingKey(String),

    #[error("stream '{key}' has {got} samples, expected {expected} (length of 'time')")]
    LengthMismatch {
        key: String,
        expected: usize,
        got: usize,
    },

    #[error("samples not ascending in time at index {index}: t={prev} followed by t={next}")]
    UnsortedSamples { index: usize, prev: f64, next: f64 },

    #[error("invalid zone table: {0}")]
    InvalidZoneTable(String),

    #[error("json parse error at {path}: {message}")]
    Json { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("coach request failed: {0}")]
    Coach(String),

    #[error(transparent)]
    Telemetry(#[from] prometheus::Error),

    #[error("invalid config: {0}")]
    Config(String),
}

impl From<serde_path_to_error::Error<serde_json::Error>> for CoreError {
    fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
        CoreError::Json {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Json {
            path: ".".into(),
            message: e.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
