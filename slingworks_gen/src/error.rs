// Configuration errors.
//
// The generator has exactly one fatal failure class: a malformed catalog or
// parameter set handed in by the caller. Search exhaustion (no room for a
// platform, no valid row, fewer pigs than requested) is never an error; the
// stage that ran out of room degrades its output and logs a warning.
//
// See also: `config.rs` (`GenConfig::resolve`) which is the only producer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown block shape id {0:?} in probability table")]
    UnknownShapeId(String),

    #[error("unknown block shape name {0:?} in restricted shapes")]
    UnknownShapeName(String),

    #[error("unknown material id {0:?} in probability table")]
    UnknownMaterialId(String),

    #[error("negative weight {weight} for id {id:?}")]
    NegativeWeight { id: String, weight: f64 },

    #[error("probability table {0} has no positive weight")]
    EmptyTable(&'static str),

    #[error("invalid range for {name}: {detail}")]
    InvalidRange { name: &'static str, detail: String },

    #[error("malformed trajectory calibration: {0}")]
    MalformedCalibration(String),

    #[error("config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
