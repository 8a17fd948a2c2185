//! Error types for trajectory loading and frame export.

use std::path::PathBuf;

/// A trajectory file or generator input was unusable.
#[derive(Debug, thiserror::Error)]
pub enum TrajectoryError {
    #[error("failed to read trajectory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trajectory has no header line")]
    MissingHeader,

    #[error("trajectory header must start with `time`, found `{0}`")]
    BadHeader(String),

    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: cannot parse `{value}` as a number")]
    Parse { line: usize, value: String },

    #[error("line {line}: non-finite value")]
    NonFinite { line: usize },

    #[error("line {line}: time {time} does not increase")]
    NonIncreasingTime { line: usize, time: f64 },

    #[error("trajectory has no samples")]
    Empty,

    #[error("no trajectory column for whisker `{0}`")]
    MissingColumn(String),

    #[error("active whisking needs a trajectory")]
    NoTrajectory,

    #[error("invalid generator parameter {field} = {value}")]
    InvalidGenerator { field: &'static str, value: f64 },
}

/// Frame recording could not be exported.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize frames: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for trajectory operations.
pub type Result<T> = std::result::Result<T, TrajectoryError>;
