//! Top-level error type.

use std::path::PathBuf;

use thiserror::Error;
use vibrissa_collision::CollisionGeometryLoadError;
use vibrissa_whisker::ConfigurationError;
use vibrissa_world::{RecordError, TrajectoryError};

#[derive(Debug, Error)]
pub enum VibrissaError {
    #[error("invalid parameter {key}: {message}")]
    Parameter { key: &'static str, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    #[error(transparent)]
    Geometry(#[from] CollisionGeometryLoadError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("whisker {whisker} diverged at t = {time} s, last valid frame {last_valid_frame}")]
    SimulationDivergence {
        last_valid_frame: u64,
        whisker: String,
        time: f64,
    },
}

impl VibrissaError {
    pub(crate) fn parameter(key: &'static str, message: impl Into<String>) -> Self {
        VibrissaError::Parameter {
            key,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VibrissaError>;
