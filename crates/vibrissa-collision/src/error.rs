//! Error types for collision geometry construction.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollisionGeometryLoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("mesh has no triangles")]
    EmptyMesh,

    #[error("mesh triangles all have zero area")]
    DegenerateMesh,

    #[error("face {face} references vertex {index}, mesh has {vertices} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: usize,
        vertices: usize,
    },

    #[error("vertex {0} is not finite")]
    NonFiniteVertex(usize),

    #[error("{0} must be a non-zero finite vector")]
    ZeroVector(&'static str),

    #[error("{field} must be finite and positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, CollisionGeometryLoadError>;
