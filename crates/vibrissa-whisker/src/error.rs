//! Error types for whisker construction.

use thiserror::Error;
use vibrissa_model::ModelError;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("a whisker needs at least 2 links, got {num_links}")]
    TooFewLinks { num_links: usize },

    #[error("{names} whisker names but {indices} plan indices")]
    LengthMismatch { names: usize, indices: usize },

    #[error("whisker {name}: plan index {index} is outside the {plan_size}-entry plan")]
    PlanIndexOutOfRange {
        name: String,
        index: usize,
        plan_size: usize,
    },

    #[error("duplicate whisker name {0}")]
    DuplicateName(String),

    #[error("whisker name {0:?} must start with L or R")]
    InvalidSide(String),

    #[error("material parameter {field} must be finite and positive, got {value}")]
    InvalidMaterial { field: &'static str, value: f64 },

    #[error("whisker shape parameter {field} is invalid: {value}")]
    InvalidShape { field: &'static str, value: f64 },

    #[error("diameter scale must be finite and positive, got {0}")]
    InvalidScale(f64),

    #[error("chain model: {0}")]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;
