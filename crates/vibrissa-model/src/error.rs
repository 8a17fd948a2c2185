//! Error types for vibrissa-model.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("body {body} references parent {parent}, which is not an earlier body")]
    InvalidParent { body: usize, parent: i32 },

    #[error("joint axis of body {body} has zero length")]
    ZeroAxis { body: usize },

    #[error("model has no bodies")]
    Empty,
}

pub type Result<T> = std::result::Result<T, ModelError>;
