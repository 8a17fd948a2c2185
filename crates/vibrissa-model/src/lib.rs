//! Model and state types for vibrissa articulated chains.
//!
//! `Model` is the static description of one whisker chain (topology, masses,
//! joint axes and drives). `State` is the mutable per-substep data
//! (joint positions, velocities, servo targets and cached link frames).

pub mod body;
pub mod error;
pub mod joint;
pub mod model;
pub mod state;

pub use body::Body;
pub use error::{ModelError, Result};
pub use joint::{DriveTerms, Joint, JointDrive};
pub use model::{Model, ModelBuilder};
pub use state::State;
