//! vibrissa: rigid-link biomechanics of rodent whisker arrays.
//!
//! This is the umbrella crate: it turns a [`Parameters`] table into a
//! [`Simulation`], runs the fixed-step loop and re-exports the core types of
//! the sub-crates.

pub mod assets;
pub mod config;
pub mod context;
pub mod error;
pub mod simulation;

pub use config::{ContactSettings, Parameters, SinusoidSettings};
pub use context::SimulationContext;
pub use error::{Result, VibrissaError};
pub use simulation::{
    HeadMotion, ObjectRef, RunStatus, RunSummary, SemiImplicitEulerSolver, Simulation,
    SimulationState, Solver,
};

pub use vibrissa_collision::{
    self, CollisionEnvironment, CollisionGeometryLoadError, ObjectKind, ObjectPose, ObjectSpec,
};
pub use vibrissa_contact::{self, Contact, ContactMaterial, ContactSolver};
pub use vibrissa_math::{self, units::GRAVITY_MM, Vec3};
pub use vibrissa_model::{self, Model, State};
pub use vibrissa_rigid::{self, semi_implicit_euler, update_kinematics, ArticulatedFactor};
pub use vibrissa_whisker::{
    self, ConfigurationError, Link, MaterialParams, RatHead, Whisker, WhiskerArray,
    WhiskerFactory, WhiskerId,
};
pub use vibrissa_world::{
    self, FrameRecord, FrameRecorder, HeadTrajectory, RecordingStats, TrajectoryError,
    WhiskingDriver, WhiskingMode, WhiskingTrajectory,
};
