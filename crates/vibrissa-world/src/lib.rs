//! Time-dependent inputs and outputs of a whisker simulation.
//!
//! Inputs are sampled trajectories (whisking base angles, head pose) read
//! with hold-last semantics; the output side is a per-frame recording of
//! every link's world pose.

pub mod error;
pub mod head;
pub mod recorder;
mod table;
pub mod whisking;

pub use error::{RecordError, Result, TrajectoryError};
pub use head::{HeadSample, HeadTrajectory};
pub use recorder::{FrameRecord, FrameRecorder, LinkRecord, RecordingStats, WhiskerRecord};
pub use whisking::{
    TrajectoryBoundary, WhiskingDriver, WhiskingMode, WhiskingTarget, WhiskingTrajectory,
};
