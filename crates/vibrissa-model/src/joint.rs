//! Revolute joints and their drives.

use vibrissa_math::{skew, Mat3, SpatialTransform, SpatialVec, Vec3};

/// How a joint generates torque from its own state.
///
/// Every drive is treated implicitly by the dynamics: the stiffness and damping
/// terms are folded into the articulated inertia of the joint so that stiff
/// whisker springs stay stable at the substep sizes used by the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointDrive {
    /// No torque; the joint swings freely.
    Free,
    /// Torsional spring-damper about a rest angle.
    Spring {
        stiffness: f64,
        damping: f64,
        rest: f64,
    },
    /// PD servo tracking `State::target`.
    ///
    /// Gains scale with the articulated inertia seen by the joint, so the
    /// closed loop behaves like a second-order system with this natural
    /// frequency (rad/s) and damping ratio regardless of the load.
    Servo {
        natural_frequency: f64,
        damping_ratio: f64,
    },
}

/// Implicit drive contribution for one substep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveTerms {
    /// Added to the articulated inertia `D` of the joint.
    pub inertia: f64,
    /// Joint torque evaluated at the current state.
    pub torque: f64,
}

impl DriveTerms {
    pub const ZERO: DriveTerms = DriveTerms {
        inertia: 0.0,
        torque: 0.0,
    };
}

impl JointDrive {
    /// Implicit torque terms for a backward-Euler step of length `dt`.
    ///
    /// `articulated` is the joint-space inertia `D = Sᵀ Iᴬ S` before the drive
    /// is added.
    pub fn implicit_terms(
        &self,
        q: f64,
        v: f64,
        target: f64,
        articulated: f64,
        dt: f64,
    ) -> DriveTerms {
        match *self {
            JointDrive::Free => DriveTerms::ZERO,
            JointDrive::Spring {
                stiffness,
                damping,
                rest,
            } => DriveTerms {
                inertia: damping * dt + stiffness * dt * dt,
                torque: -stiffness * (q - rest + dt * v) - damping * v,
            },
            JointDrive::Servo {
                natural_frequency,
                damping_ratio,
            } => {
                let kp = articulated * natural_frequency * natural_frequency;
                let kd = 2.0 * damping_ratio * articulated * natural_frequency;
                DriveTerms {
                    inertia: kd * dt + kp * dt * dt,
                    torque: kp * (target - q - dt * v) - kd * v,
                }
            }
        }
    }

    /// Rest angle of a spring drive, zero otherwise.
    pub fn rest_angle(&self) -> f64 {
        match *self {
            JointDrive::Spring { rest, .. } => rest,
            _ => 0.0,
        }
    }
}

/// A single-DOF revolute joint connecting a body to its parent.
#[derive(Debug, Clone)]
pub struct Joint {
    /// Transform from parent body frame to joint frame (constant).
    pub parent_to_joint: SpatialTransform,
    /// Unit rotation axis in the joint frame.
    pub axis: Vec3,
    /// Torque source.
    pub drive: JointDrive,
}

impl Joint {
    /// Create a free revolute joint about `axis`.
    pub fn revolute(parent_to_joint: SpatialTransform, axis: Vec3) -> Self {
        Self {
            parent_to_joint,
            axis: axis.normalize(),
            drive: JointDrive::Free,
        }
    }

    /// Replace the drive.
    pub fn with_drive(mut self, drive: JointDrive) -> Self {
        self.drive = drive;
        self
    }

    /// Compute the joint transform for the given joint angle.
    ///
    /// The successor frame is rotated by +q about the axis, so the coordinate
    /// transform (predecessor → successor) uses R(-q) = R(q)ᵀ.
    pub fn joint_transform(&self, q: f64) -> SpatialTransform {
        let (s, c) = (-q).sin_cos();
        let ax = skew(&self.axis);
        let rot = Mat3::identity() + ax * s + ax * ax * (1.0 - c);
        SpatialTransform::new(rot, Vec3::zeros())
    }

    /// Motion subspace S (6D): pure rotation about the axis.
    pub fn motion_subspace(&self) -> SpatialVec {
        SpatialVec::new(self.axis, Vec3::zeros())
    }
}
