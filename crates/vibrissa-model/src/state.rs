//! Chain state: mutable per-substep data.

use vibrissa_math::{DVec, SpatialTransform, SpatialVec};

/// Mutable state of one articulated chain.
#[derive(Debug, Clone)]
pub struct State {
    /// Joint angles.
    pub q: DVec,
    /// Joint velocities.
    pub v: DVec,
    /// Servo targets, read by joints with a servo drive.
    pub target: DVec,
    /// World → chain mount transform. The root joint frame is placed relative
    /// to this frame.
    pub mount: SpatialTransform,

    // Cached quantities (filled by forward kinematics)
    /// World → body coordinate transforms for each body.
    pub body_xform: Vec<SpatialTransform>,
    /// Body spatial velocities, expressed in body coordinates.
    pub body_vel: Vec<SpatialVec>,
}

impl State {
    /// Create a zero-initialized state for `nv` DOFs and `nbodies` bodies.
    pub fn new(nv: usize, nbodies: usize) -> Self {
        Self {
            q: DVec::zeros(nv),
            v: DVec::zeros(nv),
            target: DVec::zeros(nv),
            mount: SpatialTransform::identity(),
            body_xform: vec![SpatialTransform::identity(); nbodies],
            body_vel: vec![SpatialVec::zero(); nbodies],
        }
    }

    /// True if joint state and cached transforms hold no NaN/inf.
    pub fn is_finite(&self) -> bool {
        self.q.iter().all(|c| c.is_finite())
            && self.v.iter().all(|c| c.is_finite())
            && self.body_xform.iter().all(|x| x.is_finite())
    }

    /// Compute total kinetic energy given the joint-space mass matrix.
    /// KE = 0.5 * vᵀ M v
    pub fn kinetic_energy(&self, mass_matrix: &vibrissa_math::DMat) -> f64 {
        0.5 * self.v.dot(&(mass_matrix * &self.v))
    }
}
