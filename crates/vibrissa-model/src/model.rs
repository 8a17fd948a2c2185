//! Model definition: static description of one articulated chain.

use crate::{Body, Joint, JointDrive, ModelError, Result, State};
use vibrissa_math::{SpatialInertia, SpatialTransform, Vec3};

/// Static model describing the topology and parameters of a chain.
///
/// Every joint is a one-DOF revolute, so body `i`, joint `i` and velocity
/// DOF `i` share an index.
#[derive(Debug, Clone)]
pub struct Model {
    /// Bodies in the kinematic tree, parents before children.
    pub bodies: Vec<Body>,
    /// Joints connecting bodies.
    pub joints: Vec<Joint>,
    /// Gravity vector in world frame.
    pub gravity: Vec3,
    /// Number of velocity DOFs.
    pub nv: usize,
}

impl Model {
    /// Create a state with every spring joint at its rest angle.
    pub fn default_state(&self) -> State {
        let mut state = State::new(self.nv, self.bodies.len());
        for (i, joint) in self.joints.iter().enumerate() {
            state.q[i] = joint.drive.rest_angle();
        }
        state
    }

    /// Number of bodies.
    pub fn nbodies(&self) -> usize {
        self.bodies.len()
    }

    /// Total mass of every body in the chain.
    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.inertia.mass).sum()
    }
}

/// Builder for constructing models.
pub struct ModelBuilder {
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    gravity: Vec3,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    /// Start building a new model with no gravity.
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            joints: Vec::new(),
            gravity: Vec3::zeros(),
        }
    }

    /// Set the gravity vector.
    pub fn gravity(mut self, g: Vec3) -> Self {
        self.gravity = g;
        self
    }

    /// Add a body with a revolute joint attached to the given parent.
    ///
    /// `parent` is the index of the parent body, or -1 for the chain root.
    /// `parent_to_joint` is the transform from parent body frame to joint frame.
    pub fn add_revolute_body(
        mut self,
        name: &str,
        parent: i32,
        parent_to_joint: SpatialTransform,
        axis: Vec3,
        inertia: SpatialInertia,
        drive: JointDrive,
    ) -> Self {
        let joint_idx = self.joints.len();
        self.joints
            .push(Joint::revolute(parent_to_joint, axis).with_drive(drive));
        self.bodies.push(Body {
            name: name.to_string(),
            inertia,
            parent,
            joint_idx,
        });
        self
    }

    /// Validate and finish the model.
    pub fn build(self) -> Result<Model> {
        if self.bodies.is_empty() {
            return Err(ModelError::Empty);
        }
        for (i, body) in self.bodies.iter().enumerate() {
            let valid = body.parent == -1 || (body.parent >= 0 && (body.parent as usize) < i);
            if !valid {
                return Err(ModelError::InvalidParent {
                    body: i,
                    parent: body.parent,
                });
            }
            if !self.joints[body.joint_idx].axis.iter().all(|c| c.is_finite()) {
                return Err(ModelError::ZeroAxis { body: i });
            }
        }
        let nv = self.joints.len();
        Ok(Model {
            bodies: self.bodies,
            joints: self.joints,
            gravity: self.gravity,
            nv,
        })
    }
}
