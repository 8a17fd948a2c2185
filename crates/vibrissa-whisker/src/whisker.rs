//! A single whisker: a named chain of rigid links.

use vibrissa_math::{Mat3, SpatialInertia, SpatialTransform, Vec3};
use vibrissa_model::{JointDrive, Model, ModelBuilder, State};

use crate::{LinkMaterial, MaterialProfile, RatHead, Result, Side};

/// World-frame snapshot of one link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    /// Proximal joint position.
    pub position: Vec3,
    /// Maps link-frame vectors (x along the link) into the world frame.
    pub orientation: Mat3,
    /// Velocity of the proximal joint.
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub material: LinkMaterial,
}

impl Link {
    pub fn mass(&self) -> f64 {
        self.material.mass
    }

    pub fn radius(&self) -> f64 {
        self.material.radius
    }

    pub fn length(&self) -> f64 {
        self.material.length
    }

    /// Distal end of the link's axis.
    pub fn distal_end(&self) -> Vec3 {
        self.position + self.orientation * Vec3::new(self.material.length, 0.0, 0.0)
    }

    pub fn center_of_mass(&self) -> Vec3 {
        self.position + self.orientation * Vec3::new(0.5 * self.material.length, 0.0, 0.0)
    }
}

/// One whisker of the array.
///
/// Body layout of the chain: link 0 sits on the whisking joint (z axis of
/// the base frame). Each later link `i` hangs off the distal end of link
/// `i − 1` through a massless gimbal body (out-of-plane hinge, y axis)
/// followed by the link body itself (in-plane hinge, z axis). Link `i` is
/// therefore body `2i` and the chain has `2N − 1` bodies.
#[derive(Debug, Clone)]
pub struct Whisker {
    name: String,
    plan_index: usize,
    side: Side,
    attachment: SpatialTransform,
    profile: MaterialProfile,
    model: Model,
    state: State,
}

impl Whisker {
    pub(crate) fn new(
        name: &str,
        plan_index: usize,
        side: Side,
        attachment: SpatialTransform,
        profile: MaterialProfile,
        gravity: Vec3,
    ) -> Result<Self> {
        let links = profile.links();
        let base = links[0];
        let mut builder = ModelBuilder::new().gravity(gravity).add_revolute_body(
            &format!("{name}/link0"),
            -1,
            SpatialTransform::identity(),
            Vec3::z(),
            base.inertia,
            JointDrive::Spring {
                stiffness: base.stiffness,
                damping: base.damping,
                rest: 0.0,
            },
        );

        for (i, pair) in links.windows(2).enumerate() {
            let (prev, link) = (pair[0], pair[1]);
            let parent = (2 * i) as i32;
            builder = builder
                .add_revolute_body(
                    &format!("{name}/gimbal{}", i + 1),
                    parent,
                    SpatialTransform::translation(Vec3::new(prev.length, 0.0, 0.0)),
                    Vec3::y(),
                    SpatialInertia::massless(),
                    JointDrive::Spring {
                        stiffness: link.stiffness,
                        damping: link.damping,
                        rest: 0.0,
                    },
                )
                .add_revolute_body(
                    &format!("{name}/link{}", i + 1),
                    parent + 1,
                    SpatialTransform::identity(),
                    Vec3::z(),
                    link.inertia,
                    JointDrive::Spring {
                        stiffness: link.stiffness,
                        damping: link.damping,
                        rest: side.sign() * link.rest_angle,
                    },
                );
        }

        let model = builder.build()?;
        let state = model.default_state();
        let mut whisker = Self {
            name: name.to_string(),
            plan_index,
            side,
            attachment,
            profile,
            model,
            state,
        };
        whisker.set_head(&RatHead::default());
        Ok(whisker)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plan_index(&self) -> usize {
        self.plan_index
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Head → base transform.
    pub fn attachment(&self) -> &SpatialTransform {
        &self.attachment
    }

    pub fn profile(&self) -> &MaterialProfile {
        &self.profile
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Model and state borrowed together for a dynamics step.
    pub fn parts_mut(&mut self) -> (&Model, &mut State) {
        (&self.model, &mut self.state)
    }

    pub fn num_links(&self) -> usize {
        self.profile.len()
    }

    /// Body index of link `i`.
    #[inline]
    pub fn link_body(&self, i: usize) -> usize {
        2 * i
    }

    /// True when every link is massless; such whiskers are moved kinematically.
    pub fn is_kinematic(&self) -> bool {
        self.profile.total_mass() == 0.0
    }

    pub fn total_mass(&self) -> f64 {
        self.model.total_mass()
    }

    /// Re-seat the chain on the head for the current substep.
    ///
    /// Refreshes the cached link frames.
    pub fn set_head(&mut self, head: &RatHead) {
        self.state.mount = self.attachment.compose(&head.transform());
        vibrissa_rigid::update_kinematics(&self.model, &mut self.state);
    }

    /// Recompute cached link frames from the joint state.
    pub fn update_kinematics(&mut self) {
        vibrissa_rigid::update_kinematics(&self.model, &mut self.state);
    }

    /// Whisking angle of the base joint.
    ///
    /// Whisking angles are mirrored on the right side, so the same angle
    /// gives mirror-symmetric poses on both sides of the head.
    pub fn base_angle(&self) -> f64 {
        self.side.sign() * self.state.q[0]
    }

    /// Whisking angle the base servo should track.
    pub fn set_base_target(&mut self, angle: f64) {
        self.state.target[0] = self.side.sign() * angle;
    }

    /// Place the base joint at whisking angle `angle` and make it the
    /// resting angle of the follicle spring.
    pub fn set_initial_base_angle(&mut self, angle: f64) {
        let angle = self.side.sign() * angle;
        self.state.q[0] = angle;
        self.state.v[0] = 0.0;
        self.state.target[0] = angle;
        if let JointDrive::Spring { rest, .. } = &mut self.model.joints[0].drive {
            *rest = angle;
        }
        self.update_kinematics();
    }

    /// Drive the base joint with a servo instead of the follicle spring.
    pub fn engage_servo(&mut self, natural_frequency: f64, damping_ratio: f64) {
        self.model.joints[0].drive = JointDrive::Servo {
            natural_frequency,
            damping_ratio,
        };
    }

    pub fn base_drive(&self) -> JointDrive {
        self.model.joints[0].drive
    }

    /// Advance a massless whisker by `dt`.
    ///
    /// The base snaps to the servo target (or holds still without a servo)
    /// and every bending joint stays at its rest angle.
    pub fn step_kinematic(&mut self, dt: f64) {
        if let JointDrive::Servo { .. } = self.model.joints[0].drive {
            let target = self.state.target[0];
            self.state.v[0] = if dt > 0.0 {
                (target - self.state.q[0]) / dt
            } else {
                0.0
            };
            self.state.q[0] = target;
        } else {
            self.state.v[0] = 0.0;
        }
        for (j, joint) in self.model.joints.iter().enumerate().skip(1) {
            self.state.q[j] = joint.drive.rest_angle();
            self.state.v[j] = 0.0;
        }
        self.update_kinematics();
    }

    /// World-frame snapshot of link `i`, from the cached kinematics.
    pub fn link(&self, i: usize) -> Option<Link> {
        let material = *self.profile.links().get(i)?;
        let body = self.link_body(i);
        let xf = &self.state.body_xform[body];
        let vel = &self.state.body_vel[body];
        Some(Link {
            position: xf.pos,
            orientation: xf.orientation(),
            linear_velocity: xf.vector_to_parent(&vel.linear()),
            angular_velocity: xf.vector_to_parent(&vel.angular()),
            material,
        })
    }

    /// All links, base first.
    pub fn links(&self) -> impl Iterator<Item = Link> + '_ {
        (0..self.num_links()).filter_map(move |i| self.link(i))
    }

    /// Kinetic energy of the chain (CRBA).
    pub fn kinetic_energy(&self) -> f64 {
        vibrissa_rigid::kinetic_energy(&self.model, &self.state)
    }

    /// Tip position in world coordinates.
    pub fn tip(&self) -> Vec3 {
        let last = self.num_links() - 1;
        self.link(last)
            .map(|l| l.distal_end())
            .unwrap_or_else(|| self.state.mount.pos)
    }
}
