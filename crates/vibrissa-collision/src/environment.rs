//! The collision object whiskers interact with, and where it is over time.

use std::sync::Arc;

use tracing::info;
use vibrissa_math::{is_finite_vec3, Mat3, Vec3};

use crate::proximity::segment_proximity;
use crate::{Aabb, CollisionGeometryLoadError, Proximity, Result, Shape, TriMesh};

/// Object type selector, numbered as in the `OBJECT` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    None,
    Peg,
    Wall,
    ScannedMesh,
    Prism,
}

impl ObjectKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ObjectKind::None),
            1 => Some(ObjectKind::Peg),
            2 => Some(ObjectKind::Wall),
            3 => Some(ObjectKind::ScannedMesh),
            4 => Some(ObjectKind::Prism),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ObjectKind::None => 0,
            ObjectKind::Peg => 1,
            ObjectKind::Wall => 2,
            ObjectKind::ScannedMesh => 3,
            ObjectKind::Prism => 4,
        }
    }
}

/// Geometry source for a prism.
#[derive(Debug, Clone)]
pub enum PrismShape {
    Box { half_extents: Vec3 },
    /// A resolved mesh in the prism frame.
    Mesh(TriMesh),
}

/// Construction parameters of the collision object.
#[derive(Debug, Clone)]
pub enum ObjectSpec {
    None,
    /// Vertical peg moving at constant speed along `direction`.
    Peg {
        location: Vec3,
        direction: Vec3,
        speed: f64,
        radius: f64,
        height: f64,
    },
    /// Infinite wall through `point`; `normal` points into the free side.
    Wall { point: Vec3, normal: Vec3 },
    ScannedMesh {
        mesh: TriMesh,
        position: Vec3,
        orientation: Mat3,
    },
    Prism {
        shape: PrismShape,
        position: Vec3,
        orientation: Mat3,
    },
}

/// Pose of the object at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPose {
    pub position: Vec3,
    /// Maps object-frame vectors into the world frame.
    pub orientation: Mat3,
    pub linear_velocity: Vec3,
}

impl ObjectPose {
    fn fixed(position: Vec3, orientation: Mat3) -> Self {
        Self {
            position,
            orientation,
            linear_velocity: Vec3::zeros(),
        }
    }

    pub fn to_local(&self, p: &Vec3) -> Vec3 {
        self.orientation.transpose() * (p - self.position)
    }

    pub fn to_world(&self, p: &Vec3) -> Vec3 {
        self.position + self.orientation * p
    }
}

#[derive(Debug, Clone)]
enum Motion {
    Static(ObjectPose),
    /// Translation at constant velocity from `start` at t = 0.
    Linear { start: Vec3, velocity: Vec3 },
}

/// The collidable object of a run.
#[derive(Debug, Clone)]
pub struct CollisionEnvironment {
    kind: ObjectKind,
    body: Option<(Shape, Motion)>,
}

impl CollisionEnvironment {
    /// Validate `spec` and resolve its geometry.
    pub fn new(spec: ObjectSpec) -> Result<Self> {
        let (kind, body) = match spec {
            ObjectSpec::None => (ObjectKind::None, None),
            ObjectSpec::Peg {
                location,
                direction,
                speed,
                radius,
                height,
            } => {
                let direction = unit("peg direction", &direction)?;
                finite_vec("peg location", &location)?;
                positive("peg radius", radius)?;
                positive("peg height", height)?;
                if !speed.is_finite() {
                    return Err(CollisionGeometryLoadError::NonFinite {
                        field: "peg speed",
                        value: speed,
                    });
                }
                let shape = Shape::Capsule {
                    radius,
                    half_height: 0.5 * height,
                };
                let motion = Motion::Linear {
                    start: location,
                    velocity: direction * speed,
                };
                (ObjectKind::Peg, Some((shape, motion)))
            }
            ObjectSpec::Wall { point, normal } => {
                let normal = unit("wall normal", &normal)?;
                finite_vec("wall point", &point)?;
                let pose = ObjectPose::fixed(point, Mat3::identity());
                (
                    ObjectKind::Wall,
                    Some((Shape::HalfSpace { normal }, Motion::Static(pose))),
                )
            }
            ObjectSpec::ScannedMesh {
                mesh,
                position,
                orientation,
            } => {
                finite_vec("mesh position", &position)?;
                let pose = ObjectPose::fixed(position, orientation);
                (
                    ObjectKind::ScannedMesh,
                    Some((Shape::TriMesh(Arc::new(mesh)), Motion::Static(pose))),
                )
            }
            ObjectSpec::Prism {
                shape,
                position,
                orientation,
            } => {
                finite_vec("prism position", &position)?;
                let shape = match shape {
                    PrismShape::Box { half_extents } => {
                        for value in half_extents.iter() {
                            positive("prism half extent", *value)?;
                        }
                        Shape::Box { half_extents }
                    }
                    PrismShape::Mesh(mesh) => Shape::TriMesh(Arc::new(mesh)),
                };
                let pose = ObjectPose::fixed(position, orientation);
                (ObjectKind::Prism, Some((shape, Motion::Static(pose))))
            }
        };

        info!(object = ?kind, "collision environment ready");
        Ok(Self { kind, body })
    }

    /// An environment without any object.
    pub fn none() -> Self {
        Self {
            kind: ObjectKind::None,
            body: None,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// True when there is nothing to collide with.
    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    pub fn shape(&self) -> Option<&Shape> {
        self.body.as_ref().map(|(shape, _)| shape)
    }

    /// Object pose at time `t` (seconds); `None` without an object.
    pub fn pose_at(&self, t: f64) -> Option<ObjectPose> {
        let (_, motion) = self.body.as_ref()?;
        Some(match motion {
            Motion::Static(pose) => *pose,
            Motion::Linear { start, velocity } => ObjectPose {
                position: start + velocity * t,
                orientation: Mat3::identity(),
                linear_velocity: *velocity,
            },
        })
    }

    /// World bounds of the object at `pose`; `None` for unbounded objects.
    pub fn world_aabb(&self, pose: &ObjectPose) -> Option<Aabb> {
        let (shape, _) = self.body.as_ref()?;
        shape
            .local_aabb()
            .map(|b| b.transformed(&pose.position, &pose.orientation))
    }

    /// Closest approach of the world segment `ab` to the object at `pose`,
    /// if within `margin` of its surface.
    pub fn query_segment(
        &self,
        pose: &ObjectPose,
        a: &Vec3,
        b: &Vec3,
        margin: f64,
    ) -> Option<Proximity> {
        let (shape, _) = self.body.as_ref()?;
        let local = segment_proximity(shape, &pose.to_local(a), &pose.to_local(b), margin)?;
        Some(Proximity {
            point: pose.to_world(&local.point),
            normal: pose.orientation * local.normal,
            ..local
        })
    }
}

fn unit(field: &'static str, v: &Vec3) -> Result<Vec3> {
    let norm = v.norm();
    if is_finite_vec3(v) && norm > 1e-12 {
        Ok(v / norm)
    } else {
        Err(CollisionGeometryLoadError::ZeroVector(field))
    }
}

fn finite_vec(field: &'static str, v: &Vec3) -> Result<()> {
    match v.iter().find(|c| !c.is_finite()) {
        Some(&value) => Err(CollisionGeometryLoadError::NonFinite { field, value }),
        None => Ok(()),
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CollisionGeometryLoadError::NonPositive { field, value })
    }
}
