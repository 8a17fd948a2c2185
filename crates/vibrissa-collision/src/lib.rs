//! Collision geometry for vibrissa.
//!
//! A [`CollisionEnvironment`] holds the single rigid object whiskers can
//! touch (peg, wall, scanned mesh or prism) and answers where it is at a
//! given time. Link segments are tested against it with
//! [`CollisionEnvironment::query_segment`].

pub mod environment;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod proximity;

pub use environment::{CollisionEnvironment, ObjectKind, ObjectPose, ObjectSpec, PrismShape};
pub use error::{CollisionGeometryLoadError, Result};
pub use geometry::{Aabb, Shape};
pub use mesh::TriMesh;

use vibrissa_math::Vec3;

/// Closest approach between a link axis and the object surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    /// Signed distance from the link axis to the surface (negative when the
    /// axis is inside the object).
    pub distance: f64,
    /// Closest point on the link axis, world frame.
    pub point: Vec3,
    /// Unit surface normal pointing from the object towards the link.
    pub normal: Vec3,
    /// Position of `point` along the segment, 0 at its start and 1 at its end.
    pub segment_param: f64,
}
