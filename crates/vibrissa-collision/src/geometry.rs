//! Geometry primitives for collision detection.

use std::sync::Arc;

use vibrissa_math::{Mat3, Vec3};

use crate::TriMesh;

/// Collision geometry in its local frame.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Capsule along local Z, centred on the origin.
    Capsule { radius: f64, half_height: f64 },
    /// Solid half-space `n · p <= 0`; `normal` is the outward unit normal.
    HalfSpace { normal: Vec3 },
    /// Box with half-extents, centred on the origin.
    Box { half_extents: Vec3 },
    /// Triangle surface (two-sided).
    TriMesh(Arc<TriMesh>),
}

impl Shape {
    /// Local-frame bounds; `None` for unbounded shapes.
    pub fn local_aabb(&self) -> Option<Aabb> {
        match self {
            Shape::Capsule {
                radius,
                half_height,
            } => {
                let r = Vec3::new(*radius, *radius, half_height + radius);
                Some(Aabb::new(-r, r))
            }
            Shape::HalfSpace { .. } => None,
            Shape::Box { half_extents } => Some(Aabb::new(-half_extents, *half_extents)),
            Shape::TriMesh(mesh) => Some(mesh.bounds()),
        }
    }

    /// Signed distance and outward normal at a local point, for convex
    /// solids. Meshes have no inside and return `None`.
    pub fn signed_distance(&self, p: &Vec3) -> Option<(f64, Vec3)> {
        match self {
            Shape::Capsule {
                radius,
                half_height,
            } => {
                let axis_point = Vec3::new(0.0, 0.0, p.z.clamp(-half_height, *half_height));
                let offset = p - axis_point;
                let dist = offset.norm();
                let normal = if dist > 1e-12 {
                    offset / dist
                } else {
                    Vec3::x()
                };
                Some((dist - radius, normal))
            }
            Shape::HalfSpace { normal } => Some((normal.dot(p), *normal)),
            Shape::Box { half_extents } => Some(box_signed_distance(half_extents, p)),
            Shape::TriMesh(_) => None,
        }
    }
}

fn box_signed_distance(half_extents: &Vec3, p: &Vec3) -> (f64, Vec3) {
    let q = p.abs() - half_extents;
    let outside = q.sup(&Vec3::zeros());
    let out_len = outside.norm();
    if out_len > 0.0 {
        let clamped = p.sup(&(-half_extents)).inf(half_extents);
        return (out_len, (p - clamped) / out_len);
    }
    // Inside: leave through the nearest face.
    let axis = q.imax();
    let mut normal = Vec3::zeros();
    normal[axis] = if p[axis] >= 0.0 { 1.0 } else { -1.0 };
    (q[axis], normal)
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min/max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. `None` for an empty slice.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Aabb::new(first, first), |acc, p| Aabb {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    /// Box grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vec3::repeat(margin);
        Self::new(self.min - m, self.max + m)
    }

    pub fn merged(&self, other: &Aabb) -> Self {
        Self::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Bounds of this box after rotating by `rot` and shifting by `pos`.
    pub fn transformed(&self, pos: &Vec3, rot: &Mat3) -> Self {
        let c = pos + rot * self.center();
        let h = rot.abs() * self.half_extents();
        Self::new(c - h, c + h)
    }

    /// Check if two AABBs overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_distance_outside_and_inside() {
        let shape = Shape::Box {
            half_extents: Vec3::new(1.0, 2.0, 3.0),
        };
        let (d, n) = shape.signed_distance(&Vec3::new(3.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(d, 2.0, epsilon = 1e-12);
        assert_relative_eq!(n, Vec3::x(), epsilon = 1e-12);

        let (d, n) = shape.signed_distance(&Vec3::new(0.0, -1.5, 0.0)).unwrap();
        assert_relative_eq!(d, -0.5, epsilon = 1e-12);
        assert_relative_eq!(n, -Vec3::y(), epsilon = 1e-12);

        // Past a corner.
        let (d, _) = shape.signed_distance(&Vec3::new(4.0, 6.0, 0.0)).unwrap();
        assert_relative_eq!(d, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_capsule_distance() {
        let shape = Shape::Capsule {
            radius: 1.0,
            half_height: 5.0,
        };
        let (d, n) = shape.signed_distance(&Vec3::new(0.0, 3.0, 2.0)).unwrap();
        assert_relative_eq!(d, 2.0, epsilon = 1e-12);
        assert_relative_eq!(n, Vec3::y(), epsilon = 1e-12);
        let (d, _) = shape.signed_distance(&Vec3::new(0.0, 0.0, 8.0)).unwrap();
        assert_relative_eq!(d, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_aabb_transformed() {
        let b = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let rot = vibrissa_math::rotation_from_ypr(std::f64::consts::FRAC_PI_2, 0.0, 0.0);
        let t = b.transformed(&Vec3::new(10.0, 0.0, 0.0), &rot);
        assert_relative_eq!(t.min, Vec3::new(8.0, -1.0, -3.0), epsilon = 1e-12);
        assert_relative_eq!(t.max, Vec3::new(12.0, 1.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_aabb_from_points() {
        let pts = [Vec3::new(1.0, 5.0, -1.0), Vec3::new(-2.0, 0.0, 4.0)];
        let b = Aabb::from_points(&pts).unwrap();
        assert_eq!(b.min, Vec3::new(-2.0, 0.0, -1.0));
        assert_eq!(b.max, Vec3::new(1.0, 5.0, 4.0));
        assert!(Aabb::from_points(&[] as &[Vec3]).is_none());
        assert!(b.overlaps(&b.expanded(1.0)));
    }
}
