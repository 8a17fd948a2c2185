//! 6D spatial algebra following Featherstone's "Rigid Body Dynamics Algorithms".
//!
//! Convention: spatial vectors are [angular; linear].
//! A spatial motion vector (twist): [ω; v]
//! A spatial force vector (wrench): [τ; f]

use crate::{skew, Mat3, Mat6, Vec3, Vec6};

/// 6D spatial vector, either a motion vector (twist) or a force vector (wrench).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialVec {
    /// The underlying 6D vector [angular(3); linear(3)].
    pub data: Vec6,
}

impl SpatialVec {
    /// Create from angular and linear parts.
    #[inline]
    pub fn new(angular: Vec3, linear: Vec3) -> Self {
        Self {
            data: Vec6::new(
                angular.x, angular.y, angular.z, linear.x, linear.y, linear.z,
            ),
        }
    }

    /// Zero spatial vector.
    #[inline]
    pub fn zero() -> Self {
        Self {
            data: Vec6::zeros(),
        }
    }

    /// Angular (top 3) component.
    #[inline]
    pub fn angular(&self) -> Vec3 {
        Vec3::new(self.data[0], self.data[1], self.data[2])
    }

    /// Linear (bottom 3) component.
    #[inline]
    pub fn linear(&self) -> Vec3 {
        Vec3::new(self.data[3], self.data[4], self.data[5])
    }

    /// Spatial cross product for motion vectors: v ×ₘ w.
    pub fn cross_motion(&self, other: &SpatialVec) -> SpatialVec {
        let w = self.angular();
        let v = self.linear();
        let w2 = other.angular();
        let v2 = other.linear();
        SpatialVec::new(w.cross(&w2), w.cross(&v2) + v.cross(&w2))
    }

    /// Spatial cross product for force vectors: v ×f f.
    pub fn cross_force(&self, other: &SpatialVec) -> SpatialVec {
        let w = self.angular();
        let v = self.linear();
        let t = other.angular();
        let f = other.linear();
        SpatialVec::new(w.cross(&t) + v.cross(&f), w.cross(&f))
    }

    /// Dot product of two spatial vectors.
    #[inline]
    pub fn dot(&self, other: &SpatialVec) -> f64 {
        self.data.dot(&other.data)
    }

    /// Wrench produced by a linear force `force` acting at `point`, both in
    /// the same frame, taken about that frame's origin.
    #[inline]
    pub fn force_at_point(point: &Vec3, force: &Vec3) -> Self {
        Self::new(point.cross(force), *force)
    }

    /// Velocity (or acceleration, when velocity products vanish) of a point
    /// fixed to the body, for a motion vector expressed in the body frame.
    #[inline]
    pub fn point_velocity(&self, point: &Vec3) -> Vec3 {
        self.linear() + self.angular().cross(point)
    }

    /// True if no component is NaN or infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|c| c.is_finite())
    }
}

impl std::ops::Add for SpatialVec {
    type Output = SpatialVec;
    #[inline]
    fn add(self, rhs: SpatialVec) -> SpatialVec {
        SpatialVec {
            data: self.data + rhs.data,
        }
    }
}

impl std::ops::AddAssign for SpatialVec {
    #[inline]
    fn add_assign(&mut self, rhs: SpatialVec) {
        self.data += rhs.data;
    }
}

impl std::ops::Sub for SpatialVec {
    type Output = SpatialVec;
    #[inline]
    fn sub(self, rhs: SpatialVec) -> SpatialVec {
        SpatialVec {
            data: self.data - rhs.data,
        }
    }
}

impl std::ops::Mul<f64> for SpatialVec {
    type Output = SpatialVec;
    #[inline]
    fn mul(self, rhs: f64) -> SpatialVec {
        SpatialVec {
            data: self.data * rhs,
        }
    }
}

impl std::ops::Neg for SpatialVec {
    type Output = SpatialVec;
    #[inline]
    fn neg(self) -> SpatialVec {
        SpatialVec { data: -self.data }
    }
}

/// 6x6 spatial matrix (articulated inertias, transforms acting on spatial vectors).
#[derive(Debug, Clone, Copy)]
pub struct SpatialMat {
    pub data: Mat6,
}

impl SpatialMat {
    /// Create from a 6x6 nalgebra matrix.
    #[inline]
    pub fn from_mat6(data: Mat6) -> Self {
        Self { data }
    }

    /// Zero matrix.
    #[inline]
    pub fn zero() -> Self {
        Self {
            data: Mat6::zeros(),
        }
    }

    /// Multiply by a spatial vector.
    #[inline]
    pub fn mul_vec(&self, v: &SpatialVec) -> SpatialVec {
        SpatialVec {
            data: self.data * v.data,
        }
    }

    /// Outer product `a bᵀ` of two spatial vectors.
    #[inline]
    pub fn outer(a: &SpatialVec, b: &SpatialVec) -> SpatialMat {
        SpatialMat {
            data: a.data * b.data.transpose(),
        }
    }

    /// Congruence transform `Xᵀ I X` for a Plücker motion transform X.
    ///
    /// Moves an inertia expressed in a child frame into its parent frame.
    #[inline]
    pub fn to_parent(&self, x: &SpatialTransform) -> SpatialMat {
        let x_mot = x.to_motion_matrix();
        SpatialMat {
            data: x_mot.transpose() * self.data * x_mot,
        }
    }
}

impl std::ops::Add for SpatialMat {
    type Output = SpatialMat;
    #[inline]
    fn add(self, rhs: SpatialMat) -> SpatialMat {
        SpatialMat {
            data: self.data + rhs.data,
        }
    }
}

impl std::ops::AddAssign for SpatialMat {
    #[inline]
    fn add_assign(&mut self, rhs: SpatialMat) {
        self.data += rhs.data;
    }
}

impl std::ops::Sub for SpatialMat {
    type Output = SpatialMat;
    #[inline]
    fn sub(self, rhs: SpatialMat) -> SpatialMat {
        SpatialMat {
            data: self.data - rhs.data,
        }
    }
}

impl std::ops::Mul<f64> for SpatialMat {
    type Output = SpatialMat;
    #[inline]
    fn mul(self, rhs: f64) -> SpatialMat {
        SpatialMat {
            data: self.data * rhs,
        }
    }
}

/// Plücker transform: rigid body transformation acting on spatial vectors.
///
/// Represents a coordinate transform from frame A to frame B.
/// Stored as rotation R (A coordinates → B coordinates) and translation p
/// (position of B's origin expressed in A).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialTransform {
    /// Rotation from frame A to frame B.
    pub rot: Mat3,
    /// Position of frame B's origin expressed in frame A.
    pub pos: Vec3,
}

impl SpatialTransform {
    /// Create from rotation matrix and translation.
    pub fn new(rot: Mat3, pos: Vec3) -> Self {
        Self { rot, pos }
    }

    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            rot: Mat3::identity(),
            pos: Vec3::zeros(),
        }
    }

    /// Pure translation.
    pub fn translation(pos: Vec3) -> Self {
        Self {
            rot: Mat3::identity(),
            pos,
        }
    }

    /// Transform into a frame B given B's pose in A.
    ///
    /// `orientation` maps B-frame vectors into A (the usual "pose" rotation),
    /// `origin` is B's origin in A.
    pub fn from_pose(orientation: &Mat3, origin: Vec3) -> Self {
        Self {
            rot: orientation.transpose(),
            pos: origin,
        }
    }

    /// Orientation of frame B expressed in A (maps B vectors into A).
    #[inline]
    pub fn orientation(&self) -> Mat3 {
        self.rot.transpose()
    }

    /// Get the 6x6 Plücker transform matrix for motion vectors.
    ///
    /// X = |   R     0 |
    ///     | -R[p]×  R |
    pub fn to_motion_matrix(&self) -> Mat6 {
        let r = self.rot;
        let neg_rpx = -r * skew(&self.pos);

        let mut m = Mat6::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
        m.fixed_view_mut::<3, 3>(3, 0).copy_from(&neg_rpx);
        m.fixed_view_mut::<3, 3>(3, 3).copy_from(&r);
        m
    }

    /// Transform a spatial motion vector from frame A to frame B.
    pub fn apply_motion(&self, v: &SpatialVec) -> SpatialVec {
        let w = v.angular();
        let vel = v.linear();
        SpatialVec::new(self.rot * w, self.rot * (vel - self.pos.cross(&w)))
    }

    /// Transform a spatial force vector from frame A to frame B.
    pub fn apply_force(&self, f: &SpatialVec) -> SpatialVec {
        let tau = f.angular();
        let force = f.linear();
        SpatialVec::new(self.rot * (tau - self.pos.cross(&force)), self.rot * force)
    }

    /// Inverse transform a spatial motion vector (from B to A).
    pub fn inv_apply_motion(&self, v: &SpatialVec) -> SpatialVec {
        let rt = self.rot.transpose();
        let w = rt * v.angular();
        SpatialVec::new(w, rt * v.linear() + self.pos.cross(&w))
    }

    /// Inverse transform a spatial force vector (from B to A).
    pub fn inv_apply_force(&self, f: &SpatialVec) -> SpatialVec {
        let rt = self.rot.transpose();
        let force = rt * f.linear();
        SpatialVec::new(rt * f.angular() + self.pos.cross(&force), force)
    }

    /// Compose two transforms: `self ∘ other` (`other` applied first).
    pub fn compose(&self, other: &SpatialTransform) -> SpatialTransform {
        SpatialTransform {
            rot: self.rot * other.rot,
            pos: other.pos + other.rot.transpose() * self.pos,
        }
    }

    /// Inverse of this transform.
    pub fn inverse(&self) -> SpatialTransform {
        SpatialTransform {
            rot: self.rot.transpose(),
            pos: -(self.rot * self.pos),
        }
    }

    /// Express a point given in B coordinates in A coordinates.
    #[inline]
    pub fn point_to_parent(&self, p: &Vec3) -> Vec3 {
        self.pos + self.rot.transpose() * p
    }

    /// Express a point given in A coordinates in B coordinates.
    #[inline]
    pub fn point_from_parent(&self, p: &Vec3) -> Vec3 {
        self.rot * (p - self.pos)
    }

    /// Rotate a free vector from B coordinates into A coordinates.
    #[inline]
    pub fn vector_to_parent(&self, v: &Vec3) -> Vec3 {
        self.rot.transpose() * v
    }

    /// Rotate a free vector from A coordinates into B coordinates.
    #[inline]
    pub fn vector_from_parent(&self, v: &Vec3) -> Vec3 {
        self.rot * v
    }

    /// True if rotation and translation are free of NaN/inf.
    pub fn is_finite(&self) -> bool {
        self.rot.iter().all(|c| c.is_finite()) && self.pos.iter().all(|c| c.is_finite())
    }
}

/// Spatial inertia of a rigid body.
///
/// Stored as mass, centre of mass offset (body frame) and rotational inertia
/// about the centre of mass. Converted to a 6x6 matrix about the body origin
/// on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialInertia {
    /// Mass of the body.
    pub mass: f64,
    /// Center of mass position in body frame.
    pub com: Vec3,
    /// Rotational inertia about the center of mass (3x3 symmetric).
    pub inertia: Mat3,
}

impl SpatialInertia {
    /// Create a spatial inertia with the given mass, CoM offset, and inertia matrix.
    pub fn new(mass: f64, com: Vec3, inertia: Mat3) -> Self {
        Self { mass, com, inertia }
    }

    /// A body without mass. Used for gimbal frames between whisker links.
    pub fn massless() -> Self {
        Self {
            mass: 0.0,
            com: Vec3::zeros(),
            inertia: Mat3::zeros(),
        }
    }

    /// Solid cylinder of the given mass lying along +X from the body origin.
    ///
    /// The centre of mass sits at `(length / 2, 0, 0)`.
    pub fn cylinder_x(mass: f64, radius: f64, length: f64) -> Self {
        let axial = 0.5 * mass * radius * radius;
        let transverse = mass * (3.0 * radius * radius + length * length) / 12.0;
        Self {
            mass,
            com: Vec3::new(0.5 * length, 0.0, 0.0),
            inertia: Mat3::from_diagonal(&Vec3::new(axial, transverse, transverse)),
        }
    }

    /// Moment of inertia about an axis through the body origin.
    pub fn moment_about_origin(&self, axis: &Vec3) -> f64 {
        let a = axis.normalize();
        let r_perp = self.com - a * a.dot(&self.com);
        a.dot(&(self.inertia * a)) + self.mass * r_perp.norm_squared()
    }

    /// Convert to 6x6 spatial inertia matrix (about the body frame origin).
    ///
    /// I_spatial = | I + m[c]×[c]×ᵀ   m[c]× |
    ///             | m[c]×ᵀ             mE   |
    pub fn to_matrix(&self) -> SpatialMat {
        let cx = skew(&self.com);
        let m = self.mass;

        let mut mat = Mat6::zeros();
        let top_left = self.inertia + cx * cx.transpose() * m;
        mat.fixed_view_mut::<3, 3>(0, 0).copy_from(&top_left);
        let mcx = cx * m;
        mat.fixed_view_mut::<3, 3>(0, 3).copy_from(&mcx);
        mat.fixed_view_mut::<3, 3>(3, 0).copy_from(&mcx.transpose());
        mat.fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&(Mat3::identity() * m));

        SpatialMat::from_mat6(mat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra as na;

    #[test]
    fn test_spatial_vec_cross_motion() {
        let v1 = SpatialVec::new(Vec3::new(0.0, 0.0, 1.0), Vec3::zeros());
        let v2 = SpatialVec::new(Vec3::new(1.0, 0.0, 0.0), Vec3::zeros());
        let result = v1.cross_motion(&v2);
        // [0,0,1] × [1,0,0] = [0,1,0]
        assert_relative_eq!(result.angular().y, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_transform_inverse_roundtrip() {
        let xf = SpatialTransform::new(
            *na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), 0.5).matrix(),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let v = SpatialVec::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));

        let back = xf.inv_apply_motion(&xf.apply_motion(&v));
        assert_relative_eq!(back.data, v.data, epsilon = 1e-10);
    }

    #[test]
    fn test_compose_translations() {
        let xf1 = SpatialTransform::translation(Vec3::new(1.0, 0.0, 0.0));
        let xf2 = SpatialTransform::translation(Vec3::new(0.0, 2.0, 0.0));
        let composed = xf1.compose(&xf2);
        assert_relative_eq!(composed.pos, Vec3::new(1.0, 2.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn test_pose_point_mapping() {
        // Frame B rotated 90° about Z and shifted by (1, 0, 0).
        let quarter = std::f64::consts::FRAC_PI_2;
        let orientation = *na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), quarter).matrix();
        let xf = SpatialTransform::from_pose(&orientation, Vec3::new(1.0, 0.0, 0.0));

        // B's local +X points along A's +Y.
        let p = xf.point_to_parent(&Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(p, Vec3::new(1.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(xf.point_from_parent(&p), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(xf.orientation(), orientation, epsilon = 1e-12);
    }

    #[test]
    fn test_force_at_point() {
        let f = SpatialVec::force_at_point(&Vec3::new(1.0, 0.0, 0.0), &Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(f.angular(), Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(f.linear(), Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_cylinder_inertia() {
        let si = SpatialInertia::cylinder_x(2.0, 0.1, 1.0);
        assert_relative_eq!(si.com, Vec3::new(0.5, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(si.inertia[(0, 0)], 0.01, epsilon = 1e-12);
        let transverse = 2.0 * (3.0 * 0.01 + 1.0) / 12.0;
        assert_relative_eq!(si.inertia[(2, 2)], transverse, epsilon = 1e-12);
        // Parallel axis: rod about its end.
        let about_end = si.moment_about_origin(&Vec3::z());
        assert_relative_eq!(about_end, transverse + 2.0 * 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_massless_matrix_is_zero() {
        let m = SpatialInertia::massless().to_matrix();
        assert_relative_eq!(m.data.norm(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_finite_checks() {
        let mut xf = SpatialTransform::identity();
        assert!(xf.is_finite());
        xf.pos.x = f64::NAN;
        assert!(!xf.is_finite());
        let v = SpatialVec::new(Vec3::new(f64::INFINITY, 0.0, 0.0), Vec3::zeros());
        assert!(!v.is_finite());
    }
}
