//! Spatial algebra and math primitives for the vibrissa whisker simulator.
//!
//! Implements 6D spatial vectors, Plücker transforms and spatial inertia
//! following Featherstone's conventions, plus the unit system used by every
//! other crate (millimetres, kilograms, seconds).

pub mod quaternion;
pub mod spatial;
pub mod units;

pub use quaternion::Quat;
pub use spatial::{SpatialInertia, SpatialMat, SpatialTransform, SpatialVec};

use nalgebra as na;

/// 3D vector alias.
pub type Vec3 = na::Vector3<f64>;
/// 3x3 matrix alias.
pub type Mat3 = na::Matrix3<f64>;
/// 6D vector alias.
pub type Vec6 = na::Vector6<f64>;
/// 6x6 matrix alias.
pub type Mat6 = na::Matrix6<f64>;
/// Dynamic vector.
pub type DVec = na::DVector<f64>;
/// Dynamic matrix.
pub type DMat = na::DMatrix<f64>;

/// Cross-product matrix: [v]× such that [v]× w = v × w.
#[inline]
pub fn skew(v: &Vec3) -> Mat3 {
    Mat3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Returns true if every component of the vector is finite.
#[inline]
pub fn is_finite_vec3(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Rotation matrix from intrinsic yaw (Z), pitch (Y) and roll (X) angles.
///
/// `R = Rz(yaw) * Ry(pitch) * Rx(roll)`; maps local vectors to the parent frame.
pub fn rotation_from_ypr(yaw: f64, pitch: f64, roll: f64) -> Mat3 {
    let rz = na::Rotation3::from_axis_angle(&Vec3::z_axis(), yaw);
    let ry = na::Rotation3::from_axis_angle(&Vec3::y_axis(), pitch);
    let rx = na::Rotation3::from_axis_angle(&Vec3::x_axis(), roll);
    *(rz * ry * rx).matrix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ypr_yaw_only() {
        let r = rotation_from_ypr(std::f64::consts::FRAC_PI_2, 0.0, 0.0);
        let v = r * Vec3::x();
        assert_relative_eq!(v, Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_ypr_pitch_tilts_down() {
        // Positive pitch about +Y carries +X towards -Z.
        let r = rotation_from_ypr(0.0, 0.3, 0.0);
        let v = r * Vec3::x();
        assert!(v.z < 0.0);
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_finite_check() {
        assert!(is_finite_vec3(&Vec3::new(1.0, 2.0, 3.0)));
        assert!(!is_finite_vec3(&Vec3::new(1.0, f64::NAN, 3.0)));
        assert!(!is_finite_vec3(&Vec3::new(f64::INFINITY, 0.0, 0.0)));
    }
}
