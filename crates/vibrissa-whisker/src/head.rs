//! The rat head frame that whisker bases are attached to.

use vibrissa_math::{rotation_from_ypr, Mat3, SpatialTransform, Vec3};

/// Rigid head pose in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatHead {
    pub position: Vec3,
    /// Maps head-frame vectors into the world frame.
    pub orientation: Mat3,
}

impl Default for RatHead {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Mat3::identity(),
        }
    }
}

impl RatHead {
    /// Head at `position` with heading angles `[yaw, pitch, roll]` in radians.
    pub fn from_ypr(position: [f64; 3], orient: [f64; 3]) -> Self {
        let [x, y, z] = position;
        let [yaw, pitch, roll] = orient;
        Self {
            position: Vec3::new(x, y, z),
            orientation: rotation_from_ypr(yaw, pitch, roll),
        }
    }

    /// World → head coordinate transform.
    pub fn transform(&self) -> SpatialTransform {
        SpatialTransform::from_pose(&self.orientation, self.position)
    }

    /// Head-frame point in world coordinates.
    pub fn to_world(&self, p: &Vec3) -> Vec3 {
        self.position + self.orientation * p
    }
}
