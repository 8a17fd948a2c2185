//! The fixed whisker arrangement plan.
//!
//! Thirty entries, rows A (dorsal) to E (ventral) and columns 0 (caudal) to
//! 5 (rostral); entry `row * 6 + col` carries label `<row><col>`. Values
//! describe the left side of the face in the head frame (x rostral, y left,
//! z dorsal), lengths in mm and angles in degrees. Right-side whiskers are
//! the mirror image through the sagittal (x-z) plane.
//!
//! The values are representative rat-sized figures, not measurements.

use vibrissa_math::{rotation_from_ypr, Mat3, SpatialTransform, Vec3};

use crate::WhiskerShape;

/// Number of entries in the plan; valid indices are `0..PLAN_SIZE`.
pub const PLAN_SIZE: usize = 30;

/// Columns per row.
pub const PLAN_COLUMNS: usize = 6;

/// Side of the face a whisker grows on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side encoded by the first letter of a whisker name (`L...`/`R...`).
    pub fn from_name(name: &str) -> Option<Side> {
        match name.chars().next() {
            Some('L') => Some(Side::Left),
            Some('R') => Some(Side::Right),
            _ => None,
        }
    }

    /// Orientation of in-plane angles relative to the left side.
    ///
    /// The right base frame is the mirror of the left one, so curvature and
    /// whisking angles about its z axis change sign.
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// One slot of the arrangement plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanEntry {
    pub label: &'static str,
    /// Follicle position, left side.
    pub base_position: [f64; 3],
    pub length: f64,
    pub base_radius: f64,
    pub tip_radius: f64,
    /// Coefficient of the rest shape `y = a s²`.
    pub curvature: f64,
    /// Azimuth about the head z axis.
    pub theta: f64,
    /// Elevation above the horizontal plane.
    pub phi: f64,
    /// Roll about the whisker's own axis; orients the curvature plane.
    pub zeta: f64,
}

impl PlanEntry {
    /// Shape with radii scaled by the diameter factor `blow`.
    pub fn shape(&self, blow: f64) -> WhiskerShape {
        WhiskerShape {
            length: self.length,
            base_radius: self.base_radius,
            tip_radius: self.tip_radius,
            curvature: self.curvature,
        }
        .scaled(blow)
    }

    /// Head → whisker base transform.
    ///
    /// The base frame has +x along the whisker, +y towards the concave side
    /// and +z along the whisking axis.
    pub fn attachment(&self, side: Side) -> SpatialTransform {
        let rot = rotation_from_ypr(
            self.theta.to_radians(),
            -self.phi.to_radians(),
            self.zeta.to_radians(),
        );
        let [x, y, z] = self.base_position;
        let pos = Vec3::new(x, y, z);
        match side {
            Side::Left => SpatialTransform::from_pose(&rot, pos),
            Side::Right => {
                let mirror = Mat3::from_diagonal(&Vec3::new(1.0, -1.0, 1.0));
                SpatialTransform::from_pose(&(mirror * rot * mirror), mirror * pos)
            }
        }
    }
}

/// Look up a plan entry by index.
pub fn plan_entry(index: usize) -> Option<&'static PlanEntry> {
    WHISKER_PLAN.get(index)
}

#[allow(clippy::too_many_arguments)]
const fn entry(
    label: &'static str,
    base_position: [f64; 3],
    length: f64,
    base_radius: f64,
    tip_radius: f64,
    curvature: f64,
    theta: f64,
    phi: f64,
    zeta: f64,
) -> PlanEntry {
    PlanEntry {
        label,
        base_position,
        length,
        base_radius,
        tip_radius,
        curvature,
        theta,
        phi,
        zeta,
    }
}

#[rustfmt::skip]
pub const WHISKER_PLAN: [PlanEntry; PLAN_SIZE] = [
    entry("A0", [-2.00, 5.20, 3.40], 52.0, 0.0980, 0.0070, 0.0065, 136.0, 28.0, -12.0),
    entry("A1", [-0.10, 5.05, 3.30], 45.6, 0.0885, 0.0063, 0.0093, 125.5, 29.5, -16.0),
    entry("A2", [1.80, 4.90, 3.20], 39.2, 0.0790, 0.0056, 0.0121, 115.0, 31.0, -20.0),
    entry("A3", [3.70, 4.75, 3.10], 32.8, 0.0695, 0.0050, 0.0149, 104.5, 32.5, -24.0),
    entry("A4", [5.60, 4.60, 3.00], 26.4, 0.0600, 0.0043, 0.0177, 94.0, 34.0, -28.0),
    entry("A5", [7.50, 4.45, 2.90], 20.0, 0.0505, 0.0036, 0.0205, 83.5, 35.5, -32.0),
    entry("B0", [-2.35, 5.65, 1.85], 50.8, 0.0960, 0.0069, 0.0069, 138.0, 15.0, 4.0),
    entry("B1", [-0.45, 5.50, 1.75], 44.4, 0.0865, 0.0062, 0.0097, 127.5, 16.5, 0.0),
    entry("B2", [1.45, 5.35, 1.65], 38.0, 0.0770, 0.0055, 0.0125, 117.0, 18.0, -4.0),
    entry("B3", [3.35, 5.20, 1.55], 31.6, 0.0675, 0.0048, 0.0153, 106.5, 19.5, -8.0),
    entry("B4", [5.25, 5.05, 1.45], 25.2, 0.0580, 0.0041, 0.0181, 96.0, 21.0, -12.0),
    entry("B5", [7.15, 4.90, 1.35], 18.8, 0.0485, 0.0035, 0.0209, 85.5, 22.5, -16.0),
    entry("C0", [-2.70, 6.10, 0.30], 49.6, 0.0940, 0.0067, 0.0073, 140.0, 2.0, 20.0),
    entry("C1", [-0.80, 5.95, 0.20], 43.2, 0.0845, 0.0060, 0.0101, 129.5, 3.5, 16.0),
    entry("C2", [1.10, 5.80, 0.10], 36.8, 0.0750, 0.0054, 0.0129, 119.0, 5.0, 12.0),
    entry("C3", [3.00, 5.65, 0.00], 30.4, 0.0655, 0.0047, 0.0157, 108.5, 6.5, 8.0),
    entry("C4", [4.90, 5.50, -0.10], 24.0, 0.0560, 0.0040, 0.0185, 98.0, 8.0, 4.0),
    entry("C5", [6.80, 5.35, -0.20], 17.6, 0.0465, 0.0033, 0.0213, 87.5, 9.5, 0.0),
    entry("D0", [-3.05, 6.55, -1.25], 48.4, 0.0920, 0.0066, 0.0077, 142.0, -11.0, 36.0),
    entry("D1", [-1.15, 6.40, -1.35], 42.0, 0.0825, 0.0059, 0.0105, 131.5, -9.5, 32.0),
    entry("D2", [0.75, 6.25, -1.45], 35.6, 0.0730, 0.0052, 0.0133, 121.0, -8.0, 28.0),
    entry("D3", [2.65, 6.10, -1.55], 29.2, 0.0635, 0.0045, 0.0161, 110.5, -6.5, 24.0),
    entry("D4", [4.55, 5.95, -1.65], 22.8, 0.0540, 0.0039, 0.0189, 100.0, -5.0, 20.0),
    entry("D5", [6.45, 5.80, -1.75], 16.4, 0.0445, 0.0032, 0.0217, 89.5, -3.5, 16.0),
    entry("E0", [-3.40, 7.00, -2.80], 47.2, 0.0900, 0.0064, 0.0081, 144.0, -24.0, 52.0),
    entry("E1", [-1.50, 6.85, -2.90], 40.8, 0.0805, 0.0057, 0.0109, 133.5, -22.5, 48.0),
    entry("E2", [0.40, 6.70, -3.00], 34.4, 0.0710, 0.0051, 0.0137, 123.0, -21.0, 44.0),
    entry("E3", [2.30, 6.55, -3.10], 28.0, 0.0615, 0.0044, 0.0165, 112.5, -19.5, 40.0),
    entry("E4", [4.20, 6.40, -3.20], 21.6, 0.0520, 0.0037, 0.0193, 102.0, -18.0, 36.0),
    entry("E5", [6.10, 6.25, -3.30], 15.2, 0.0425, 0.0030, 0.0221, 91.5, -16.5, 32.0),
];
