//! Graded material properties along a whisker.
//!
//! Density and Young's modulus vary linearly from base to tip, the radius
//! tapers linearly, and the intrinsic curvature follows the parabola
//! `y = a s²` along the arc length `s`. Every link is a solid cylinder.

use std::f64::consts::PI;

use vibrissa_math::{units, SpatialInertia, Vec3};

use crate::{ConfigurationError, Result};

/// Material inputs, in SI units (kg/m³, Pa).
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParams {
    pub rho_base: f64,
    pub rho_tip: f64,
    pub youngs_base: f64,
    /// Defaults to `youngs_base` when unset.
    pub youngs_tip: Option<f64>,
    /// Damping ratio of the bending joints.
    pub zeta: f64,
    pub no_curvature: bool,
    /// Zero every link mass; the whisker then moves kinematically.
    pub no_mass: bool,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            rho_base: 1260.0,
            rho_tip: 1690.0,
            youngs_base: 5e9,
            youngs_tip: None,
            zeta: 0.32,
            no_curvature: false,
            no_mass: false,
        }
    }
}

impl MaterialParams {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("rho_base", self.rho_base),
            ("rho_tip", self.rho_tip),
            ("youngs_base", self.youngs_base),
            ("youngs_tip", self.youngs_tip.unwrap_or(self.youngs_base)),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::InvalidMaterial { field, value });
            }
        }
        if !(self.zeta.is_finite() && self.zeta >= 0.0) {
            return Err(ConfigurationError::InvalidMaterial {
                field: "zeta",
                value: self.zeta,
            });
        }
        Ok(())
    }
}

/// Geometry of one whisker, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiskerShape {
    /// Arc length.
    pub length: f64,
    pub base_radius: f64,
    pub tip_radius: f64,
    /// Coefficient `a` of the rest shape `y = a s²` (1/mm).
    pub curvature: f64,
}

impl WhiskerShape {
    /// Copy with both radii multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            base_radius: self.base_radius * factor,
            tip_radius: self.tip_radius * factor,
            ..*self
        }
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("length", self.length),
            ("base_radius", self.base_radius),
            ("tip_radius", self.tip_radius),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::InvalidShape { field, value });
            }
        }
        if !self.curvature.is_finite() {
            return Err(ConfigurationError::InvalidShape {
                field: "curvature",
                value: self.curvature,
            });
        }
        Ok(())
    }
}

/// Derived per-link values (internal units: mm, kg, s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkMaterial {
    /// kg/mm³
    pub density: f64,
    /// kg/(mm·s²)
    pub youngs: f64,
    pub radius: f64,
    pub length: f64,
    pub mass: f64,
    /// Cylinder inertia; origin at the proximal joint, axis along +x.
    pub inertia: SpatialInertia,
    /// Bending stiffness of the proximal joint.
    pub stiffness: f64,
    /// Bending damping of the proximal joint.
    pub damping: f64,
    /// In-plane rest angle of the proximal joint.
    pub rest_angle: f64,
}

impl LinkMaterial {
    /// Rotational inertia about the centre of mass.
    pub fn inertia_tensor(&self) -> vibrissa_math::Mat3 {
        self.inertia.inertia
    }
}

/// Per-link material values for one whisker.
#[derive(Debug, Clone)]
pub struct MaterialProfile {
    links: Vec<LinkMaterial>,
}

impl MaterialProfile {
    /// Derive link properties for a whisker of `num_links` links.
    pub fn new(params: &MaterialParams, shape: &WhiskerShape, num_links: usize) -> Result<Self> {
        if num_links < 2 {
            return Err(ConfigurationError::TooFewLinks { num_links });
        }
        params.validate()?;
        shape.validate()?;

        let n = num_links as f64;
        let length = shape.length / n;
        let youngs_tip = params.youngs_tip.unwrap_or(params.youngs_base);
        let slope = |s: f64| (2.0 * shape.curvature * s).atan();

        let links = (0..num_links)
            .map(|i| {
                let t = i as f64 / (n - 1.0);
                let density = units::density_from_si(lerp(params.rho_base, params.rho_tip, t));
                let youngs = units::modulus_from_si(lerp(params.youngs_base, youngs_tip, t));
                let radius = lerp(shape.base_radius, shape.tip_radius, i as f64 / n);

                let mass = if params.no_mass {
                    0.0
                } else {
                    density * PI * radius * radius * length
                };
                let inertia = if params.no_mass {
                    SpatialInertia::massless()
                } else {
                    SpatialInertia::cylinder_x(mass, radius, length)
                };

                let stiffness = youngs * PI * radius.powi(4) / (4.0 * length);
                let joint_inertia = inertia.moment_about_origin(&Vec3::z());
                let damping = 2.0 * params.zeta * (stiffness * joint_inertia).sqrt();

                let rest_angle = if i == 0 || params.no_curvature {
                    0.0
                } else {
                    let s0 = i as f64 * length;
                    slope(s0 + length) - slope(s0)
                };

                LinkMaterial {
                    density,
                    youngs,
                    radius,
                    length,
                    mass,
                    inertia,
                    stiffness,
                    damping,
                    rest_angle,
                }
            })
            .collect();

        Ok(Self { links })
    }

    /// Link values, base first.
    pub fn links(&self) -> &[LinkMaterial] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.links.iter().map(|l| l.mass).sum()
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn profiles_are_monotonic(
            num_links in 2usize..60,
            rho_base in 500.0..2000.0_f64,
            rho_delta in 0.0..1000.0_f64,
            base_radius in 0.02..0.2_f64,
            taper in 0.01..1.0_f64,
            length in 5.0..60.0_f64,
        ) {
            let params = MaterialParams {
                rho_base,
                rho_tip: rho_base + rho_delta,
                ..Default::default()
            };
            let shape = WhiskerShape {
                length,
                base_radius,
                tip_radius: base_radius * taper,
                curvature: 0.01,
            };
            let profile = MaterialProfile::new(&params, &shape, num_links).unwrap();
            prop_assert_eq!(profile.len(), num_links);
            for pair in profile.links().windows(2) {
                prop_assert!(pair[1].density >= pair[0].density);
                prop_assert!(pair[1].stiffness <= pair[0].stiffness);
                prop_assert!(pair[1].radius <= pair[0].radius);
            }
        }
    }
}
