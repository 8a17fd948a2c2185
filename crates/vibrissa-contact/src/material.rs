//! Contact material properties.

/// Material properties for whisker-object contact.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMaterial {
    /// Coefficient of friction (dimensionless).
    pub friction: f64,
    /// Coefficient of restitution (0 = inelastic, 1 = elastic).
    pub bounce: f64,
    /// Constraint force mixing, relative to the diagonal of the Delassus
    /// matrix.
    pub soft_cfm: f64,
    /// Error reduction parameter: fraction of penetration removed per step.
    pub soft_erp: f64,
    /// Distance (mm) at which a link starts generating a contact.
    pub margin: f64,
    /// Upper bound (mm/s) on the velocity used to push a penetrating link
    /// back out.
    pub max_correcting_vel: f64,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: 0.3,
            bounce: 0.0,
            soft_cfm: 1e-6,
            soft_erp: 0.2,
            margin: 0.05,
            max_correcting_vel: 100.0,
        }
    }
}

impl ContactMaterial {
    /// Create a contact material with custom friction and restitution.
    pub fn new(friction: f64, bounce: f64) -> Self {
        Self {
            friction,
            bounce,
            ..Self::default()
        }
    }

    /// Frictionless contact.
    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }
}
