//! Unit system.
//!
//! Lengths are millimetres, masses kilograms, times seconds. Forces are
//! therefore expressed in kg·mm/s² (1e-3 N) and torques in kg·mm²/s².
//! Material constants arrive in SI and are converted once at construction.

/// Millimetres per metre.
pub const MM_PER_M: f64 = 1000.0;

/// Standard gravity in mm/s².
pub const GRAVITY_MM: f64 = 9.81 * MM_PER_M;

/// Convert a density from kg/m³ to kg/mm³.
#[inline]
pub fn density_from_si(rho: f64) -> f64 {
    rho / (MM_PER_M * MM_PER_M * MM_PER_M)
}

/// Convert a Young's modulus from Pa (kg/(m·s²)) to kg/(mm·s²).
#[inline]
pub fn modulus_from_si(pascal: f64) -> f64 {
    pascal / MM_PER_M
}

/// Convert a force in kg·mm/s² to newtons.
#[inline]
pub fn force_to_si(force: f64) -> f64 {
    force / MM_PER_M
}
