//! Time stepping.

use vibrissa_math::DVec;
use vibrissa_model::State;

/// Semi-implicit (symplectic) Euler step: v += dt q̈, then q += dt v.
pub fn semi_implicit_euler(state: &mut State, qdd: &DVec, dt: f64) {
    state.v += qdd * dt;
    state.q += &state.v * dt;
}
