//! Energy computation for articulated chains.

use vibrissa_model::{JointDrive, Model, State};

/// Compute kinetic energy: 0.5 vᵀ M(q) v
pub fn kinetic_energy(model: &Model, state: &State) -> f64 {
    let m = crate::crba(model, state);
    state.kinetic_energy(&m)
}

/// Compute gravitational potential energy.
///
/// PE = -Σ m_i gᵀ x_com_i
pub fn potential_energy(model: &Model, state: &State) -> f64 {
    let (xforms, _) = crate::forward_kinematics(model, state);

    model
        .bodies
        .iter()
        .zip(&xforms)
        .map(|(body, xf)| {
            let com_world = xf.point_to_parent(&body.inertia.com);
            -body.inertia.mass * model.gravity.dot(&com_world)
        })
        .sum()
}

/// Elastic energy stored in spring drives.
pub fn drive_energy(model: &Model, state: &State) -> f64 {
    model
        .joints
        .iter()
        .enumerate()
        .map(|(i, joint)| match joint.drive {
            JointDrive::Spring {
                stiffness, rest, ..
            } => 0.5 * stiffness * (state.q[i] - rest).powi(2),
            _ => 0.0,
        })
        .sum()
}

/// Total mechanical energy (kinetic + gravitational + elastic).
pub fn total_energy(model: &Model, state: &State) -> f64 {
    kinetic_energy(model, state) + potential_energy(model, state) + drive_energy(model, state)
}
