//! Forward kinematics: body transforms and velocities.

use vibrissa_math::{DVec, SpatialTransform, SpatialVec};
use vibrissa_model::{Model, State};

/// Parent → body transforms for every body.
///
/// For the root body the "parent" is the chain mount frame held in
/// `State::mount`.
pub fn tree_transforms(model: &Model, state: &State) -> Vec<SpatialTransform> {
    model
        .bodies
        .iter()
        .map(|body| {
            let joint = &model.joints[body.joint_idx];
            joint
                .joint_transform(state.q[body.joint_idx])
                .compose(&joint.parent_to_joint)
        })
        .collect()
}

/// Body-frame motion vectors produced by a joint-rate vector `rates`.
///
/// No velocity-product terms are added, so with `rates = v` this gives body
/// velocities and with `rates = Δq̈` it gives the matching change in body
/// accelerations. The mount is treated as fixed.
pub fn propagate_motion(
    model: &Model,
    x_tree: &[SpatialTransform],
    rates: &DVec,
) -> Vec<SpatialVec> {
    let nb = model.nbodies();
    let mut motion = vec![SpatialVec::zero(); nb];
    for i in 0..nb {
        let body = &model.bodies[i];
        let joint = &model.joints[body.joint_idx];
        let own = joint.motion_subspace() * rates[body.joint_idx];
        motion[i] = match body.parent_index() {
            Some(pi) => x_tree[i].apply_motion(&motion[pi]) + own,
            None => own,
        };
    }
    motion
}

/// Compute forward kinematics.
///
/// Returns (world → body transforms, velocities in body frame).
pub fn forward_kinematics(
    model: &Model,
    state: &State,
) -> (Vec<SpatialTransform>, Vec<SpatialVec>) {
    let x_tree = tree_transforms(model, state);
    let nb = model.nbodies();
    let mut x_world_to_body = vec![SpatialTransform::identity(); nb];

    for i in 0..nb {
        // world → body_i = (parent → body_i) after (world → parent)
        x_world_to_body[i] = match model.bodies[i].parent_index() {
            Some(pi) => x_tree[i].compose(&x_world_to_body[pi]),
            None => x_tree[i].compose(&state.mount),
        };
    }

    let velocities = propagate_motion(model, &x_tree, &state.v);
    (x_world_to_body, velocities)
}

/// Refresh the cached transforms and velocities in `state`.
pub fn update_kinematics(model: &Model, state: &mut State) {
    let (xforms, vels) = forward_kinematics(model, state);
    state.body_xform = xforms;
    state.body_vel = vels;
}
