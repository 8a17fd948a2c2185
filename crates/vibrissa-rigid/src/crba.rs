//! Composite Rigid Body Algorithm (CRBA): mass matrix computation.

use vibrissa_math::{DMat, SpatialMat};
use vibrissa_model::{Model, State};

use crate::kinematics::tree_transforms;

/// Compute the joint-space mass matrix M(q) using CRBA.
///
/// Returns an nv × nv symmetric matrix. Drive terms are not included.
pub fn crba(model: &Model, state: &State) -> DMat {
    let nb = model.nbodies();
    let mut mass_matrix = DMat::zeros(model.nv, model.nv);
    let x_tree = tree_transforms(model, state);

    // Composite inertias (initialized from body inertias)
    let mut i_c: Vec<SpatialMat> = model.bodies.iter().map(|b| b.inertia.to_matrix()).collect();

    // Backward pass: accumulate composite inertias
    for i in (0..nb).rev() {
        if let Some(pi) = model.bodies[i].parent_index() {
            let ic_in_parent = i_c[i].to_parent(&x_tree[i]);
            i_c[pi] += ic_in_parent;
        }
    }

    for i in 0..nb {
        let s_i = model.joints[model.bodies[i].joint_idx].motion_subspace();

        // Diagonal: S_iᵀ I_c_i S_i
        let f_i = i_c[i].mul_vec(&s_i);
        mass_matrix[(i, i)] = s_i.dot(&f_i);

        // Off-diagonal: walk up the tree
        let mut f = x_tree[i].inv_apply_force(&f_i);
        let mut j = model.bodies[i].parent_index();
        while let Some(ju) = j {
            let s_j = model.joints[model.bodies[ju].joint_idx].motion_subspace();
            mass_matrix[(i, ju)] = s_j.dot(&f);
            mass_matrix[(ju, i)] = mass_matrix[(i, ju)];

            f = x_tree[ju].inv_apply_force(&f);
            j = model.bodies[ju].parent_index();
        }
    }

    mass_matrix
}
