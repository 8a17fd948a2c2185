//! Articulated Body Algorithm (ABA): O(n) forward dynamics.
//!
//! Given (q, v, drives, external forces), compute q̈.
//! Three passes over the kinematic tree:
//! 1. Forward pass: compute velocities, bias forces
//! 2. Backward pass: compute articulated inertias, bias forces
//! 3. Forward pass: compute accelerations
//!
//! Joint drives are integrated implicitly: their stiffness and damping are
//! added to `D_i` for the step length `dt`. The factorization from pass 2 is
//! kept so that the acceleration response to extra body forces can be
//! evaluated without redoing the whole algorithm (see
//! [`ArticulatedFactor::response`]).

use vibrissa_math::{DVec, SpatialMat, SpatialTransform, SpatialVec, Vec3};
use vibrissa_model::{Model, State};

use crate::kinematics::tree_transforms;

/// Joint-space inertias below this are treated as a locked joint.
const LOCKED_INERTIA: f64 = 1e-20;

/// Result of the first two ABA passes for one state.
#[derive(Debug, Clone)]
pub struct ArticulatedFactor {
    x_tree: Vec<SpatialTransform>,
    c_bias: Vec<SpatialVec>,
    /// U_i = Iᴬ_i S_i
    u_vec: Vec<SpatialVec>,
    /// D_i including drive terms; zero marks a locked joint.
    d: Vec<f64>,
    /// u_i = τ_i − S_iᵀ pᴬ_i
    u: Vec<f64>,
    a_root: SpatialVec,
    qdd: DVec,
}

impl ArticulatedFactor {
    /// Factorize the chain in `state` for a step of length `dt`.
    ///
    /// External forces are per body, in body coordinates.
    pub fn new(
        model: &Model,
        state: &State,
        dt: f64,
        external_forces: Option<&[SpatialVec]>,
    ) -> Self {
        let nb = model.nbodies();
        let x_tree = tree_transforms(model, state);

        let mut vel = vec![SpatialVec::zero(); nb];
        let mut c_bias = vec![SpatialVec::zero(); nb];
        let mut p_a = vec![SpatialVec::zero(); nb]; // articulated bias force
        let mut i_a = vec![SpatialMat::zero(); nb]; // articulated body inertia

        // -- Pass 1: Forward -- velocities and bias --
        for i in 0..nb {
            let body = &model.bodies[i];
            let joint = &model.joints[body.joint_idx];
            let v_joint = joint.motion_subspace() * state.v[i];

            if let Some(pi) = body.parent_index() {
                vel[i] = x_tree[i].apply_motion(&vel[pi]) + v_joint;
                c_bias[i] = vel[i].cross_motion(&v_joint);
            } else {
                vel[i] = v_joint;
            }

            i_a[i] = body.inertia.to_matrix();
            // Bias force: v ×* (I v) (gyroscopic)
            p_a[i] = vel[i].cross_force(&i_a[i].mul_vec(&vel[i]));

            if let Some(ext) = external_forces {
                p_a[i] = p_a[i] - ext[i];
            }
        }

        // -- Pass 2: Backward -- articulated inertias and forces --
        let mut u_vec = vec![SpatialVec::zero(); nb];
        let mut d = vec![0.0; nb];
        let mut u = vec![0.0; nb];

        for i in (0..nb).rev() {
            let body = &model.bodies[i];
            let joint = &model.joints[body.joint_idx];
            let s_i = joint.motion_subspace();

            let ia = i_a[i];
            let ia_s = ia.mul_vec(&s_i);
            let d_raw = s_i.dot(&ia_s);
            let drive = joint.drive.implicit_terms(
                state.q[i],
                state.v[i],
                state.target[i],
                d_raw,
                dt,
            );
            let d_i = d_raw + drive.inertia;

            let (ia_child, p_child) = if d_i.abs() < LOCKED_INERTIA {
                (ia, p_a[i] + ia.mul_vec(&c_bias[i]))
            } else {
                let u_i = drive.torque - s_i.dot(&p_a[i]);
                u_vec[i] = ia_s;
                d[i] = d_i;
                u[i] = u_i;
                let ia_new = ia - SpatialMat::outer(&ia_s, &ia_s) * (1.0 / d_i);
                let p_new = p_a[i] + ia_new.mul_vec(&c_bias[i]) + ia_s * (u_i / d_i);
                (ia_new, p_new)
            };

            if let Some(pi) = body.parent_index() {
                i_a[pi] += ia_child.to_parent(&x_tree[i]);
                p_a[pi] += x_tree[i].inv_apply_force(&p_child);
            }
        }

        // Gravity as a fictitious upward acceleration of the mount
        let a_root = state
            .mount
            .apply_motion(&SpatialVec::new(Vec3::zeros(), -model.gravity));

        let mut factor = Self {
            x_tree,
            c_bias,
            u_vec,
            d,
            u,
            a_root,
            qdd: DVec::zeros(model.nv),
        };
        factor.qdd = factor.accelerations(model);
        factor
    }

    // -- Pass 3: Forward -- accelerations --
    fn accelerations(&self, model: &Model) -> DVec {
        let nb = model.nbodies();
        let mut qdd = DVec::zeros(model.nv);
        let mut acc = vec![SpatialVec::zero(); nb];

        for i in 0..nb {
            let body = &model.bodies[i];
            let s_i = model.joints[body.joint_idx].motion_subspace();
            let a_parent = match body.parent_index() {
                Some(pi) => acc[pi],
                None => self.a_root,
            };
            let a_i = self.x_tree[i].apply_motion(&a_parent) + self.c_bias[i];
            if self.d[i] > 0.0 {
                qdd[i] = (self.u[i] - self.u_vec[i].dot(&a_i)) / self.d[i];
            }
            acc[i] = a_i + s_i * qdd[i];
        }

        qdd
    }

    /// Joint accelerations for the factorized state.
    pub fn qdd(&self) -> &DVec {
        &self.qdd
    }

    /// Parent → body transforms used by the factorization.
    pub fn tree_transforms(&self) -> &[SpatialTransform] {
        &self.x_tree
    }

    /// Change in q̈ caused by an extra `wrench` on `body` (body coordinates).
    ///
    /// Linear in `wrench`, free of velocity and gravity terms.
    pub fn response(&self, model: &Model, body: usize, wrench: &SpatialVec) -> DVec {
        let nb = model.nbodies();
        let mut dp = vec![SpatialVec::zero(); nb];
        let mut du = vec![0.0; nb];
        dp[body] = -*wrench;

        // Only the path from `body` to the root sees a bias change.
        let mut cursor = Some(body);
        while let Some(k) = cursor {
            let s_k = model.joints[model.bodies[k].joint_idx].motion_subspace();
            let carried = if self.d[k] > 0.0 {
                du[k] = -s_k.dot(&dp[k]);
                dp[k] + self.u_vec[k] * (du[k] / self.d[k])
            } else {
                dp[k]
            };
            cursor = model.bodies[k].parent_index();
            if let Some(pi) = cursor {
                dp[pi] += self.x_tree[k].inv_apply_force(&carried);
            }
        }

        let mut dqdd = DVec::zeros(model.nv);
        let mut da = vec![SpatialVec::zero(); nb];
        for k in 0..nb {
            let body = &model.bodies[k];
            let s_k = model.joints[body.joint_idx].motion_subspace();
            let a = match body.parent_index() {
                Some(pi) => self.x_tree[k].apply_motion(&da[pi]),
                None => SpatialVec::zero(),
            };
            if self.d[k] > 0.0 {
                dqdd[k] = (du[k] - self.u_vec[k].dot(&a)) / self.d[k];
            }
            da[k] = a + s_k * dqdd[k];
        }
        dqdd
    }
}

/// Run the Articulated Body Algorithm.
///
/// Returns generalized accelerations `qdd` of dimension `model.nv`.
pub fn aba(model: &Model, state: &State, dt: f64) -> DVec {
    aba_with_external_forces(model, state, dt, None)
}

/// Run ABA with optional external spatial forces applied to each body.
pub fn aba_with_external_forces(
    model: &Model,
    state: &State,
    dt: f64,
    external_forces: Option<&[SpatialVec]>,
) -> DVec {
    ArticulatedFactor::new(model, state, dt, external_forces).qdd
}
