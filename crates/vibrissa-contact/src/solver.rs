//! Velocity-level contact resolution for one whisker chain.
//!
//! For a step of length `dt` the solver looks for normal forces `F ≥ 0`
//! such that the post-step normal velocity of every contact reaches its
//! target:
//!
//! ```text
//! v_n = v_n_free + dt · Σ_k W_jk F_k ≥ v_target_j,   F_j ⟂ (v_n − v_target_j)
//! ```
//!
//! `W` is the Delassus matrix in acceleration units, assembled column by
//! column from [`ArticulatedFactor::response`]. Friction is applied per
//! contact after the normal solve, capped by the Coulomb cone and by the
//! force that would stop the sliding within the step.

use tracing::trace;
use vibrissa_math::{DMat, DVec, SpatialVec, Vec3};
use vibrissa_model::{Model, State};
use vibrissa_rigid::{propagate_motion, ArticulatedFactor};

use crate::{Contact, ContactMaterial};

/// Diagonal entries below this mean the contact cannot move the chain.
const MIN_DIAGONAL: f64 = 1e-12;

/// Sliding speeds below this get no friction.
const MIN_SLIP: f64 = 1e-12;

/// Projected Gauss-Seidel contact solver.
#[derive(Debug, Clone)]
pub struct ContactSolver {
    pub material: ContactMaterial,
    pub max_iterations: usize,
    /// Stop once no force changes by more than this fraction of the
    /// largest force.
    pub tolerance: f64,
}

impl Default for ContactSolver {
    fn default() -> Self {
        Self {
            material: ContactMaterial::default(),
            max_iterations: 60,
            tolerance: 1e-8,
        }
    }
}

/// Outcome of one contact solve.
#[derive(Debug, Clone)]
pub struct ContactSolution {
    /// Joint accelerations including the contact forces.
    pub qdd: DVec,
    /// Normal force magnitude per contact.
    pub normal_forces: Vec<f64>,
    /// Friction force per contact, world frame.
    pub friction_forces: Vec<Vec3>,
    pub iterations: usize,
}

impl ContactSolution {
    fn unconstrained(qdd: DVec, contacts: usize) -> Self {
        Self {
            qdd,
            normal_forces: vec![0.0; contacts],
            friction_forces: vec![Vec3::zeros(); contacts],
            iterations: 0,
        }
    }

    /// True if contact `j` carries load.
    pub fn is_loaded(&self, j: usize) -> bool {
        self.normal_forces.get(j).is_some_and(|f| *f > 0.0)
    }
}

/// Per-contact data in the link's body frame.
struct Row {
    body: usize,
    point: Vec3,
    normal: Vec3,
    response: DVec,
    rhs: f64,
}

impl ContactSolver {
    pub fn new(material: ContactMaterial) -> Self {
        Self {
            material,
            ..Self::default()
        }
    }

    /// Resolve `contacts` for the chain in `state`.
    ///
    /// `factor` must be the articulated factorization of `state` for the
    /// same `dt`; its accelerations are the contact-free motion.
    pub fn solve(
        &self,
        model: &Model,
        state: &State,
        factor: &ArticulatedFactor,
        contacts: &[Contact],
        dt: f64,
    ) -> ContactSolution {
        let qdd_free = factor.qdd().clone();
        if contacts.is_empty() || dt <= 0.0 {
            return ContactSolution::unconstrained(qdd_free, contacts.len());
        }

        let x_tree = factor.tree_transforms();
        let v_free = &state.v + &qdd_free * dt;
        let free_motion = propagate_motion(model, x_tree, &v_free);

        let rows: Vec<Row> = contacts
            .iter()
            .map(|c| {
                let xf = &state.body_xform[c.body];
                let point = xf.point_from_parent(&c.point);
                let normal = xf.vector_from_parent(&c.normal);
                let object_velocity = xf.vector_from_parent(&c.object_velocity);

                let vn =
                    normal.dot(&(state.body_vel[c.body].point_velocity(&point) - object_velocity));
                let vn_free =
                    normal.dot(&(free_motion[c.body].point_velocity(&point) - object_velocity));
                let target = if c.depth > 0.0 {
                    let push_out = (self.material.soft_erp * c.depth / dt)
                        .min(self.material.max_correcting_vel);
                    push_out.max(-self.material.bounce * vn)
                } else {
                    // Still clear: allow closing the gap within this step.
                    c.depth / dt
                };

                let wrench = SpatialVec::force_at_point(&point, &normal);
                Row {
                    body: c.body,
                    point,
                    normal,
                    response: factor.response(model, c.body, &wrench),
                    rhs: (target - vn_free) / dt,
                }
            })
            .collect();

        let delassus = self.delassus(model, factor, &rows);
        let (forces, iterations) = self.project(&delassus, &rows);

        let mut qdd = qdd_free;
        for (row, f) in rows.iter().zip(&forces) {
            if *f > 0.0 {
                qdd += &row.response * *f;
            }
        }

        let friction_forces =
            self.friction(model, state, factor, contacts, &rows, &forces, &mut qdd, dt);

        trace!(contacts = contacts.len(), iterations, "contact solve finished");
        ContactSolution {
            qdd,
            normal_forces: forces,
            friction_forces,
            iterations,
        }
    }

    fn delassus(&self, model: &Model, factor: &ArticulatedFactor, rows: &[Row]) -> DMat {
        let n = rows.len();
        let mut w = DMat::zeros(n, n);
        for (k, column) in rows.iter().enumerate() {
            let motion = propagate_motion(model, factor.tree_transforms(), &column.response);
            for (j, row) in rows.iter().enumerate() {
                w[(j, k)] = row.normal.dot(&motion[row.body].point_velocity(&row.point));
            }
        }
        w
    }

    fn project(&self, w: &DMat, rows: &[Row]) -> (Vec<f64>, usize) {
        let n = rows.len();
        let mut forces = vec![0.0; n];
        let mut iterations = 0;
        while iterations < self.max_iterations {
            iterations += 1;
            let mut largest_change: f64 = 0.0;
            for j in 0..n {
                let diag = w[(j, j)];
                if diag <= MIN_DIAGONAL {
                    continue;
                }
                let achieved: f64 = (0..n).map(|k| w[(j, k)] * forces[k]).sum();
                let step = (rows[j].rhs - achieved) / (diag * (1.0 + self.material.soft_cfm));
                let next = (forces[j] + step).max(0.0);
                largest_change = largest_change.max((next - forces[j]).abs());
                forces[j] = next;
            }
            let scale = forces.iter().fold(MIN_DIAGONAL, |m, f| m.max(*f));
            if largest_change <= self.tolerance * scale {
                break;
            }
        }
        (forces, iterations)
    }

    /// Coulomb friction on the loaded contacts, added into `qdd`.
    #[allow(clippy::too_many_arguments)]
    fn friction(
        &self,
        model: &Model,
        state: &State,
        factor: &ArticulatedFactor,
        contacts: &[Contact],
        rows: &[Row],
        forces: &[f64],
        qdd: &mut DVec,
        dt: f64,
    ) -> Vec<Vec3> {
        let mut friction = vec![Vec3::zeros(); contacts.len()];
        if self.material.friction <= 0.0 {
            return friction;
        }

        let v_after = &state.v + &*qdd * dt;
        let motion = propagate_motion(model, factor.tree_transforms(), &v_after);
        let mut correction = DVec::zeros(qdd.len());

        for (j, (c, row)) in contacts.iter().zip(rows).enumerate() {
            if forces[j] <= 0.0 {
                continue;
            }
            let xf = &state.body_xform[row.body];
            let object_velocity = xf.vector_from_parent(&c.object_velocity);
            let rel = motion[row.body].point_velocity(&row.point) - object_velocity;
            let slip = rel - row.normal * row.normal.dot(&rel);
            let speed = slip.norm();
            if speed < MIN_SLIP {
                continue;
            }
            let tangent = slip / speed;

            let wrench = SpatialVec::force_at_point(&row.point, &tangent);
            let response = factor.response(model, row.body, &wrench);
            let tangent_motion = propagate_motion(model, factor.tree_transforms(), &response);
            let mobility = tangent.dot(&tangent_motion[row.body].point_velocity(&row.point));
            if mobility <= MIN_DIAGONAL {
                continue;
            }

            let magnitude = (self.material.friction * forces[j]).min(speed / (mobility * dt));
            correction -= &response * magnitude;
            friction[j] = -xf.vector_to_parent(&tangent) * magnitude;
        }

        *qdd += correction;
        friction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vibrissa_math::{SpatialInertia, SpatialTransform};
    use vibrissa_model::{JointDrive, ModelBuilder};
    use vibrissa_rigid::update_kinematics;

    const DT: f64 = 1e-3;
    const G: f64 = 9.81;

    /// Unit rod hinged at the origin about z, lying along +x, gravity −y.
    fn rod(gravity_y: f64) -> (Model, State) {
        let model = ModelBuilder::new()
            .gravity(Vec3::new(0.0, gravity_y, 0.0))
            .add_revolute_body(
                "rod",
                -1,
                SpatialTransform::identity(),
                Vec3::z(),
                SpatialInertia::cylinder_x(1.0, 0.01, 1.0),
                JointDrive::Free,
            )
            .build()
            .unwrap();
        let mut state = model.default_state();
        update_kinematics(&model, &mut state);
        (model, state)
    }

    fn tip_contact(normal: Vec3, depth: f64) -> Contact {
        Contact {
            link: 0,
            body: 0,
            point: Vec3::new(1.0, 0.0, 0.0),
            normal,
            depth,
            object_velocity: Vec3::zeros(),
        }
    }

    #[test]
    fn test_no_contacts_keeps_free_motion() {
        let (model, state) = rod(-G);
        let factor = ArticulatedFactor::new(&model, &state, DT, None);
        let sol = ContactSolver::default().solve(&model, &state, &factor, &[], DT);
        assert_eq!(sol.qdd, *factor.qdd());
        assert_eq!(sol.iterations, 0);
    }

    #[test]
    fn test_support_holds_rod_static() {
        let (model, state) = rod(-G);
        let factor = ArticulatedFactor::new(&model, &state, DT, None);
        assert!(factor.qdd()[0] < 0.0);

        let contacts = [tip_contact(Vec3::y(), 0.0)];
        let sol = ContactSolver::new(ContactMaterial::frictionless())
            .solve(&model, &state, &factor, &contacts, DT);

        assert!(sol.is_loaded(0));
        assert!(sol.qdd[0].abs() < 1e-4 * factor.qdd()[0].abs());
        // Moment balance about the hinge: m g L/2 = F L.
        assert_relative_eq!(sol.normal_forces[0], 0.5 * G, max_relative = 1e-4);
    }

    #[test]
    fn test_separating_contact_carries_no_load() {
        let (model, state) = rod(G);
        let factor = ArticulatedFactor::new(&model, &state, DT, None);
        let contacts = [tip_contact(Vec3::y(), 0.0)];
        let sol = ContactSolver::default().solve(&model, &state, &factor, &contacts, DT);
        assert!(!sol.is_loaded(0));
        assert_eq!(sol.qdd, *factor.qdd());
    }

    #[test]
    fn test_penetration_pushes_out() {
        let (model, mut state) = rod(0.0);
        update_kinematics(&model, &mut state);
        let factor = ArticulatedFactor::new(&model, &state, DT, None);
        let contacts = [tip_contact(Vec3::y(), 0.01)];
        let solver = ContactSolver::new(ContactMaterial::frictionless());
        let sol = solver.solve(&model, &state, &factor, &contacts, DT);

        // Tip speed after the step is erp · depth / dt.
        let tip_speed = DT * sol.qdd[0];
        assert_relative_eq!(
            tip_speed,
            solver.material.soft_erp * 0.01 / DT,
            max_relative = 1e-4
        );
    }

    #[test]
    fn test_deep_penetration_push_out_is_capped() {
        let (model, mut state) = rod(0.0);
        update_kinematics(&model, &mut state);
        let factor = ArticulatedFactor::new(&model, &state, DT, None);
        // erp · depth / dt would be 1000 here.
        let contacts = [tip_contact(Vec3::y(), 5.0)];
        let solver = ContactSolver::new(ContactMaterial::frictionless());
        let sol = solver.solve(&model, &state, &factor, &contacts, DT);

        assert!(sol.is_loaded(0));
        let tip_speed = DT * sol.qdd[0];
        assert_relative_eq!(
            tip_speed,
            solver.material.max_correcting_vel,
            max_relative = 1e-4
        );
    }

    #[test]
    fn test_gap_allows_approach() {
        let (model, mut state) = rod(0.0);
        state.v[0] = -1.0;
        update_kinematics(&model, &mut state);
        let factor = ArticulatedFactor::new(&model, &state, DT, None);
        // 10 units of clearance, only 1e-3 closed this step.
        let contacts = [tip_contact(Vec3::y(), -10.0)];
        let sol = ContactSolver::default().solve(&model, &state, &factor, &contacts, DT);
        assert!(!sol.is_loaded(0));
    }

    #[test]
    fn test_friction_saturates_and_drags_along_object() {
        let (model, mut state) = rod(0.0);
        state.v[0] = -2.0;
        update_kinematics(&model, &mut state);
        let factor = ArticulatedFactor::new(&model, &state, DT, None);

        let normal = Vec3::new(-1.0, 1.0, 0.0).normalize();
        let tangent = Vec3::new(1.0, 1.0, 0.0).normalize();
        let contacts = [Contact {
            object_velocity: tangent * 5.0,
            ..tip_contact(normal, 0.0)
        }];
        let material = ContactMaterial::new(0.5, 0.0);
        let sol =
            ContactSolver::new(material.clone()).solve(&model, &state, &factor, &contacts, DT);

        assert!(sol.is_loaded(0));
        let friction = sol.friction_forces[0];
        assert_relative_eq!(
            friction.norm(),
            material.friction * sol.normal_forces[0],
            max_relative = 1e-9
        );
        assert_relative_eq!(friction.dot(&normal), 0.0, epsilon = 1e-9);
        // The surface slides along +tangent under the link and drags it along.
        assert!(friction.dot(&tangent) > 0.0);
    }
}
