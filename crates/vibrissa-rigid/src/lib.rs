//! Featherstone articulated rigid body dynamics.
//!
//! Implements:
//! - Forward kinematics
//! - Articulated Body Algorithm (ABA) with implicit joint drives
//! - Unit-force responses for contact coupling
//! - Composite Rigid Body Algorithm (CRBA) for mass matrix
//! - Semi-implicit Euler integration

pub mod aba;
pub mod crba;
pub mod energy;
pub mod integrator;
pub mod kinematics;

pub use aba::{aba, aba_with_external_forces, ArticulatedFactor};
pub use crba::crba;
pub use energy::{drive_energy, kinetic_energy, potential_energy, total_energy};
pub use integrator::semi_implicit_euler;
pub use kinematics::{forward_kinematics, propagate_motion, tree_transforms, update_kinematics};
