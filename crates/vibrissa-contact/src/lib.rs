//! Contact handling between whisker links and the collision object.
//!
//! Contacts are generated per link ([`find_contacts`]) and resolved as
//! unilateral constraints on the joint accelerations of one whisker
//! ([`ContactSolver`]): the normal forces come from projected Gauss-Seidel
//! on the contact Delassus matrix, friction is applied afterwards per
//! contact.

pub mod detect;
pub mod material;
pub mod solver;

pub use detect::{find_contacts, Contact};
pub use material::ContactMaterial;
pub use solver::{ContactSolution, ContactSolver};
