//! Whisker construction for vibrissa.
//!
//! A whisker is a chain of rigid links on revolute joints. Link masses,
//! bending stiffnesses and rest curvature come from a [`MaterialProfile`];
//! the base attachment on the head comes from the fixed 30-entry
//! arrangement plan. [`WhiskerFactory`] assembles a [`WhiskerArray`] from a
//! list of names and plan indices.

pub mod array;
pub mod error;
pub mod factory;
pub mod head;
pub mod material;
pub mod plan;
pub mod whisker;

pub use array::{WhiskerArray, WhiskerId};
pub use error::{ConfigurationError, Result};
pub use factory::WhiskerFactory;
pub use head::RatHead;
pub use material::{LinkMaterial, MaterialParams, MaterialProfile, WhiskerShape};
pub use plan::{plan_entry, PlanEntry, Side, PLAN_SIZE, WHISKER_PLAN};
pub use whisker::{Link, Whisker};
