//! Builds whisker arrays from names and plan indices.

use std::collections::HashSet;

use tracing::{info, warn};
use vibrissa_math::{units::GRAVITY_MM, Vec3};

use crate::{
    plan_entry, ConfigurationError, MaterialParams, MaterialProfile, Result, Side, Whisker,
    WhiskerArray, PLAN_SIZE,
};

/// Whisker array construction settings.
#[derive(Debug, Clone)]
pub struct WhiskerFactory {
    pub num_links: usize,
    pub material: MaterialParams,
    /// Diameter scale. Radii, and with them mass, inertia, stiffness and
    /// damping, are scaled; it is not a rendering-only option.
    pub blow: f64,
    /// Build an empty array.
    pub no_whiskers: bool,
    pub gravity: Vec3,
}

impl WhiskerFactory {
    pub fn new(num_links: usize, material: MaterialParams) -> Self {
        Self {
            num_links,
            material,
            blow: 1.0,
            no_whiskers: false,
            gravity: Vec3::new(0.0, 0.0, -GRAVITY_MM),
        }
    }

    pub fn blow(mut self, blow: f64) -> Self {
        self.blow = blow;
        self
    }

    pub fn no_whiskers(mut self, no_whiskers: bool) -> Self {
        self.no_whiskers = no_whiskers;
        self
    }

    pub fn gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Build one whisker per name, in the given order.
    ///
    /// All inputs are checked before any whisker is built.
    pub fn build<S: AsRef<str>>(&self, names: &[S], indices: &[usize]) -> Result<WhiskerArray> {
        if self.no_whiskers {
            info!("whiskers disabled, building an empty array");
            return Ok(WhiskerArray::new());
        }
        if names.len() != indices.len() {
            return Err(ConfigurationError::LengthMismatch {
                names: names.len(),
                indices: indices.len(),
            });
        }
        if self.num_links < 2 {
            return Err(ConfigurationError::TooFewLinks {
                num_links: self.num_links,
            });
        }
        if !(self.blow.is_finite() && self.blow > 0.0) {
            return Err(ConfigurationError::InvalidScale(self.blow));
        }

        let mut seen = HashSet::new();
        for (name, &index) in names.iter().zip(indices) {
            let name = name.as_ref();
            if Side::from_name(name).is_none() {
                return Err(ConfigurationError::InvalidSide(name.to_string()));
            }
            if index >= PLAN_SIZE {
                return Err(ConfigurationError::PlanIndexOutOfRange {
                    name: name.to_string(),
                    index,
                    plan_size: PLAN_SIZE,
                });
            }
            if !seen.insert(name) {
                return Err(ConfigurationError::DuplicateName(name.to_string()));
            }
        }

        if self.blow != 1.0 {
            warn!(
                blow = self.blow,
                "whisker diameter scaled; mass, inertia, stiffness and damping change with it"
            );
        }

        let mut array = WhiskerArray::new();
        for (name, &index) in names.iter().zip(indices) {
            array.push(self.build_whisker(name.as_ref(), index)?)?;
        }
        info!(
            whiskers = array.len(),
            links = self.num_links,
            "built whisker array"
        );
        Ok(array)
    }

    /// Build a single whisker.
    pub fn build_whisker(&self, name: &str, index: usize) -> Result<Whisker> {
        let side =
            Side::from_name(name).ok_or_else(|| ConfigurationError::InvalidSide(name.to_string()))?;
        let entry = plan_entry(index).ok_or_else(|| ConfigurationError::PlanIndexOutOfRange {
            name: name.to_string(),
            index,
            plan_size: PLAN_SIZE,
        })?;
        if name.get(1..) != Some(entry.label) {
            warn!(
                whisker = name,
                index,
                label = entry.label,
                "whisker name does not match its plan entry"
            );
        }

        let shape = entry.shape(self.blow);
        let profile = MaterialProfile::new(&self.material, &shape, self.num_links)?;
        Whisker::new(
            name,
            index,
            side,
            entry.attachment(side),
            profile,
            self.gravity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn factory() -> WhiskerFactory {
        WhiskerFactory::new(20, MaterialParams::default())
    }

    #[test]
    fn test_default_selection() {
        let array = factory()
            .build(&["LA0", "RA0", "LC1", "RC1"], &[0, 0, 13, 13])
            .unwrap();
        assert_eq!(array.len(), 4);
        assert!(array.whiskers().iter().all(|w| w.num_links() == 20));
        let names: Vec<&str> = array.names().collect();
        assert_eq!(names, ["LA0", "RA0", "LC1", "RC1"]);
        let id = array.id_of("LC1").unwrap();
        assert_eq!(array.get(id).unwrap().plan_index(), 13);
    }

    #[test]
    fn test_left_and_right_are_mirrored() {
        let array = factory().build(&["LA0", "RA0"], &[0, 0]).unwrap();
        let l = array.by_name("LA0").unwrap().tip();
        let r = array.by_name("RA0").unwrap().tip();
        assert_relative_eq!(r, Vec3::new(l.x, -l.y, l.z), epsilon = 1e-9);
    }

    #[test]
    fn test_legacy_default_indices_rejected() {
        let err = factory()
            .build(&["LA0", "RA0", "LC1", "RC1"], &[31, 0, 42, 11])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::PlanIndexOutOfRange {
                name: "LA0".into(),
                index: 31,
                plan_size: 30
            }
        );
    }

    #[test]
    fn test_last_plan_index_accepted() {
        assert!(factory().build(&["LE5"], &[29]).is_ok());
        assert!(factory().build(&["LE5"], &[30]).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let err = factory().build(&["LA0", "RA0"], &[0]).unwrap_err();
        assert_eq!(err, ConfigurationError::LengthMismatch { names: 2, indices: 1 });
    }

    #[test]
    fn test_duplicate_and_side_rejected() {
        assert_eq!(
            factory().build(&["LA0", "LA0"], &[0, 0]).unwrap_err(),
            ConfigurationError::DuplicateName("LA0".into())
        );
        assert_eq!(
            factory().build(&["A0"], &[0]).unwrap_err(),
            ConfigurationError::InvalidSide("A0".into())
        );
    }

    #[test]
    fn test_too_few_links() {
        let err = WhiskerFactory::new(1, MaterialParams::default())
            .build(&["LA0"], &[0])
            .unwrap_err();
        assert_eq!(err, ConfigurationError::TooFewLinks { num_links: 1 });
    }

    #[test]
    fn test_no_whiskers_gives_empty_array() {
        let array = factory().no_whiskers(true).build(&["LA0"], &[0]).unwrap();
        assert!(array.is_empty());
    }

    #[test]
    fn test_blow_scales_mass() {
        let thin = factory().build_whisker("LA0", 0).unwrap();
        let thick = factory().blow(2.0).build_whisker("LA0", 0).unwrap();
        assert_relative_eq!(thick.total_mass(), 4.0 * thin.total_mass(), max_relative = 1e-9);
    }

    #[test]
    fn test_no_mass_whiskers_are_kinematic() {
        let params = MaterialParams {
            no_mass: true,
            ..Default::default()
        };
        let array = WhiskerFactory::new(10, params).build(&["LA0", "RB2"], &[0, 8]).unwrap();
        assert!(array.whiskers().iter().all(|w| w.is_kinematic()));
        assert_eq!(array.whiskers().iter().map(|w| w.total_mass()).sum::<f64>(), 0.0);
    }
}
