//! Arena of whiskers addressed by stable handles.

use std::collections::HashMap;

use crate::{ConfigurationError, Result, Whisker};

/// Stable handle of a whisker inside its [`WhiskerArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WhiskerId(pub usize);

/// Whiskers in configuration order with a name index.
///
/// Only [`crate::WhiskerFactory`] adds whiskers; afterwards the set of
/// whiskers and their link counts never change.
#[derive(Debug, Clone, Default)]
pub struct WhiskerArray {
    whiskers: Vec<Whisker>,
    by_name: HashMap<String, WhiskerId>,
}

impl WhiskerArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, whisker: Whisker) -> Result<WhiskerId> {
        if self.by_name.contains_key(whisker.name()) {
            return Err(ConfigurationError::DuplicateName(whisker.name().to_string()));
        }
        let id = WhiskerId(self.whiskers.len());
        self.by_name.insert(whisker.name().to_string(), id);
        self.whiskers.push(whisker);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.whiskers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.whiskers.is_empty()
    }

    pub fn get(&self, id: WhiskerId) -> Option<&Whisker> {
        self.whiskers.get(id.0)
    }

    pub fn get_mut(&mut self, id: WhiskerId) -> Option<&mut Whisker> {
        self.whiskers.get_mut(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<WhiskerId> {
        self.by_name.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Whisker> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// Whiskers with their handles, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (WhiskerId, &Whisker)> {
        self.whiskers.iter().enumerate().map(|(i, w)| (WhiskerId(i), w))
    }

    pub fn whiskers(&self) -> &[Whisker] {
        &self.whiskers
    }

    /// Mutable access for per-substep state updates. The slice cannot grow
    /// or shrink, so the topology stays fixed.
    pub fn whiskers_mut(&mut self) -> &mut [Whisker] {
        &mut self.whiskers
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.whiskers.iter().map(|w| w.name())
    }
}
