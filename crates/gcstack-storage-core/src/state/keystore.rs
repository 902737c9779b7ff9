//! Per-bucket object namespace.
//!
//! [`ObjectTable`] stores every retained generation in a `BTreeMap` keyed by
//! `(name, generation)`, so names are always sorted and generations of one
//! name are adjacent and ascending. A separate map records the live
//! generation of each name.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use tracing::trace;

use super::object::StoredObject;

/// All generations of all objects in one bucket.
#[derive(Debug, Default)]
pub struct ObjectTable {
    versions: BTreeMap<(String, i64), StoredObject>,
    live: HashMap<String, i64>,
}

impl ObjectTable {
    /// The live generation of `name`.
    #[must_use]
    pub fn live(&self, name: &str) -> Option<&StoredObject> {
        let generation = *self.live.get(name)?;
        self.versions.get(&(name.to_owned(), generation))
    }

    /// Whether `generation` is the live generation of `name`.
    #[must_use]
    pub fn is_live(&self, name: &str, generation: i64) -> bool {
        self.live.get(name) == Some(&generation)
    }

    /// Resolve `generation` (`None` or `0` meaning live).
    #[must_use]
    pub fn resolve(&self, name: &str, generation: Option<i64>) -> Option<&StoredObject> {
        match generation {
            None | Some(0) => self.live(name),
            Some(g) => self.versions.get(&(name.to_owned(), g)),
        }
    }

    /// Mutable variant of [`ObjectTable::resolve`].
    pub fn resolve_mut(&mut self, name: &str, generation: Option<i64>) -> Option<&mut StoredObject> {
        let generation = match generation {
            None | Some(0) => *self.live.get(name)?,
            Some(g) => g,
        };
        self.versions.get_mut(&(name.to_owned(), generation))
    }

    /// Store a new generation and make it live.
    ///
    /// Unless `keep_previous`, the previously live generation is removed and
    /// returned.
    pub fn insert(&mut self, object: StoredObject, keep_previous: bool) -> Option<StoredObject> {
        let name = object.resource.name.clone();
        let generation = object.resource.generation;
        let previous = self.live.insert(name.clone(), generation);
        self.versions.insert((name.clone(), generation), object);
        match previous {
            Some(prev) if !keep_previous && prev != generation => {
                trace!(object = %name, generation = prev, "dropping superseded generation");
                self.versions.remove(&(name, prev))
            }
            _ => None,
        }
    }

    /// Physically remove one generation, clearing the live pointer if it was
    /// live.
    pub fn remove(&mut self, name: &str, generation: i64) -> Option<StoredObject> {
        let removed = self.versions.remove(&(name.to_owned(), generation))?;
        if self.is_live(name, generation) {
            self.live.remove(name);
        }
        Some(removed)
    }

    /// Number of names with a live generation.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of retained generations, live or not.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// Generations strictly after `(name, generation)`, or from the start.
    pub fn after(
        &self,
        position: Option<(&str, i64)>,
    ) -> impl Iterator<Item = &StoredObject> + '_ {
        let lower = match position {
            Some((name, generation)) => Bound::Excluded((name.to_owned(), generation)),
            None => Bound::Unbounded,
        };
        self.versions
            .range((lower, Bound::Unbounded))
            .map(|(_, object)| object)
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.versions.clear();
        self.live.clear();
    }
}
