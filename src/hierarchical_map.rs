//! Grouped interior/separator hierarchy shared by every level of the
//! preconditioner, grounded on `HYMLS_HierarchicalMap.hpp`.
//!
//! A `HierarchicalMap` is built once per level by adding interior and
//! separator groups and calling [`HierarchicalMap::fill_complete`]; after
//! that it is immutable. [`HierarchicalMap::spawn`] derives flattened id
//! lists for a given [`SpawnStrategy`] and memoizes them in a cache kept
//! deliberately separate from the immutable group arrays (spec's redesign
//! note: "separate cache from immutable hierarchy").

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{HymlsError, HymlsResult};
use crate::grid::Gid;
use crate::group::{InteriorGroup, SeparatorGroup};

/// Which subset of a `HierarchicalMap`'s nodes to expose as a flattened id
/// list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnStrategy {
    /// All interior nodes, grouped by subdomain, in subdomain order.
    Interior,
    /// All separator nodes, in separator-group order.
    Separators,
    /// Separator nodes owned by this rank only. Single-rank execution makes
    /// this identical to `Separators`; the distinction is kept so a future
    /// multi-rank backend can specialize it without changing call sites.
    LocalSeparators,
}

pub struct HierarchicalMap {
    interior: Vec<InteriorGroup>,
    separators: Vec<SeparatorGroup>,
    filled: bool,
    spawn_cache: RefCell<HashMap<SpawnStrategy, Rc<Vec<Gid>>>>,
}

impl HierarchicalMap {
    pub fn new() -> Self {
        HierarchicalMap {
            interior: Vec::new(),
            separators: Vec::new(),
            filled: false,
            spawn_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Clears all groups and cached spawns, returning the map to an
    /// unfilled state ready for a fresh round of `add_*` calls.
    pub fn reset(&mut self) {
        self.interior.clear();
        self.separators.clear();
        self.filled = false;
        self.spawn_cache.borrow_mut().clear();
    }

    pub fn add_interior_group(&mut self, group: InteriorGroup) -> HymlsResult<()> {
        if self.filled {
            return Err(HymlsError::MapMismatch(
                "cannot add interior groups after fill_complete".to_string(),
            ));
        }
        self.interior.push(group);
        Ok(())
    }

    pub fn add_separator_group(&mut self, group: SeparatorGroup) -> HymlsResult<()> {
        if self.filled {
            return Err(HymlsError::MapMismatch(
                "cannot add separator groups after fill_complete".to_string(),
            ));
        }
        self.separators.push(group);
        Ok(())
    }

    pub fn fill_complete(&mut self) -> HymlsResult<()> {
        self.filled = true;
        self.spawn_cache.borrow_mut().clear();
        Ok(())
    }

    pub fn filled(&self) -> bool {
        self.filled
    }

    pub fn interior_groups(&self) -> &[InteriorGroup] {
        &self.interior
    }

    pub fn separator_groups(&self) -> &[SeparatorGroup] {
        &self.separators
    }

    pub fn num_subdomains(&self) -> usize {
        self.interior.len()
    }

    pub fn num_interior_nodes(&self) -> usize {
        self.interior.iter().map(|g| g.len()).sum()
    }

    pub fn num_separator_nodes(&self) -> usize {
        self.separators.iter().map(|g| g.len()).sum()
    }

    /// Returns the flattened id list for `strategy`, computing and caching
    /// it on first use. Repeated calls with the same strategy return the
    /// same `Rc` (spawn is idempotent) without recomputation.
    pub fn spawn(&self, strategy: SpawnStrategy) -> HymlsResult<Rc<Vec<Gid>>> {
        if !self.filled {
            return Err(HymlsError::MapMismatch(
                "HierarchicalMap must be filled before spawning".to_string(),
            ));
        }
        if let Some(cached) = self.spawn_cache.borrow().get(&strategy) {
            return Ok(Rc::clone(cached));
        }

        let spawned = match strategy {
            SpawnStrategy::Interior => self.spawn_interior(),
            SpawnStrategy::Separators => self.spawn_separators(),
            SpawnStrategy::LocalSeparators => self.spawn_separators(),
        };

        let rc = Rc::new(spawned);
        self.spawn_cache
            .borrow_mut()
            .insert(strategy, Rc::clone(&rc));
        Ok(rc)
    }

    fn spawn_interior(&self) -> Vec<Gid> {
        self.interior.iter().flat_map(|g| g.nodes.clone()).collect()
    }

    fn spawn_separators(&self) -> Vec<Gid> {
        self.separators.iter().flat_map(|g| g.nodes.clone()).collect()
    }
}

impl Default for HierarchicalMap {
    fn default() -> Self {
        Self::new()
    }
}
