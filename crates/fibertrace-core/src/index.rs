//! Metadata index: identity to record, and element to identity.

use std::collections::{HashMap, HashSet};

use fibertrace_protocols::{ComponentRecord, ElementHandle, HostSurface, Identity};

/// Native element to owning identity.
///
/// Entries are plain keys: the map never keeps an element alive, and entries
/// go away with their record or when the surface reports the element
/// detached.
#[derive(Debug, Default)]
pub struct ElementMap {
    by_element: HashMap<ElementHandle, Identity>,
    by_identity: HashMap<Identity, HashSet<ElementHandle>>,
}

impl ElementMap {
    pub fn get(&self, element: ElementHandle) -> Option<Identity> {
        self.by_element.get(&element).copied()
    }

    pub fn contains_identity(&self, id: Identity) -> bool {
        self.by_identity.get(&id).is_some_and(|set| !set.is_empty())
    }

    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }

    fn insert(&mut self, element: ElementHandle, id: Identity) {
        if let Some(previous) = self.by_element.insert(element, id) {
            if previous != id {
                self.unlink(previous, element);
            }
        }
        self.by_identity.entry(id).or_default().insert(element);
    }

    fn remove_identity(&mut self, id: Identity) {
        for element in self.by_identity.remove(&id).unwrap_or_default() {
            if self.by_element.get(&element) == Some(&id) {
                self.by_element.remove(&element);
            }
        }
    }

    fn remove_element(&mut self, element: ElementHandle) {
        if let Some(id) = self.by_element.remove(&element) {
            self.unlink(id, element);
        }
    }

    fn unlink(&mut self, id: Identity, element: ElementHandle) {
        if let Some(set) = self.by_identity.get_mut(&id) {
            set.remove(&element);
            if set.is_empty() {
                self.by_identity.remove(&id);
            }
        }
    }
}

/// Engine-owned record store.
#[derive(Debug, Default)]
pub struct MetadataIndex {
    records: HashMap<Identity, ComponentRecord>,
    elements: ElementMap,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Identity) -> Option<&ComponentRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: Identity) -> Option<&mut ComponentRecord> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: Identity) -> bool {
        self.records.contains_key(&id)
    }

    pub fn insert(&mut self, record: ComponentRecord) {
        self.records.insert(record.id, record);
    }

    /// Remove a record together with every element entry pointing at it.
    pub fn remove(&mut self, id: Identity) -> Option<ComponentRecord> {
        self.elements.remove_identity(id);
        self.records.remove(&id)
    }

    pub fn element_owner(&self, element: ElementHandle) -> Option<Identity> {
        self.elements.get(element)
    }

    pub fn elements(&self) -> &ElementMap {
        &self.elements
    }

    /// Map `element` to `id` unless a better owner already holds it.
    ///
    /// Logical components beat host records, and among records of the same
    /// class the deeper one wins.
    pub fn claim_element(&mut self, element: ElementHandle, id: Identity) -> bool {
        let Some(claimant) = self.records.get(&id) else {
            return false;
        };
        if let Some(owner) = self
            .elements
            .get(element)
            .filter(|owner| *owner != id)
            .and_then(|owner| self.records.get(&owner))
        {
            let replace = match (owner.is_logical_component, claimant.is_logical_component) {
                (true, false) => false,
                (false, true) => true,
                _ => claimant.depth >= owner.depth,
            };
            if !replace {
                return false;
            }
        }
        self.elements.insert(element, id);
        true
    }

    /// Every record, shallowest first, ties broken by identity.
    pub fn all_by_depth(&self) -> Vec<ComponentRecord> {
        let mut records: Vec<ComponentRecord> = self.records.values().cloned().collect();
        records.sort_by_key(|r| (r.depth, r.id));
        records
    }

    /// Records without a parent.
    pub fn roots(&self) -> Vec<ComponentRecord> {
        let mut roots: Vec<ComponentRecord> = self
            .records
            .values()
            .filter(|r| r.parent.is_none())
            .cloned()
            .collect();
        roots.sort_by_key(|r| r.id);
        roots
    }

    /// Drop element entries whose element left the document.
    pub fn prune_detached(&mut self, surface: &dyn HostSurface) -> usize {
        let detached: Vec<ElementHandle> = self
            .elements
            .by_element
            .keys()
            .copied()
            .filter(|element| !surface.is_attached(*element))
            .collect();
        for element in &detached {
            self.elements.remove_element(*element);
        }
        detached.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
