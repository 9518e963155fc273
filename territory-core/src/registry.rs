//! Bidirectional nation-index registry.
//!
//! Indices are stable for the life of a match; a removed nation leaves a
//! hole in `index_to_owner` that is reused by the next founding. Owner
//! identifiers cross a persistence boundary and may round-trip through
//! loosely-typed storage, so every lookup normalizes to a canonical string
//! before hashing.

use std::collections::HashMap;

/// Index into the per-nation layers, `[0, N)`.
pub type NationIndex = i8;

/// Sentinel for "no nation".
pub const UNOWNED: NationIndex = -1;

#[derive(Debug, Clone)]
pub struct NationRegistry {
    capacity: usize,
    owner_to_index: HashMap<String, NationIndex>,
    index_to_owner: Vec<Option<String>>,
}

impl NationRegistry {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity <= i8::MAX as usize, "nation capacity exceeds i8 index range");
        Self {
            capacity,
            owner_to_index: HashMap::new(),
            index_to_owner: vec![None; capacity],
        }
    }

    /// Normalizes any owner-identifier-like value to its canonical string form.
    ///
    /// Owners may arrive as plain strings or as values whose `Display` round-trips
    /// differently than their original wire form; always go through this.
    pub fn normalize(owner: impl AsRef<str>) -> String {
        owner.as_ref().trim().to_string()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn index_of(&self, owner: impl AsRef<str>) -> Option<NationIndex> {
        self.owner_to_index.get(&Self::normalize(owner)).copied()
    }

    pub fn owner_of(&self, index: NationIndex) -> Option<&str> {
        if index < 0 {
            return None;
        }
        self.index_to_owner
            .get(index as usize)
            .and_then(|o| o.as_deref())
    }

    /// Allocates a new index for `owner`, reusing the lowest free hole.
    ///
    /// Returns `None` if `owner` is already registered or there is no free slot.
    pub fn allocate(&mut self, owner: impl AsRef<str>) -> Option<NationIndex> {
        let key = Self::normalize(owner);
        if self.owner_to_index.contains_key(&key) {
            return None;
        }
        let slot = self.index_to_owner.iter().position(|o| o.is_none())?;
        self.index_to_owner[slot] = Some(key.clone());
        self.owner_to_index.insert(key, slot as NationIndex);
        Some(slot as NationIndex)
    }

    /// Retires a nation's slot, leaving a hole for reuse.
    pub fn retire(&mut self, index: NationIndex) {
        if index < 0 {
            return;
        }
        if let Some(owner) = self.index_to_owner.get_mut(index as usize) {
            if let Some(owner) = owner.take() {
                self.owner_to_index.remove(&owner);
            }
        }
    }

    /// Reinserts `owner` at a specific `index` (used by the persistence codec,
    /// where indices must be restored exactly as serialized).
    pub fn restore_slot(&mut self, index: NationIndex, owner: Option<String>) {
        if index < 0 {
            return;
        }
        if let Some(old) = self.index_to_owner.get(index as usize).and_then(|o| o.clone()) {
            self.owner_to_index.remove(&old);
        }
        if let Some(owner) = owner {
            let key = Self::normalize(owner);
            self.owner_to_index.insert(key.clone(), index);
            self.index_to_owner[index as usize] = Some(key);
        } else {
            self.index_to_owner[index as usize] = None;
        }
    }

    pub fn live_indices(&self) -> impl Iterator<Item = NationIndex> + '_ {
        self.index_to_owner
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().map(|_| i as NationIndex))
    }

    pub fn is_live(&self, index: NationIndex) -> bool {
        index >= 0
            && (index as usize) < self.capacity
            && self.index_to_owner[index as usize].is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_reuses_lowest_hole() {
        let mut reg = NationRegistry::new(4);
        let a = reg.allocate("A").unwrap();
        let b = reg.allocate("B").unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        reg.retire(a);
        let c = reg.allocate("C").unwrap();
        assert_eq!(c, 0, "lowest hole should be reused");
        assert_eq!(reg.owner_of(1), Some("B"));
    }

    #[test]
    fn normalize_tolerates_whitespace_roundtrip() {
        let mut reg = NationRegistry::new(2);
        let idx = reg.allocate(" A ").unwrap();
        assert_eq!(reg.index_of("A"), Some(idx));
    }

    #[test]
    fn duplicate_allocation_rejected() {
        let mut reg = NationRegistry::new(2);
        reg.allocate("A").unwrap();
        assert!(reg.allocate("A").is_none());
    }

    #[test]
    fn capacity_exhaustion_returns_none() {
        let mut reg = NationRegistry::new(1);
        reg.allocate("A").unwrap();
        assert!(reg.allocate("B").is_none());
    }
}
