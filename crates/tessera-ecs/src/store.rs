//! Per-type component storage.
//!
//! A [`ComponentStore<T>`] keeps payloads in a dense `Vec<T>` so systems can
//! iterate "every entity with component X" without touching unrelated
//! component types. A sparse index keyed by entity slot maps back into the
//! dense array. Removal swaps the last element into the hole, so the dense
//! array stays contiguous.
//!
//! Stores never consult the [`EntityAllocator`]: attaching a component to a
//! dead entity is the caller's mistake to avoid. Each dense slot remembers the
//! full [`EntityId`] it belongs to, so a stale handle whose index has since
//! been recycled reads as [`EcsError::NotFound`] rather than aliasing the new
//! occupant's data.

use crate::entity::{EntityAllocator, EntityId};
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentStorage
// ---------------------------------------------------------------------------

/// Type-erased capability shared by every component store.
///
/// Specialized stores implement this to release any externally owned resource
/// (a geometry buffer, an asset handle) before the entry disappears. The base
/// [`ComponentStore`] only guarantees map-level removal.
pub trait ComponentStorage {
    /// Remove the component attached to `entity`, if any.
    fn destroy_instance(&mut self, entity: EntityId);

    /// Whether `entity` currently has a component in this store.
    fn contains(&self, entity: EntityId) -> bool;

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Whether the store holds no components.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remove `entity` from every store in `stores`, then destroy the handle.
///
/// The allocator does not know which stores hold data for an entity; whoever
/// owns those stores decides which ones to clean up. Returns `false` if the
/// entity was not alive, in which case the stores are left untouched.
pub fn destroy_entity(
    entity: EntityId,
    allocator: &mut EntityAllocator,
    stores: &mut [&mut dyn ComponentStorage],
) -> bool {
    if !allocator.is_alive(entity) {
        return false;
    }
    for store in stores.iter_mut() {
        store.destroy_instance(entity);
    }
    allocator.destroy(entity)
}

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// Dense storage mapping [`EntityId`] to a payload of type `T`.
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    /// Entity index -> dense slot.
    sparse: Vec<Option<u32>>,
    /// Owner of each dense slot, parallel to `dense`.
    entities: Vec<EntityId>,
    dense: Vec<T>,
}

impl<T> ComponentStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            dense: Vec::new(),
        }
    }

    /// Create an empty store with room for `capacity` components.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(capacity),
            entities: Vec::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
        }
    }

    /// Insert or overwrite the payload for `entity`.
    ///
    /// Returns the previous payload when `entity` already had one. A leftover
    /// entry from an older generation at the same index is replaced and not
    /// returned; use [`replace`](Self::replace) when that entry owns
    /// something that must be released.
    pub fn set(&mut self, entity: EntityId, value: T) -> Option<T> {
        self.replace(entity, value)
            .and_then(|(owner, previous)| (owner == entity).then_some(previous))
    }

    /// Insert or overwrite the payload for `entity`, returning whatever
    /// occupied its index together with that entry's owner.
    ///
    /// The owner differs from `entity` when the displaced entry was left
    /// behind by an older generation.
    pub fn replace(&mut self, entity: EntityId, value: T) -> Option<(EntityId, T)> {
        let idx = entity.index() as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }

        match self.sparse[idx] {
            Some(slot) => {
                let slot = slot as usize;
                let owner = std::mem::replace(&mut self.entities[slot], entity);
                let previous = std::mem::replace(&mut self.dense[slot], value);
                Some((owner, previous))
            }
            None => {
                self.sparse[idx] = Some(self.dense.len() as u32);
                self.entities.push(entity);
                self.dense.push(value);
                None
            }
        }
    }

    /// Borrow the payload for `entity`.
    pub fn get(&self, entity: EntityId) -> Result<&T, EcsError> {
        let slot = self.slot(entity).ok_or(EcsError::NotFound { entity })?;
        Ok(&self.dense[slot])
    }

    /// Mutably borrow the payload for `entity`.
    pub fn get_mut(&mut self, entity: EntityId) -> Result<&mut T, EcsError> {
        let slot = self.slot(entity).ok_or(EcsError::NotFound { entity })?;
        Ok(&mut self.dense[slot])
    }

    /// Whether `entity` has a payload in this store.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.slot(entity).is_some()
    }

    /// Remove and return the payload for `entity`.
    ///
    /// The last dense element is swapped into the vacated slot.
    pub fn remove(&mut self, entity: EntityId) -> Result<T, EcsError> {
        let slot = self.slot(entity).ok_or(EcsError::NotFound { entity })?;
        self.sparse[entity.index() as usize] = None;

        self.entities.swap_remove(slot);
        let value = self.dense.swap_remove(slot);
        if let Some(&moved) = self.entities.get(slot) {
            self.sparse[moved.index() as usize] = Some(slot as u32);
        }
        Ok(value)
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Iterate `(entity, &payload)` in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterate `(entity, &mut payload)` in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Entities that currently have a payload, in dense order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Remove every payload.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.dense.clear();
    }

    fn slot(&self, entity: EntityId) -> Option<usize> {
        let slot = (*self.sparse.get(entity.index() as usize)?)? as usize;
        (self.entities[slot] == entity).then_some(slot)
    }
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ComponentStorage for ComponentStore<T> {
    fn destroy_instance(&mut self, entity: EntityId) {
        let _ = self.remove(entity);
    }

    fn contains(&self, entity: EntityId) -> bool {
        ComponentStore::contains(self, entity)
    }

    fn len(&self) -> usize {
        self.dense.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    fn ids(n: u32) -> Vec<EntityId> {
        (0..n).map(|i| EntityId::new(i, 0)).collect()
    }

    #[test]
    fn set_then_get() {
        let mut store = ComponentStore::new();
        let e = EntityId::new(3, 0);
        assert_eq!(store.set(e, Health(10)), None);
        assert_eq!(store.get(e).unwrap(), &Health(10));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn set_overwrites_existing() {
        let mut store = ComponentStore::new();
        let e = EntityId::new(0, 0);
        store.set(e, Health(1));
        assert_eq!(store.set(e, Health(2)), Some(Health(1)));
        assert_eq!(store.get(e).unwrap(), &Health(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_component_is_not_found() {
        let store: ComponentStore<Health> = ComponentStore::new();
        let e = EntityId::new(7, 0);
        match store.get(e) {
            Err(EcsError::NotFound { entity }) => assert_eq!(entity, e),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn stale_generation_does_not_alias() {
        let mut store = ComponentStore::new();
        let old = EntityId::new(0, 0);
        let new = EntityId::new(0, 1);
        store.set(old, Health(1));
        assert!(store.get(new).is_err());

        // Attaching for the new generation replaces the leftover entry.
        assert_eq!(store.set(new, Health(2)), None);
        assert!(store.get(old).is_err());
        assert_eq!(store.get(new).unwrap(), &Health(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_reports_displaced_owner() {
        let mut store = ComponentStore::new();
        let old = EntityId::new(2, 0);
        let new = EntityId::new(2, 1);
        assert_eq!(store.replace(old, Health(1)), None);
        assert_eq!(store.replace(old, Health(2)), Some((old, Health(1))));
        assert_eq!(store.replace(new, Health(3)), Some((old, Health(2))));
        assert_eq!(store.get(new).unwrap(), &Health(3));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_middle_keeps_dense_contiguous() {
        let mut store = ComponentStore::new();
        let e = ids(3);
        for (i, &id) in e.iter().enumerate() {
            store.set(id, Health(i as u32));
        }

        assert_eq!(store.remove(e[0]).unwrap(), Health(0));
        assert_eq!(store.len(), 2);
        assert!(store.get(e[0]).is_err());
        assert_eq!(store.get(e[1]).unwrap(), &Health(1));
        assert_eq!(store.get(e[2]).unwrap(), &Health(2));

        let seen: Vec<EntityId> = store.iter().map(|(id, _)| id).collect();
        assert_eq!(seen.len(), 2);
        assert!(!seen.contains(&e[0]));
    }

    #[test]
    fn remove_last_element() {
        let mut store = ComponentStore::new();
        let e = ids(2);
        store.set(e[0], Health(0));
        store.set(e[1], Health(1));
        store.remove(e[1]).unwrap();
        assert_eq!(store.entities(), &[e[0]]);
        assert!(store.remove(e[1]).is_err());
    }

    #[test]
    fn iter_mut_updates_in_place() {
        let mut store = ComponentStore::new();
        for id in ids(4) {
            store.set(id, Health(1));
        }
        for (_, hp) in store.iter_mut() {
            hp.0 += 1;
        }
        assert!(store.iter().all(|(_, hp)| hp.0 == 2));
    }

    #[test]
    fn destroy_entity_cleans_supplied_stores() {
        let mut alloc = EntityAllocator::with_capacity(0);
        let mut health = ComponentStore::new();
        let mut names: ComponentStore<String> = ComponentStore::new();

        let e = alloc.create().unwrap();
        health.set(e, Health(5));
        names.set(e, "crate".to_owned());

        assert!(destroy_entity(e, &mut alloc, &mut [&mut health, &mut names]));
        assert!(!alloc.is_alive(e));
        assert!(ComponentStorage::is_empty(&health));
        assert!(ComponentStorage::is_empty(&names));

        // Already dead: nothing happens.
        assert!(!destroy_entity(e, &mut alloc, &mut [&mut health]));
    }

    #[test]
    fn clear_empties_store() {
        let mut store = ComponentStore::with_capacity(8);
        for id in ids(8) {
            store.set(id, Health(0));
        }
        store.clear();
        assert!(store.is_empty());
        assert!(!store.contains(EntityId::new(0, 0)));
    }
}
