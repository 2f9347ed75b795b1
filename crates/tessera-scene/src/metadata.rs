//! Named data attached to entities, keyed by a persistent external id.
//!
//! The external id is whatever stable identifier the entity's source uses;
//! for entities placed from a tile-map it is the object's document id. It
//! survives reloads where [`EntityId`]s do not.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_ecs::prelude::*;

/// External id plus free-form key/value data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub external_id: u32,
    pub data: BTreeMap<String, Value>,
}

/// Records keyed by entity, plus a reverse index from external id.
///
/// Several entities can hold the same external id, for instance when a map
/// is loaded twice. The reverse index keeps every holder in registration
/// order and answers with the most recent one still registered.
#[derive(Debug, Default)]
pub struct MetadataStore {
    store: ComponentStore<Metadata>,
    by_external: HashMap<u32, Vec<EntityId>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: ComponentStore::with_capacity(capacity),
            by_external: HashMap::with_capacity(capacity),
        }
    }

    /// Start a fresh, empty record for `entity` under `external_id`.
    ///
    /// A record already at the entity's index, including one left behind by
    /// an older generation, is dropped and unregistered first.
    pub fn create(&mut self, entity: EntityId, external_id: u32) {
        let previous = self.store.replace(
            entity,
            Metadata {
                external_id,
                data: BTreeMap::new(),
            },
        );
        if let Some((owner, record)) = previous {
            self.forget(record.external_id, owner);
        }
        self.by_external.entry(external_id).or_default().push(entity);
    }

    /// Set one field on an existing record.
    pub fn set_data(
        &mut self,
        entity: EntityId,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), EcsError> {
        self.store
            .get_mut(entity)?
            .data
            .insert(key.into(), value.into());
        Ok(())
    }

    pub fn get(&self, entity: EntityId, key: &str) -> Result<Option<&Value>, EcsError> {
        Ok(self.store.get(entity)?.data.get(key))
    }

    pub fn data(&self, entity: EntityId) -> Result<&BTreeMap<String, Value>, EcsError> {
        Ok(&self.store.get(entity)?.data)
    }

    pub fn external_id(&self, entity: EntityId) -> Result<u32, EcsError> {
        Ok(self.store.get(entity)?.external_id)
    }

    /// The most recently registered entity holding `external_id`.
    pub fn entity_for(&self, external_id: u32) -> Option<EntityId> {
        self.by_external.get(&external_id)?.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Metadata)> {
        self.store.iter()
    }

    fn forget(&mut self, external_id: u32, entity: EntityId) {
        let Some(holders) = self.by_external.get_mut(&external_id) else {
            return;
        };
        holders.retain(|&holder| holder != entity);
        if holders.is_empty() {
            self.by_external.remove(&external_id);
        }
    }
}

impl ComponentStorage for MetadataStore {
    fn destroy_instance(&mut self, entity: EntityId) {
        if let Ok(record) = self.store.remove(entity) {
            self.forget(record.external_id, entity);
        }
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.store.contains(entity)
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_set_data() {
        let mut store = MetadataStore::new();
        let e = EntityId::new(0, 0);
        store.create(e, 17);
        store.set_data(e, "name", "miller").unwrap();
        assert_eq!(store.external_id(e).unwrap(), 17);
        assert_eq!(store.get(e, "name").unwrap(), Some(&Value::from("miller")));
        assert_eq!(store.get(e, "missing").unwrap(), None);
        assert_eq!(store.entity_for(17), Some(e));
    }

    #[test]
    fn set_data_without_record_fails() {
        let mut store = MetadataStore::new();
        assert!(store.set_data(EntityId::new(0, 0), "name", "x").is_err());
    }

    #[test]
    fn recreate_resets_data_and_moves_external_id() {
        let mut store = MetadataStore::new();
        let e = EntityId::new(0, 0);
        store.create(e, 1);
        store.set_data(e, "name", "old").unwrap();
        store.create(e, 2);
        assert!(store.data(e).unwrap().is_empty());
        assert_eq!(store.entity_for(1), None);
        assert_eq!(store.entity_for(2), Some(e));
    }

    #[test]
    fn destroy_forgets_external_id() {
        let mut store = MetadataStore::new();
        let e = EntityId::new(3, 1);
        store.create(e, 9);
        store.destroy_instance(e);
        assert_eq!(store.entity_for(9), None);
        assert!(store.data(e).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn external_id_reused_by_later_entity() {
        let mut store = MetadataStore::new();
        let (a, b) = (EntityId::new(0, 0), EntityId::new(1, 0));
        store.create(a, 5);
        store.create(b, 5);
        assert_eq!(store.entity_for(5), Some(b));
        // Destroying the older holder must not unregister the new one.
        store.destroy_instance(a);
        assert_eq!(store.entity_for(5), Some(b));
    }

    #[test]
    fn destroying_newest_holder_falls_back_to_previous() {
        let mut store = MetadataStore::new();
        let (a, b) = (EntityId::new(0, 0), EntityId::new(1, 0));
        store.create(a, 5);
        store.create(b, 5);
        store.destroy_instance(b);
        assert_eq!(store.entity_for(5), Some(a));
        store.destroy_instance(a);
        assert_eq!(store.entity_for(5), None);
    }

    #[test]
    fn record_left_by_destroyed_entity_is_unregistered_on_reuse() {
        let mut entities = EntityAllocator::with_capacity(1);
        let mut store = MetadataStore::new();
        let old = entities.create().unwrap();
        store.create(old, 11);

        // Destroyed without cleaning the metadata store.
        entities.destroy(old);
        let new = entities.create().unwrap();
        assert_eq!(new.index(), old.index());
        store.create(new, 12);

        assert_eq!(store.entity_for(11), None);
        assert_eq!(store.entity_for(12), Some(new));
        assert!(store.data(old).is_err());
        assert_eq!(store.len(), 1);
    }
}
