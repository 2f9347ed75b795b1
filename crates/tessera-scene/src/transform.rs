//! Local and world transforms.

use glam::Mat4;
use tessera_ecs::prelude::*;

/// An entity's transform relative to its parent (or the world, without one).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformInstance {
    pub local: Mat4,
    pub parent: Option<EntityId>,
}

/// Stores each entity's local matrix and optional parent link.
#[derive(Debug, Default)]
pub struct TransformStore {
    store: ComponentStore<TransformInstance>,
}

impl TransformStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: ComponentStore::with_capacity(capacity),
        }
    }

    /// Set the local matrix, keeping any existing parent link.
    pub fn set_local_transform(&mut self, entity: EntityId, local: Mat4) {
        let parent = self.store.get(entity).ok().and_then(|t| t.parent);
        self.store.set(entity, TransformInstance { local, parent });
    }

    pub fn local_transform(&self, entity: EntityId) -> Result<Mat4, EcsError> {
        self.store.get(entity).map(|t| t.local)
    }

    /// Parent `entity` under `parent`, or detach it with `None`.
    pub fn set_parent(&mut self, entity: EntityId, parent: Option<EntityId>) -> Result<(), EcsError> {
        self.store.get_mut(entity)?.parent = parent;
        Ok(())
    }

    pub fn parent(&self, entity: EntityId) -> Result<Option<EntityId>, EcsError> {
        self.store.get(entity).map(|t| t.parent)
    }

    /// Compose local matrices from the root down to `entity`.
    ///
    /// A parent that no longer has a transform ends the chain, as does a
    /// chain longer than the store (a cycle).
    pub fn world_transform(&self, entity: EntityId) -> Result<Mat4, EcsError> {
        let node = self.store.get(entity)?;
        let mut world = node.local;
        let mut next = node.parent;
        let mut hops = 0;
        while let Some(parent) = next {
            let Ok(p) = self.store.get(parent) else { break };
            hops += 1;
            if hops > self.store.len() {
                tracing::warn!(%entity, "transform parent chain contains a cycle");
                break;
            }
            world = p.local * world;
            next = p.parent;
        }
        Ok(world)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &TransformInstance)> {
        self.store.iter()
    }
}

impl ComponentStorage for TransformStore {
    fn destroy_instance(&mut self, entity: EntityId) {
        self.store.destroy_instance(entity);
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.store.contains(entity)
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}
