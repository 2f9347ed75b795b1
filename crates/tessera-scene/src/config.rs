//! Scene world configuration.

use serde::{Deserialize, Serialize};

/// Sizing and behaviour of a [`SceneWorld`](crate::builder::SceneWorld).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Entity slots the allocator pre-creates.
    pub entity_capacity: usize,
    /// Dense capacity reserved up front in each component store.
    pub component_capacity: usize,
    /// Record each placed object's document id and name.
    pub attach_metadata: bool,
}

impl Default for SceneConfig {
    /// 1024 entities and components, metadata on.
    fn default() -> Self {
        Self {
            entity_capacity: tessera_ecs::entity::DEFAULT_CAPACITY,
            component_capacity: 1024,
            attach_metadata: true,
        }
    }
}
