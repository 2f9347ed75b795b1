//! Tessera ECS -- generational entity handles and dense per-type component
//! storage.
//!
//! Entities are plain [`EntityId`](entity::EntityId) handles issued by an
//! [`EntityAllocator`](entity::EntityAllocator). Data lives in one
//! [`ComponentStore<T>`](store::ComponentStore) per component type, so a
//! system that only cares about one type iterates one contiguous array.
//!
//! # Quick Start
//!
//! ```
//! use tessera_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut entities = EntityAllocator::new();
//! let mut velocities = ComponentStore::new();
//!
//! let e = entities.create().unwrap();
//! velocities.set(e, Velocity { dx: 1.0, dy: 0.0 });
//! assert_eq!(velocities.get(e).unwrap(), &Velocity { dx: 1.0, dy: 0.0 });
//!
//! destroy_entity(e, &mut entities, &mut [&mut velocities]);
//! assert!(!entities.is_alive(e));
//! assert!(velocities.get(e).is_err());
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// No component of the requested type is attached to the entity.
    #[error("entity {entity} has no component in this store")]
    NotFound { entity: entity::EntityId },

    /// The allocator cannot issue another slot index.
    #[error("entity allocator exhausted after {slots} slots")]
    AllocationExhausted { slots: usize },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{EntityAllocator, EntityId, DEFAULT_CAPACITY};
    pub use crate::store::{destroy_entity, ComponentStorage, ComponentStore};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
