//! Axis-aligned bounding boxes for collision consumers.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tessera_ecs::prelude::*;

use crate::transform::TransformStore;

/// Box size and offset in the entity's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsInstance {
    pub dimensions: Vec2,
    pub offset: Vec2,
}

/// An axis-aligned rectangle; `(x, y)` is the minimum corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    /// Transform all four corners by `matrix` and re-bound them.
    ///
    /// Under rotation the result is larger than the rotated rectangle; it
    /// always contains it.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingBox {
        let corners = [
            Vec3::new(self.x, self.y, 0.0),
            Vec3::new(self.x + self.w, self.y, 0.0),
            Vec3::new(self.x, self.y + self.h, 0.0),
            Vec3::new(self.x + self.w, self.y + self.h, 0.0),
        ];
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for corner in corners {
            let p = matrix.transform_point3(corner).truncate();
            min = min.min(p);
            max = max.max(p);
        }
        BoundingBox {
            x: min.x,
            y: min.y,
            w: max.x - min.x,
            h: max.y - min.y,
        }
    }

    /// Overlap test; touching edges do not count.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && b_min.x < a_max.x && a_min.y < b_max.y && b_min.y < a_max.y
    }
}

/// Local bounding boxes, resolved to world space on demand.
#[derive(Debug, Default)]
pub struct BoundingBoxStore {
    store: ComponentStore<BoundsInstance>,
}

impl BoundingBoxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: ComponentStore::with_capacity(capacity),
        }
    }

    pub fn set_bounding_box(&mut self, entity: EntityId, dimensions: Vec2, offset: Vec2) {
        self.store.set(entity, BoundsInstance { dimensions, offset });
    }

    pub fn local_bounding_box(&self, entity: EntityId) -> Result<BoundingBox, EcsError> {
        let b = self.store.get(entity)?;
        Ok(BoundingBox {
            x: b.offset.x,
            y: b.offset.y,
            w: b.dimensions.x,
            h: b.dimensions.y,
        })
    }

    /// The entity's box in world space, using its current world transform.
    pub fn bounding_box(
        &self,
        entity: EntityId,
        transforms: &TransformStore,
    ) -> Result<BoundingBox, EcsError> {
        let local = self.local_bounding_box(entity)?;
        let world = transforms.world_transform(entity)?;
        Ok(local.transformed(&world))
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &BoundsInstance)> {
        self.store.iter()
    }
}

impl ComponentStorage for BoundingBoxStore {
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
