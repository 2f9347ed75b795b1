//! Sprite quads and the geometry buffers that back them.
//!
//! The render store never talks to a graphics API. It builds quad vertices
//! and hands them to a [`GeometryProvider`], which returns opaque handles and
//! takes them back when the entity's sprite is replaced or destroyed.

use std::collections::BTreeSet;

use glam::{Mat4, Vec2};
use tessera_ecs::prelude::*;

use crate::transform::TransformStore;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A single sprite vertex with position and texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// Build a `dimensions`-sized quad whose minimum corner sits at `offset`.
///
/// Vertices are in triangle-strip order.
pub fn quad(dimensions: Vec2, offset: Vec2) -> [QuadVertex; 4] {
    [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]].map(|uv: [f32; 2]| QuadVertex {
        position: (offset + Vec2::from(uv) * dimensions).to_array(),
        uv,
    })
}

/// Opaque id of an uploaded vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(pub u32);

/// Opaque id of the vertex layout bound to a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutHandle(pub u32);

/// The buffers drawing one entity's sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderInstance {
    pub geometry: GeometryHandle,
    pub layout: LayoutHandle,
    pub dimensions: Vec2,
    pub offset: Vec2,
}

/// Owns graphics memory on behalf of the render store.
pub trait GeometryProvider {
    /// Upload a quad and describe its layout.
    fn upload_quad(&mut self, vertices: &[QuadVertex; 4]) -> (GeometryHandle, LayoutHandle);

    /// Free buffers returned by [`upload_quad`](Self::upload_quad).
    fn release(&mut self, geometry: GeometryHandle, layout: LayoutHandle);
}

/// Provider for headless runs: hands out sequential handles, keeps the
/// uploaded bytes, and tracks which handles are live.
#[derive(Debug, Default)]
pub struct HeadlessGeometryProvider {
    next: u32,
    live: BTreeSet<GeometryHandle>,
    uploaded_bytes: usize,
}

impl HeadlessGeometryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, geometry: GeometryHandle) -> bool {
        self.live.contains(&geometry)
    }

    /// Total bytes ever uploaded.
    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }
}

impl GeometryProvider for HeadlessGeometryProvider {
    fn upload_quad(&mut self, vertices: &[QuadVertex; 4]) -> (GeometryHandle, LayoutHandle) {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        self.uploaded_bytes += bytes.len();

        let geometry = GeometryHandle(self.next);
        let layout = LayoutHandle(self.next + 1);
        self.next += 2;
        self.live.insert(geometry);
        (geometry, layout)
    }

    fn release(&mut self, geometry: GeometryHandle, _layout: LayoutHandle) {
        self.live.remove(&geometry);
    }
}

// ---------------------------------------------------------------------------
// RenderStore
// ---------------------------------------------------------------------------

/// Sprite geometry per entity, drawn with one fixed projection.
#[derive(Debug)]
pub struct RenderStore<P: GeometryProvider> {
    store: ComponentStore<RenderInstance>,
    projection: Mat4,
    provider: P,
}

impl<P: GeometryProvider> RenderStore<P> {
    pub fn new(projection: Mat4, provider: P) -> Self {
        Self {
            store: ComponentStore::new(),
            projection,
            provider,
        }
    }

    pub fn with_capacity(projection: Mat4, provider: P, capacity: usize) -> Self {
        Self {
            store: ComponentStore::with_capacity(capacity),
            projection,
            provider,
        }
    }

    /// Give `entity` a sprite quad, releasing the buffers of any sprite at
    /// its index, including one left behind by an older generation.
    pub fn set_sprite(&mut self, entity: EntityId, dimensions: Vec2, offset: Vec2) {
        let (geometry, layout) = self.provider.upload_quad(&quad(dimensions, offset));
        let previous = self.store.replace(
            entity,
            RenderInstance {
                geometry,
                layout,
                dimensions,
                offset,
            },
        );
        if let Some((_, old)) = previous {
            self.provider.release(old.geometry, old.layout);
        }
    }

    pub fn instance(&self, entity: EntityId) -> Result<&RenderInstance, EcsError> {
        self.store.get(entity)
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// `projection * view * world` for drawing `entity`.
    pub fn model_view_projection(
        &self,
        entity: EntityId,
        view: Mat4,
        transforms: &TransformStore,
    ) -> Result<Mat4, EcsError> {
        Ok(self.projection * view * transforms.world_transform(entity)?)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &RenderInstance)> {
        self.store.iter()
    }
}

impl<P: GeometryProvider> ComponentStorage for RenderStore<P> {
    /// Release the entity's buffers, then forget it.
    fn destroy_instance(&mut self, entity: EntityId) {
        if let Ok(instance) = self.store.remove(entity) {
            self.provider.release(instance.geometry, instance.layout);
        }
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.store.contains(entity)
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

impl<P: GeometryProvider> Drop for RenderStore<P> {
    fn drop(&mut self) {
        for (_, instance) in self.store.iter() {
            self.provider.release(instance.geometry, instance.layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn store() -> RenderStore<HeadlessGeometryProvider> {
        RenderStore::new(
            Mat4::orthographic_rh(0.0, 16.0, 9.0, 0.0, -10.0, 10.0),
            HeadlessGeometryProvider::new(),
        )
    }

    #[test]
    fn quad_spans_dimensions_from_offset() {
        let q = quad(Vec2::new(2.0, 3.0), Vec2::new(-1.0, 0.5));
        assert_eq!(q[0].position, [-1.0, 0.5]);
        assert_eq!(q[3].position, [1.0, 3.5]);
        assert_eq!(q[1].uv, [1.0, 0.0]);
        assert_eq!(q[2].uv, [0.0, 1.0]);
    }

    #[test]
    fn set_sprite_uploads_geometry() {
        let mut render = store();
        let e = EntityId::new(0, 0);
        render.set_sprite(e, Vec2::ONE, Vec2::ZERO);
        let instance = *render.instance(e).unwrap();
        assert!(render.provider().is_live(instance.geometry));
        assert_eq!(
            render.provider().uploaded_bytes(),
            4 * std::mem::size_of::<QuadVertex>()
        );
    }

    #[test]
    fn replacing_sprite_releases_old_buffers() {
        let mut render = store();
        let e = EntityId::new(0, 0);
        render.set_sprite(e, Vec2::ONE, Vec2::ZERO);
        let first = render.instance(e).unwrap().geometry;
        render.set_sprite(e, Vec2::splat(2.0), Vec2::ZERO);
        let second = render.instance(e).unwrap().geometry;

        assert_ne!(first, second);
        assert!(!render.provider().is_live(first));
        assert_eq!(render.provider().live_count(), 1);
    }

    #[test]
    fn sprite_left_by_destroyed_entity_is_released_on_reuse() {
        let mut entities = EntityAllocator::with_capacity(1);
        let mut render = store();
        let old = entities.create().unwrap();
        render.set_sprite(old, Vec2::ONE, Vec2::ZERO);
        let old_geometry = render.instance(old).unwrap().geometry;

        // Destroyed without cleaning the render store.
        entities.destroy(old);
        let new = entities.create().unwrap();
        assert_eq!(new.index(), old.index());
        render.set_sprite(new, Vec2::ONE, Vec2::ZERO);

        assert!(!render.provider().is_live(old_geometry));
        assert_eq!(render.provider().live_count(), render.len());
        assert!(render.instance(old).is_err());
    }

    #[test]
    fn destroy_instance_releases_buffers() {
        let mut render = store();
        let (a, b) = (EntityId::new(0, 0), EntityId::new(1, 0));
        render.set_sprite(a, Vec2::ONE, Vec2::ZERO);
        render.set_sprite(b, Vec2::ONE, Vec2::ZERO);
        render.destroy_instance(a);

        assert!(render.instance(a).is_err());
        assert_eq!(render.provider().live_count(), 1);
        assert_eq!(render.len(), 1);
    }

    #[test]
    fn projection_is_fixed_and_applied() {
        let render = store();
        let mut transforms = TransformStore::new();
        let e = EntityId::new(0, 0);
        transforms.set_local_transform(e, Mat4::from_translation(Vec3::new(8.0, 4.5, 0.0)));

        let mvp = render
            .model_view_projection(e, Mat4::IDENTITY, &transforms)
            .unwrap();
        let centre = mvp.transform_point3(Vec3::ZERO);
        assert!(centre.x.abs() < 1e-5 && centre.y.abs() < 1e-5);
        assert_eq!(render.projection(), store().projection());
    }
}
