//! Turning a tile-map document into live entities.
//!
//! Every object in every object-group layer becomes one entity carrying a
//! transform, an animation set and (optionally) metadata. A build either
//! places every object or places none of them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use glam::{Mat4, Vec3};
use tessera_ecs::prelude::*;
use tessera_tmx::model::{Document, LayerKind, Object, Shape, Tileset};

use crate::animation::{AnimationFactory, AnimationStore, TileAnimationFactory};
use crate::config::SceneConfig;
use crate::metadata::MetadataStore;
use crate::transform::TransformStore;
use crate::SceneError;

/// Sequence every placed object starts playing.
pub const INITIAL_SEQUENCE: u32 = 0;

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Local transform of `object` on layer `layer_index`, in tile units.
///
/// The document anchors objects at their bottom-left corner while the engine
/// anchors at top-left, hence `y - height`. The layer index becomes the
/// depth coordinate. Scale maps the tileset's tile size onto the object's.
pub fn object_transform(
    document: &Document,
    tileset: &Tileset,
    object: &Object,
    layer_index: usize,
) -> Mat4 {
    let translation = Vec3::new(
        object.x / document.tile_width as f32,
        (object.y - object.height) / document.tile_height as f32,
        layer_index as f32,
    );
    let scale = Vec3::new(
        object.width / tileset.tile_width as f32,
        object.height / tileset.tile_height as f32,
        1.0,
    );
    Mat4::from_translation(translation) * Mat4::from_scale(scale)
}

/// Place every object of every object-group layer of `document`.
///
/// Layers and objects are visited in document order; the layer index counts
/// all layers, tile layers included. Returns the created entities in
/// placement order. On error, every entity created by this call is removed
/// from the given stores and destroyed before the error is returned.
pub fn build<F>(
    document: &Document,
    world_transform: Mat4,
    entities: &mut EntityAllocator,
    transforms: &mut TransformStore,
    animations: &mut AnimationStore,
    factory: &F,
    mut metadata: Option<&mut MetadataStore>,
) -> Result<Vec<EntityId>, SceneError>
where
    F: AnimationFactory + ?Sized,
{
    let mut created = Vec::new();
    let mut layers_visited = 0usize;

    let result = (|| -> Result<(), SceneError> {
        for (layer_index, layer) in document.layers.iter().enumerate() {
            if layer.kind() != LayerKind::ObjectGroup {
                continue;
            }
            layers_visited += 1;

            for object in layer.objects() {
                let entity = entities.create()?;
                created.push(entity);
                place(
                    document,
                    world_transform,
                    layer_index,
                    object,
                    entity,
                    transforms,
                    animations,
                    factory,
                    metadata.as_deref_mut(),
                )?;
            }
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            tracing::info!(
                entities = created.len(),
                layers = layers_visited,
                file = %document.meta.file,
                "scene built"
            );
            Ok(created)
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                rolled_back = created.len(),
                file = %document.meta.file,
                "scene build failed"
            );
            for &entity in &created {
                transforms.destroy_instance(entity);
                animations.destroy_instance(entity);
                if let Some(metadata) = metadata.as_deref_mut() {
                    metadata.destroy_instance(entity);
                }
                entities.destroy(entity);
            }
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn place<F>(
    document: &Document,
    world_transform: Mat4,
    layer_index: usize,
    object: &Object,
    entity: EntityId,
    transforms: &mut TransformStore,
    animations: &mut AnimationStore,
    factory: &F,
    metadata: Option<&mut MetadataStore>,
) -> Result<(), SceneError>
where
    F: AnimationFactory + ?Sized,
{
    let tileset = document.tileset_for(object.gid)?;
    let local = match object.shape {
        Shape::Rectangle => object_transform(document, tileset, object, layer_index),
    };
    transforms.set_local_transform(entity, world_transform * local);

    let animation = Arc::new(factory.create(object.gid)?);
    animations.set_animations(
        entity,
        HashMap::from([(INITIAL_SEQUENCE, animation)]),
        INITIAL_SEQUENCE,
    )?;

    if let Some(metadata) = metadata {
        metadata.create(entity, object.id);
        metadata.set_data(entity, "name", object.name.as_str())?;
    }

    tracing::debug!(
        %entity,
        object = object.id,
        gid = object.gid,
        tileset = %tileset.name,
        layer = layer_index,
        "object placed"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// SceneWorld
// ---------------------------------------------------------------------------

/// An allocator and the stores a build writes into, owned together.
#[derive(Debug)]
pub struct SceneWorld {
    pub entities: EntityAllocator,
    pub transforms: TransformStore,
    pub animations: AnimationStore,
    pub metadata: MetadataStore,
    config: SceneConfig,
}

impl SceneWorld {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            entities: EntityAllocator::with_capacity(config.entity_capacity),
            transforms: TransformStore::with_capacity(config.component_capacity),
            animations: AnimationStore::with_capacity(config.component_capacity),
            metadata: MetadataStore::with_capacity(config.component_capacity),
            config,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Build `document` into this world with animations read from its own
    /// tile records.
    pub fn load(
        &mut self,
        document: &Document,
        world_transform: Mat4,
    ) -> Result<Vec<EntityId>, SceneError> {
        let metadata = self.config.attach_metadata.then_some(&mut self.metadata);
        build(
            document,
            world_transform,
            &mut self.entities,
            &mut self.transforms,
            &mut self.animations,
            &TileAnimationFactory::new(document),
            metadata,
        )
    }

    /// Remove `entity` from every store and free its handle.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        let mut stores: [&mut dyn ComponentStorage; 3] =
            [&mut self.transforms, &mut self.animations, &mut self.metadata];
        destroy_entity(entity, &mut self.entities, &mut stores)
    }

    /// Step all animations by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.animations.advance(dt);
    }
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}
