//! Tessera Scene -- component stores and the builder that populates them
//! from tile-map documents.
//!
//! A [`SceneWorld`](builder::SceneWorld) owns an entity allocator plus the
//! transform, animation and metadata stores. Loading a
//! [`Document`](tessera_tmx::model::Document) places one entity per object
//! found in its object-group layers.
//!
//! # Quick Start
//!
//! ```
//! use glam::{Mat4, Vec3};
//! use tessera_scene::prelude::*;
//! use tessera_tmx::prelude::*;
//!
//! let tree = serde_json::json!({
//!     "orientation": "orthogonal", "renderorder": "right-down",
//!     "width": 4, "height": 4, "tilewidth": 32, "tileheight": 32,
//!     "tilesets": [{
//!         "name": "props", "firstgid": 1, "tilewidth": 32, "tileheight": 32,
//!         "image": "props.png", "imagewidth": 128, "imageheight": 32, "tilecount": 4
//!     }],
//!     "layers": [{ "type": "objectgroup", "name": "things", "objects": [
//!         { "id": 1, "name": "crate", "gid": 2, "x": 32, "y": 64, "width": 32, "height": 32 }
//!     ]}]
//! });
//! let doc = Document::from_value(&tree, Meta::new("./", "room.json")).unwrap();
//!
//! let mut world = SceneWorld::default();
//! let placed = world.load(&doc, Mat4::IDENTITY).unwrap();
//!
//! let origin = world.transforms.world_transform(placed[0]).unwrap().transform_point3(Vec3::ZERO);
//! assert_eq!(origin, Vec3::new(1.0, 1.0, 0.0));
//! assert_eq!(world.metadata.get(placed[0], "name").unwrap().unwrap(), "crate");
//! ```

#![deny(unsafe_code)]

pub mod animation;
pub mod bounds;
pub mod builder;
pub mod config;
pub mod metadata;
pub mod render;
pub mod transform;

use tessera_ecs::prelude::{EcsError, EntityId};
use tessera_tmx::TmxError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure classes shared by every crate in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedDocument,
    ResolutionFailure,
    AllocationExhaustion,
    /// A component lookup found nothing for the entity.
    NotFound,
    Io,
}

/// Errors produced while building or driving a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error(transparent)]
    Tmx(#[from] TmxError),

    /// An animation sequence was requested that the entity does not have.
    #[error("entity {entity} has no animation sequence {sequence}")]
    UnknownSequence { entity: EntityId, sequence: u32 },
}

impl SceneError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SceneError::Ecs(EcsError::NotFound { .. }) => ErrorKind::NotFound,
            SceneError::Ecs(EcsError::AllocationExhausted { .. }) => ErrorKind::AllocationExhaustion,
            SceneError::Tmx(err) => match err.kind() {
                tessera_tmx::ErrorKind::MalformedDocument => ErrorKind::MalformedDocument,
                tessera_tmx::ErrorKind::ResolutionFailure => ErrorKind::ResolutionFailure,
                tessera_tmx::ErrorKind::Io => ErrorKind::Io,
            },
            SceneError::UnknownSequence { .. } => ErrorKind::NotFound,
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::animation::{
        Animation, AnimationFactory, AnimationFrame, AnimationSet, AnimationStore,
        TileAnimationFactory,
    };
    pub use crate::bounds::{BoundingBox, BoundingBoxStore, BoundsInstance};
    pub use crate::builder::{build, object_transform, SceneWorld, INITIAL_SEQUENCE};
    pub use crate::config::SceneConfig;
    pub use crate::metadata::{Metadata, MetadataStore};
    pub use crate::render::{
        GeometryHandle, GeometryProvider, HeadlessGeometryProvider, LayoutHandle, QuadVertex,
        RenderInstance, RenderStore,
    };
    pub use crate::transform::{TransformInstance, TransformStore};
    pub use crate::{ErrorKind, SceneError};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_wrapped_error() {
        let e = EntityId::new(1, 0);
        assert_eq!(
            SceneError::from(EcsError::NotFound { entity: e }).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            SceneError::from(EcsError::AllocationExhausted { slots: 4 }).kind(),
            ErrorKind::AllocationExhaustion
        );
        assert_eq!(
            SceneError::from(TmxError::NoTileset { gid: 3 }).kind(),
            ErrorKind::ResolutionFailure
        );
        assert_eq!(
            SceneError::from(TmxError::BadFilename { input: "a/".into() }).kind(),
            ErrorKind::MalformedDocument
        );
    }

    #[test]
    fn transparent_errors_keep_inner_message() {
        let err = SceneError::from(TmxError::NoTileset { gid: 42 });
        assert_eq!(err.to_string(), "no tileset for tile id 42");
    }
}
