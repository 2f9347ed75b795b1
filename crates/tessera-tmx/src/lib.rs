//! Tessera TMX -- tile-map documents and tileset resolution.
//!
//! A tile-map document describes a 2D scene as tilesets (images cut into
//! tiles, each owning a contiguous range of global tile ids) and layers (tile
//! grids or groups of placed objects). This crate turns the nested key/value
//! tree of such a document into a validated [`Document`](model::Document) and
//! answers "which tileset owns this tile id".
//!
//! # Quick Start
//!
//! ```
//! use tessera_tmx::prelude::*;
//!
//! let tree = serde_json::json!({
//!     "orientation": "orthogonal", "renderorder": "right-down",
//!     "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
//!     "tilesets": [{
//!         "name": "props", "firstgid": 1, "tilewidth": 16, "tileheight": 16,
//!         "image": "props.png", "imagewidth": 64, "imageheight": 16, "tilecount": 4
//!     }],
//!     "layers": [{ "type": "tilelayer", "name": "floor", "width": 1, "height": 1, "data": [3] }]
//! });
//! let doc = Document::from_value(&tree, Meta::split("maps/room.json").unwrap()).unwrap();
//!
//! assert_eq!(resolve(&doc, 3).unwrap(), 0);
//! assert_eq!(doc.tilesets[0].image, "maps/props.png");
//! ```

#![deny(unsafe_code)]

pub mod meta;
pub mod model;
pub mod parse;
pub mod resolve;
pub mod source;

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Broad failure classes callers usually branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document is structurally wrong or uses unsupported values.
    MalformedDocument,
    /// A tile id has no owning tileset.
    ResolutionFailure,
    /// The document could not be read.
    Io,
}

/// Errors produced while loading, parsing or resolving a document.
#[derive(Debug, thiserror::Error)]
pub enum TmxError {
    /// An enumerated field holds a value this engine does not handle.
    #[error("unsupported {field} value '{value}'")]
    UnsupportedValue { field: &'static str, value: String },

    /// A required field is absent or null.
    #[error("{context}: missing required field '{field}'")]
    MissingField { context: String, field: &'static str },

    /// A field is present but has the wrong type or range.
    #[error("{context}: field '{field}' is not {expected}")]
    InvalidField {
        context: String,
        field: &'static str,
        expected: &'static str,
    },

    /// A transparent colour is not a hex RGB string.
    #[error("invalid transparent color '{value}'")]
    InvalidTransparentColor { value: String },

    /// A combined path has nothing after its last separator.
    #[error("bad filename '{input}': argument must contain a file")]
    BadFilename { input: String },

    /// Tileset ranges are unsorted or overlap.
    #[error("tileset '{next}' (firstgid {first_gid}) overlaps or precedes tileset '{previous}'")]
    TilesetOrder {
        previous: String,
        next: String,
        first_gid: u32,
    },

    /// A layer references a tile id no tileset owns.
    #[error("layer '{layer}' references tile {gid} which no tileset covers")]
    UncoveredTile { layer: String, gid: u32 },

    /// A tile record or animation frame names a local id past the end of
    /// its tileset.
    #[error("tileset '{tileset}': tile id {tile_id} is outside its {tile_count} tiles")]
    TileOutOfRange {
        tileset: String,
        tile_id: u32,
        tile_count: u32,
    },

    /// A tile id falls outside every tileset's range.
    #[error("no tileset for tile id {gid}")]
    NoTileset { gid: u32 },

    /// The document file could not be read.
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document file is not valid JSON.
    #[error("failed to parse {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TmxError {
    /// Broad class of this error. Unreadable files are `Io`, unowned tile
    /// ids are `ResolutionFailure`, everything else is a malformed document.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TmxError::NoTileset { .. } => ErrorKind::ResolutionFailure,
            TmxError::Io { .. } => ErrorKind::Io,
            _ => ErrorKind::MalformedDocument,
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::meta::Meta;
    pub use crate::model::{
        Document, Frame, Layer, LayerContent, LayerKind, Object, Orientation, RenderOrder, Shape,
        Terrain, Tile, TileObjectGroup, TileOffset, Tileset, TransparentColor,
    };
    pub use crate::resolve::resolve;
    pub use crate::source::{DocumentSource, JsonFileSource};
    pub use crate::{ErrorKind, TmxError};
}
