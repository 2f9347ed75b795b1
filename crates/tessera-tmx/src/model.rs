//! In-memory tile-map document.
//!
//! The types here mirror the tile-map interchange format closely: a map holds
//! tilesets and layers, object layers hold placed objects, and tiles may carry
//! properties, animation frames, terrain membership and collision shapes.
//! A [`Document`] is produced once by [`crate::parse`] and is read-only
//! afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::meta::Meta;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Map projection. Only orthogonal maps are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Orthogonal,
}

/// Order in which tiles are drawn. Only right-down is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderOrder {
    RightDown,
}

/// Geometry of a placed object. Only rectangles are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Rectangle,
}

/// Discriminant of a [`Layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    TileLayer,
    ObjectGroup,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A fully parsed and validated tile-map document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Where the document was loaded from.
    pub meta: Meta,
    pub orientation: Orientation,
    pub render_order: RenderOrder,
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Width of a map grid cell in pixels.
    pub tile_width: u32,
    /// Height of a map grid cell in pixels.
    pub tile_height: u32,
    pub next_object_id: u32,
    /// Sorted by ascending `first_gid`, ranges pairwise disjoint.
    pub tilesets: Vec<Tileset>,
    /// In document (draw) order.
    pub layers: Vec<Layer>,
}

// ---------------------------------------------------------------------------
// Tilesets
// ---------------------------------------------------------------------------

/// A collection of tiles cut from one image, owning the global tile ids
/// `first_gid..first_gid + tile_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    pub name: String,
    pub first_gid: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    /// Image path, joined onto the document's directory.
    pub image: String,
    pub image_width: u32,
    pub image_height: u32,
    pub transparent_color: TransparentColor,
    pub tile_offset: TileOffset,
    pub terrains: Vec<Terrain>,
    pub tile_count: u32,
    /// Only tiles with extra data appear here; most tiles have no record.
    pub tiles: Vec<Tile>,
}

impl Tileset {
    /// Look up the record for a tile by its tileset-local id.
    pub fn tile(&self, local_id: u32) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == local_id)
    }
}

/// Colour keyed out of the tileset image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransparentColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// `false` when the document does not declare a transparent colour.
    pub in_use: bool,
}

/// Pixel offset applied when drawing tiles from this tileset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileOffset {
    pub x: i32,
    pub y: i32,
}

/// A named terrain type, represented by one of the tileset's tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    pub name: String,
    /// Local id of the representative tile, `-1` for none.
    pub tile: i32,
}

/// Extra data attached to a single tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Tileset-local id.
    pub id: u32,
    pub properties: BTreeMap<String, String>,
    /// Collision shapes drawn in the tile editor.
    pub object_group: Option<TileObjectGroup>,
    pub animation: Vec<Frame>,
    /// Terrain index for each corner, `-1` where no terrain applies.
    pub terrain: Vec<i32>,
}

/// One frame of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Tileset-local id of the tile shown during this frame.
    pub tile_id: u32,
    /// Milliseconds.
    pub duration: u32,
}

/// Shapes attached to a single tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileObjectGroup {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub objects: Vec<Object>,
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// A tile grid or an object group.
///
/// Object groups have no grid: `x`, `y`, `width` and `height` are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    pub opacity: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub content: LayerContent,
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self.content {
            LayerContent::Tiles(_) => LayerKind::TileLayer,
            LayerContent::Objects(_) => LayerKind::ObjectGroup,
        }
    }

    /// Placed objects, empty for tile layers.
    pub fn objects(&self) -> &[Object] {
        match &self.content {
            LayerContent::Objects(objects) => objects,
            LayerContent::Tiles(_) => &[],
        }
    }
}

/// Payload of a [`Layer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerContent {
    /// Row-major global tile ids, `0` for an empty cell.
    Tiles(Vec<u32>),
    Objects(Vec<Object>),
}

/// A placed object.
///
/// Position and size are in pixels. The position is the object's bottom-left
/// corner when it references a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: u32,
    pub name: String,
    pub kind: String,
    pub shape: Shape,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    /// Referenced global tile id, `0` when the object is not a tile.
    pub gid: u32,
    pub visible: bool,
}
