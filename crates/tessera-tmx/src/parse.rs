//! Conversion of a nested key/value tree into a [`Document`].
//!
//! The tree is whatever the document source produced: the interchange format's
//! maps become JSON objects and its lists become JSON arrays. Every required
//! field is checked; enumerated fields accept only the values this engine can
//! place, and anything else is reported rather than guessed.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::meta::Meta;
use crate::model::{
    Document, Frame, Layer, LayerContent, LayerKind, Object, Orientation, RenderOrder, Shape,
    Terrain, Tile, TileObjectGroup, TileOffset, Tileset, TransparentColor,
};
use crate::resolve;
use crate::TmxError;

/// Parse and validate a document tree.
///
/// `meta` records where the tree came from; tileset image paths are resolved
/// against `meta.path`.
pub fn parse_document(value: &Value, meta: Meta) -> Result<Document, TmxError> {
    let root = Node::new(value, "map".to_owned())?;

    let orientation = orientation(root.req_str("orientation")?)?;
    let render_order = render_order(root.req_str("renderorder")?)?;

    let tilesets = root
        .req_array("tilesets")?
        .iter()
        .enumerate()
        .map(|(i, v)| tileset(Node::new(v, format!("tilesets[{i}]"))?, &meta))
        .collect::<Result<Vec<_>, _>>()?;

    let layers = root
        .req_array("layers")?
        .iter()
        .enumerate()
        .map(|(i, v)| layer(Node::new(v, format!("layers[{i}]"))?))
        .collect::<Result<Vec<_>, _>>()?;

    let document = Document {
        orientation,
        render_order,
        width: root.req_u32("width")?,
        height: root.req_u32("height")?,
        tile_width: root.req_positive("tilewidth")?,
        tile_height: root.req_positive("tileheight")?,
        next_object_id: root.opt_u32("nextobjectid", 0)?,
        tilesets,
        layers,
        meta,
    };

    resolve::validate(&document)?;

    tracing::debug!(
        file = %document.meta.file,
        tilesets = document.tilesets.len(),
        layers = document.layers.len(),
        "parsed tile-map document"
    );
    Ok(document)
}

// ---------------------------------------------------------------------------
// Enumerated fields
// ---------------------------------------------------------------------------

fn unsupported(field: &'static str, value: &str) -> TmxError {
    TmxError::UnsupportedValue {
        field,
        value: value.to_owned(),
    }
}

fn orientation(raw: &str) -> Result<Orientation, TmxError> {
    match raw {
        "orthogonal" => Ok(Orientation::Orthogonal),
        other => Err(unsupported("orientation", other)),
    }
}

fn render_order(raw: &str) -> Result<RenderOrder, TmxError> {
    match raw {
        "right-down" => Ok(RenderOrder::RightDown),
        other => Err(unsupported("renderorder", other)),
    }
}

fn layer_kind(raw: &str) -> Result<LayerKind, TmxError> {
    match raw {
        "tilelayer" => Ok(LayerKind::TileLayer),
        "objectgroup" => Ok(LayerKind::ObjectGroup),
        other => Err(unsupported("layer type", other)),
    }
}

fn shape(raw: &str) -> Result<Shape, TmxError> {
    match raw {
        "rectangle" => Ok(Shape::Rectangle),
        other => Err(unsupported("shape", other)),
    }
}

/// The interchange format's JSON flavour marks shapes with flags instead of
/// a `shape` field.
fn inferred_shape(node: &Node<'_>) -> &'static str {
    const MARKERS: [&str; 5] = ["ellipse", "point", "polygon", "polyline", "text"];
    MARKERS
        .into_iter()
        .find(|marker| match node.get(marker) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Null) | None => false,
            Some(_) => true,
        })
        .unwrap_or("rectangle")
}

// ---------------------------------------------------------------------------
// Tilesets
// ---------------------------------------------------------------------------

fn tileset(node: Node<'_>, meta: &Meta) -> Result<Tileset, TmxError> {
    let transparent_color = match node.get("transparentcolor") {
        None | Some(Value::Null) => TransparentColor::default(),
        Some(_) => transparent_color(node.req_str("transparentcolor")?)?,
    };

    let tile_offset = match node.get("tileoffset") {
        None | Some(Value::Null) => TileOffset::default(),
        Some(v) => {
            let offset = node.child(v, "tileoffset")?;
            TileOffset {
                x: offset.req_i32("x")?,
                y: offset.req_i32("y")?,
            }
        }
    };

    let terrains = node
        .opt_array("terrains")?
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let t = node.child(v, &format!("terrains[{i}]"))?;
            Ok(Terrain {
                name: t.req_str("name")?.to_owned(),
                tile: t.req_i32("tile")?,
            })
        })
        .collect::<Result<Vec<_>, TmxError>>()?;

    let tiles = node
        .opt_array("tiles")?
        .iter()
        .enumerate()
        .map(|(i, v)| tile(node.child(v, &format!("tiles[{i}]"))?))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Tileset {
        name: node.req_str("name")?.to_owned(),
        first_gid: node.req_u32("firstgid")?,
        tile_width: node.req_positive("tilewidth")?,
        tile_height: node.req_positive("tileheight")?,
        spacing: node.opt_u32("spacing", 0)?,
        margin: node.opt_u32("margin", 0)?,
        image: meta.join(node.req_str("image")?),
        image_width: node.req_u32("imagewidth")?,
        image_height: node.req_u32("imageheight")?,
        transparent_color,
        tile_offset,
        terrains,
        tile_count: node.req_u32("tilecount")?,
        tiles,
    })
}

/// Decode `#rrggbb` (or `#aarrggbb`; the alpha byte is ignored).
fn transparent_color(raw: &str) -> Result<TransparentColor, TmxError> {
    let hex = raw.strip_prefix('#').unwrap_or(raw);
    let invalid = || TmxError::InvalidTransparentColor {
        value: raw.to_owned(),
    };
    if hex.is_empty() || hex.len() > 8 {
        return Err(invalid());
    }
    let rgb = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
    Ok(TransparentColor {
        r: ((rgb & 0xff0000) >> 16) as u8,
        g: ((rgb & 0x00ff00) >> 8) as u8,
        b: (rgb & 0x0000ff) as u8,
        in_use: true,
    })
}

fn tile(node: Node<'_>) -> Result<Tile, TmxError> {
    let object_group = match node.get("objectgroup").or_else(|| node.get("objectGroup")) {
        None | Some(Value::Null) => None,
        Some(v) => Some(tile_object_group(node.child(v, "objectgroup")?)?),
    };

    let animation = node
        .opt_array("animation")?
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let f = node.child(v, &format!("animation[{i}]"))?;
            Ok(Frame {
                tile_id: f.req_u32("tileid")?,
                duration: f.req_u32("duration")?,
            })
        })
        .collect::<Result<Vec<_>, TmxError>>()?;

    let terrain = node
        .opt_array("terrain")?
        .iter()
        .map(|v| as_i32(v).ok_or_else(|| node.invalid("terrain", "a list of integers")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Tile {
        id: node.req_u32("id")?,
        properties: node.properties()?,
        object_group,
        animation,
        terrain,
    })
}

fn tile_object_group(node: Node<'_>) -> Result<TileObjectGroup, TmxError> {
    if let Some(kind) = node.opt_str("type")? {
        if layer_kind(kind)? != LayerKind::ObjectGroup {
            return Err(unsupported("tile objectgroup type", kind));
        }
    }
    Ok(TileObjectGroup {
        name: node.opt_str("name")?.unwrap_or_default().to_owned(),
        visible: node.opt_bool("visible", true)?,
        opacity: node.opt_f32("opacity", 1.0)?,
        offset_x: node.opt_f32("offsetx", 0.0)?,
        offset_y: node.opt_f32("offsety", 0.0)?,
        objects: objects(&node)?,
    })
}

// ---------------------------------------------------------------------------
// Layers and objects
// ---------------------------------------------------------------------------

fn layer(node: Node<'_>) -> Result<Layer, TmxError> {
    let kind = layer_kind(node.req_str("type")?)?;

    let (x, y, width, height, content) = match kind {
        LayerKind::TileLayer => {
            let data = node
                .req_array("data")?
                .iter()
                .map(|v| as_u32(v).ok_or_else(|| node.invalid("data", "a list of tile ids")))
                .collect::<Result<Vec<_>, _>>()?;
            (
                node.opt_i32("x", 0)?,
                node.opt_i32("y", 0)?,
                node.req_u32("width")?,
                node.req_u32("height")?,
                LayerContent::Tiles(data),
            )
        }
        LayerKind::ObjectGroup => (0, 0, 0, 0, LayerContent::Objects(objects(&node)?)),
    };

    Ok(Layer {
        name: node.req_str("name")?.to_owned(),
        x,
        y,
        width,
        height,
        visible: node.opt_bool("visible", true)?,
        opacity: node.opt_f32("opacity", 1.0)?,
        offset_x: node.opt_f32("offsetx", 0.0)?,
        offset_y: node.opt_f32("offsety", 0.0)?,
        content,
    })
}

fn objects(node: &Node<'_>) -> Result<Vec<Object>, TmxError> {
    node.opt_array("objects")?
        .iter()
        .enumerate()
        .map(|(i, v)| object(node.child(v, &format!("objects[{i}]"))?))
        .collect()
}

fn object(node: Node<'_>) -> Result<Object, TmxError> {
    let shape = match node.opt_str("shape")? {
        Some(raw) => shape(raw)?,
        None => shape(inferred_shape(&node))?,
    };

    Ok(Object {
        id: node.req_u32("id")?,
        name: node.opt_str("name")?.unwrap_or_default().to_owned(),
        kind: node
            .opt_str("type")?
            .or(node.opt_str("class")?)
            .unwrap_or_default()
            .to_owned(),
        shape,
        x: node.req_f32("x")?,
        y: node.req_f32("y")?,
        width: node.req_f32("width")?,
        height: node.req_f32("height")?,
        rotation: node.opt_f32("rotation", 0.0)?,
        gid: node.opt_u32("gid", 0)?,
        visible: node.opt_bool("visible", true)?,
    })
}

// ---------------------------------------------------------------------------
// Node: typed field access with error context
// ---------------------------------------------------------------------------

/// A JSON object plus a human-readable path used in error messages.
struct Node<'a> {
    map: &'a Map<String, Value>,
    context: String,
}

impl<'a> Node<'a> {
    fn new(value: &'a Value, context: String) -> Result<Self, TmxError> {
        match value {
            Value::Object(map) => Ok(Self { map, context }),
            _ => Err(TmxError::InvalidField {
                context,
                field: "<self>",
                expected: "an object",
            }),
        }
    }

    fn child(&self, value: &'a Value, name: &str) -> Result<Node<'a>, TmxError> {
        Node::new(value, format!("{}.{name}", self.context))
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field)
    }

    fn missing(&self, field: &'static str) -> TmxError {
        TmxError::MissingField {
            context: self.context.clone(),
            field,
        }
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> TmxError {
        TmxError::InvalidField {
            context: self.context.clone(),
            field,
            expected,
        }
    }

    fn req(&self, field: &'static str) -> Result<&'a Value, TmxError> {
        match self.map.get(field) {
            None | Some(Value::Null) => Err(self.missing(field)),
            Some(v) => Ok(v),
        }
    }

    fn opt(&self, field: &'static str) -> Option<&'a Value> {
        self.map.get(field).filter(|v| !v.is_null())
    }

    fn req_str(&self, field: &'static str) -> Result<&'a str, TmxError> {
        self.req(field)?
            .as_str()
            .ok_or_else(|| self.invalid(field, "a string"))
    }

    fn opt_str(&self, field: &'static str) -> Result<Option<&'a str>, TmxError> {
        self.opt(field)
            .map(|v| v.as_str().ok_or_else(|| self.invalid(field, "a string")))
            .transpose()
    }

    fn req_u32(&self, field: &'static str) -> Result<u32, TmxError> {
        as_u32(self.req(field)?).ok_or_else(|| self.invalid(field, "an unsigned integer"))
    }

    /// Tile sizes divide placement coordinates, so zero is rejected.
    fn req_positive(&self, field: &'static str) -> Result<u32, TmxError> {
        match self.req_u32(field)? {
            0 => Err(self.invalid(field, "a positive integer")),
            n => Ok(n),
        }
    }

    fn opt_u32(&self, field: &'static str, default: u32) -> Result<u32, TmxError> {
        match self.opt(field) {
            None => Ok(default),
            Some(v) => as_u32(v).ok_or_else(|| self.invalid(field, "an unsigned integer")),
        }
    }

    fn req_i32(&self, field: &'static str) -> Result<i32, TmxError> {
        as_i32(self.req(field)?).ok_or_else(|| self.invalid(field, "an integer"))
    }

    fn opt_i32(&self, field: &'static str, default: i32) -> Result<i32, TmxError> {
        match self.opt(field) {
            None => Ok(default),
            Some(v) => as_i32(v).ok_or_else(|| self.invalid(field, "an integer")),
        }
    }

    fn req_f32(&self, field: &'static str) -> Result<f32, TmxError> {
        self.req(field)?
            .as_f64()
            .map(|n| n as f32)
            .ok_or_else(|| self.invalid(field, "a number"))
    }

    fn opt_f32(&self, field: &'static str, default: f32) -> Result<f32, TmxError> {
        match self.opt(field) {
            None => Ok(default),
            Some(v) => v
                .as_f64()
                .map(|n| n as f32)
                .ok_or_else(|| self.invalid(field, "a number")),
        }
    }

    fn opt_bool(&self, field: &'static str, default: bool) -> Result<bool, TmxError> {
        match self.opt(field) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| self.invalid(field, "a boolean")),
        }
    }

    fn req_array(&self, field: &'static str) -> Result<&'a [Value], TmxError> {
        self.req(field)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.invalid(field, "a list"))
    }

    fn opt_array(&self, field: &'static str) -> Result<&'a [Value], TmxError> {
        match self.opt(field) {
            None => Ok(&[]),
            Some(v) => v
                .as_array()
                .map(Vec::as_slice)
                .ok_or_else(|| self.invalid(field, "a list")),
        }
    }

    /// Custom properties, either as a `{key: value}` map or as a list of
    /// `{name, value}` records. Values are stored in their textual form.
    fn properties(&self) -> Result<BTreeMap<String, String>, TmxError> {
        match self.opt("properties") {
            None => Ok(BTreeMap::new()),
            Some(Value::Object(map)) => Ok(map
                .iter()
                .map(|(k, v)| (k.clone(), property_text(v)))
                .collect()),
            Some(Value::Array(list)) => list
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let p = self.child(v, &format!("properties[{i}]"))?;
                    Ok((p.req_str("name")?.to_owned(), property_text(p.req("value")?)))
                })
                .collect(),
            Some(_) => Err(self.invalid("properties", "a map or a list")),
        }
    }
}

fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    // Lua-flavoured exports write integral numbers as floats.
    let f = value.as_f64()?;
    (f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f)).then_some(f as u32)
}

fn as_i32(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(&f)).then_some(f as i32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
