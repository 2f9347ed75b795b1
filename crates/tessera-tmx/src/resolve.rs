//! Mapping global tile ids to the tileset that owns them.

use crate::model::{Document, LayerContent, Tile, Tileset};
use crate::TmxError;

impl Tileset {
    /// Whether `gid` falls in `first_gid..first_gid + tile_count`.
    pub fn contains(&self, gid: u32) -> bool {
        let gid = gid as u64;
        let first = self.first_gid as u64;
        gid >= first && gid < first + self.tile_count as u64
    }

    /// Tileset-local id of `gid`, if this tileset owns it.
    pub fn local_id(&self, gid: u32) -> Option<u32> {
        self.contains(gid).then(|| gid - self.first_gid)
    }

    /// Global id of tileset-local `local_id`, if the tileset has that tile.
    pub fn gid(&self, local_id: u32) -> Option<u32> {
        if local_id >= self.tile_count {
            return None;
        }
        self.first_gid.checked_add(local_id)
    }
}

/// Index of the tileset whose range contains `gid`.
///
/// Tilesets are scanned in document order; maps rarely carry more than a
/// handful.
pub fn resolve(document: &Document, gid: u32) -> Result<usize, TmxError> {
    document
        .tilesets
        .iter()
        .position(|ts| ts.contains(gid))
        .ok_or(TmxError::NoTileset { gid })
}

impl Document {
    /// The tileset that owns `gid`.
    pub fn tileset_for(&self, gid: u32) -> Result<&Tileset, TmxError> {
        resolve(self, gid).map(|i| &self.tilesets[i])
    }

    /// The owning tileset of `gid` and its tile record, if the tile has one.
    pub fn tile(&self, gid: u32) -> Result<(&Tileset, Option<&Tile>), TmxError> {
        let tileset = self.tileset_for(gid)?;
        Ok((tileset, tileset.tile(gid - tileset.first_gid)))
    }
}

/// Check that tilesets are sorted with disjoint ranges, that tile records and
/// animation frames stay inside their tileset, and that every tile referenced
/// by a layer has an owner. Gid `0` means "no tile" and is skipped.
pub(crate) fn validate(document: &Document) -> Result<(), TmxError> {
    for tileset in &document.tilesets {
        let local_ids = tileset
            .tiles
            .iter()
            .flat_map(|t| std::iter::once(t.id).chain(t.animation.iter().map(|f| f.tile_id)));
        for tile_id in local_ids {
            if tileset.gid(tile_id).is_none() {
                return Err(TmxError::TileOutOfRange {
                    tileset: tileset.name.clone(),
                    tile_id,
                    tile_count: tileset.tile_count,
                });
            }
        }
    }

    for pair in document.tilesets.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        let previous_end = previous.first_gid as u64 + previous.tile_count as u64;
        if (next.first_gid as u64) < previous_end {
            return Err(TmxError::TilesetOrder {
                previous: previous.name.clone(),
                next: next.name.clone(),
                first_gid: next.first_gid,
            });
        }
    }

    for layer in &document.layers {
        let referenced: Box<dyn Iterator<Item = u32> + '_> = match &layer.content {
            LayerContent::Tiles(data) => Box::new(data.iter().copied()),
            LayerContent::Objects(objects) => Box::new(objects.iter().map(|o| o.gid)),
        };
        for gid in referenced.filter(|&gid| gid != 0) {
            if resolve(document, gid).is_err() {
                return Err(TmxError::UncoveredTile {
                    layer: layer.name.clone(),
                    gid,
                });
            }
        }
    }
    Ok(())
}
