//! Frame animations attached to entities.
//!
//! An [`AnimationSet`] holds one or more numbered sequences and plays one of
//! them at a time. Sequences are shared through `Arc` because many entities
//! placed from the same tile play identical frames.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tessera_ecs::prelude::*;
use tessera_tmx::model::Document;
use tessera_tmx::TmxError;

use crate::SceneError;

// ---------------------------------------------------------------------------
// Animation data
// ---------------------------------------------------------------------------

/// One frame: which tile to show and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationFrame {
    /// Global tile id to draw.
    pub gid: u32,
    /// Zero means the frame is shown indefinitely.
    pub duration_ms: u32,
}

/// An ordered, looping list of frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub frames: Vec<AnimationFrame>,
}

impl Animation {
    /// A single frame that never advances.
    pub fn still(gid: u32) -> Self {
        Self {
            frames: vec![AnimationFrame { gid, duration_ms: 0 }],
        }
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.frames.iter().map(|f| f.duration_ms as u64).sum())
    }
}

/// Builds the animation for a placed tile.
pub trait AnimationFactory {
    fn create(&self, gid: u32) -> Result<Animation, SceneError>;
}

/// Reads animations straight from a document's tile records.
///
/// Tiles with animation frames play them (frame ids are converted from
/// tileset-local to global); every other tile becomes a still frame.
#[derive(Debug, Clone, Copy)]
pub struct TileAnimationFactory<'a> {
    document: &'a Document,
}

impl<'a> TileAnimationFactory<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }
}

impl AnimationFactory for TileAnimationFactory<'_> {
    fn create(&self, gid: u32) -> Result<Animation, SceneError> {
        let (tileset, tile) = self.document.tile(gid)?;
        let frames = match tile {
            Some(tile) if !tile.animation.is_empty() => &tile.animation,
            _ => return Ok(Animation::still(gid)),
        };
        let frames = frames
            .iter()
            .map(|f| -> Result<AnimationFrame, SceneError> {
                let gid = tileset.gid(f.tile_id).ok_or_else(|| TmxError::TileOutOfRange {
                    tileset: tileset.name.clone(),
                    tile_id: f.tile_id,
                    tile_count: tileset.tile_count,
                })?;
                Ok(AnimationFrame {
                    gid,
                    duration_ms: f.duration,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Animation { frames })
    }
}

// ---------------------------------------------------------------------------
// AnimationSet
// ---------------------------------------------------------------------------

/// The sequences available to one entity and its playback position.
#[derive(Debug, Clone)]
pub struct AnimationSet {
    sequences: HashMap<u32, Arc<Animation>>,
    current: u32,
    frame: usize,
    elapsed: Duration,
}

impl AnimationSet {
    pub fn current_sequence(&self) -> u32 {
        self.current
    }

    pub fn current_frame(&self) -> Option<AnimationFrame> {
        self.sequences
            .get(&self.current)
            .and_then(|a| a.frames.get(self.frame))
            .copied()
    }

    pub fn sequences(&self) -> &HashMap<u32, Arc<Animation>> {
        &self.sequences
    }

    fn advance(&mut self, dt: Duration) {
        let Some(animation) = self.sequences.get(&self.current) else {
            return;
        };
        if animation.frames.is_empty() {
            return;
        }
        self.elapsed += dt;
        // Whole cycles land back on the same frame; skip them when every
        // frame advances.
        if animation.frames.iter().all(|f| f.duration_ms > 0) {
            let cycle = animation.total_duration().as_nanos();
            let within = self.elapsed.as_nanos() % cycle;
            self.elapsed = Duration::from_nanos(within as u64);
        }
        loop {
            let duration = Duration::from_millis(animation.frames[self.frame].duration_ms as u64);
            if duration.is_zero() || self.elapsed < duration {
                break;
            }
            self.elapsed -= duration;
            self.frame = (self.frame + 1) % animation.frames.len();
        }
    }
}

// ---------------------------------------------------------------------------
// AnimationStore
// ---------------------------------------------------------------------------

/// Per-entity animation playback.
#[derive(Debug, Default)]
pub struct AnimationStore {
    store: ComponentStore<AnimationSet>,
}

impl AnimationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: ComponentStore::with_capacity(capacity),
        }
    }

    /// Replace the entity's sequences and start playing `start` from its
    /// first frame.
    pub fn set_animations(
        &mut self,
        entity: EntityId,
        sequences: HashMap<u32, Arc<Animation>>,
        start: u32,
    ) -> Result<(), SceneError> {
        if !sequences.contains_key(&start) {
            return Err(SceneError::UnknownSequence {
                entity,
                sequence: start,
            });
        }
        self.store.set(
            entity,
            AnimationSet {
                sequences,
                current: start,
                frame: 0,
                elapsed: Duration::ZERO,
            },
        );
        Ok(())
    }

    /// Switch to another sequence, restarting it. Playing the current
    /// sequence again is a no-op.
    pub fn play(&mut self, entity: EntityId, sequence: u32) -> Result<(), SceneError> {
        let set = self.store.get_mut(entity)?;
        if !set.sequences.contains_key(&sequence) {
            return Err(SceneError::UnknownSequence { entity, sequence });
        }
        if set.current != sequence {
            set.current = sequence;
            set.frame = 0;
            set.elapsed = Duration::ZERO;
        }
        Ok(())
    }

    pub fn get(&self, entity: EntityId) -> Result<&AnimationSet, EcsError> {
        self.store.get(entity)
    }

    pub fn current_frame(&self, entity: EntityId) -> Result<Option<AnimationFrame>, EcsError> {
        self.store.get(entity).map(AnimationSet::current_frame)
    }

    /// Step every animation forward by `dt`, looping at the end.
    pub fn advance(&mut self, dt: Duration) {
        for (_, set) in self.store.iter_mut() {
            set.advance(dt);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &AnimationSet)> {
        self.store.iter()
    }
}

impl ComponentStorage for AnimationStore {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn walk() -> Arc<Animation> {
        Arc::new(Animation {
            frames: vec![
                AnimationFrame { gid: 10, duration_ms: 100 },
                AnimationFrame { gid: 11, duration_ms: 50 },
            ],
        })
    }

    fn single(id: u32, animation: Arc<Animation>) -> HashMap<u32, Arc<Animation>> {
        HashMap::from([(id, animation)])
    }

    #[test]
    fn starts_at_first_frame() {
        let mut store = AnimationStore::new();
        let e = EntityId::new(0, 0);
        store.set_animations(e, single(0, walk()), 0).unwrap();
        assert_eq!(store.current_frame(e).unwrap().unwrap().gid, 10);
    }

    #[test]
    fn advance_steps_and_loops() {
        let mut store = AnimationStore::new();
        let e = EntityId::new(0, 0);
        store.set_animations(e, single(0, walk()), 0).unwrap();

        store.advance(Duration::from_millis(99));
        assert_eq!(store.current_frame(e).unwrap().unwrap().gid, 10);
        store.advance(Duration::from_millis(1));
        assert_eq!(store.current_frame(e).unwrap().unwrap().gid, 11);
        // 50ms finishes frame 11, 100ms more finishes frame 10 again.
        store.advance(Duration::from_millis(150));
        assert_eq!(store.current_frame(e).unwrap().unwrap().gid, 11);
    }

    #[test]
    fn still_frames_never_advance() {
        let mut store = AnimationStore::new();
        let e = EntityId::new(0, 0);
        store
            .set_animations(e, single(0, Arc::new(Animation::still(7))), 0)
            .unwrap();
        store.advance(Duration::from_secs(60));
        assert_eq!(
            store.current_frame(e).unwrap(),
            Some(AnimationFrame { gid: 7, duration_ms: 0 })
        );
    }

    #[test]
    fn unknown_start_sequence_is_rejected() {
        let mut store = AnimationStore::new();
        let e = EntityId::new(0, 0);
        let err = store.set_animations(e, single(0, walk()), 3).unwrap_err();
        assert!(matches!(err, SceneError::UnknownSequence { sequence: 3, .. }));
        assert!(store.get(e).is_err());
    }

    #[test]
    fn play_switches_and_restarts() {
        let mut store = AnimationStore::new();
        let e = EntityId::new(0, 0);
        let mut sequences = single(0, walk());
        sequences.insert(1, Arc::new(Animation::still(42)));
        store.set_animations(e, sequences, 0).unwrap();

        store.advance(Duration::from_millis(120));
        store.play(e, 1).unwrap();
        assert_eq!(store.current_frame(e).unwrap().unwrap().gid, 42);
        assert_eq!(store.get(e).unwrap().current_sequence(), 1);
        assert!(store.play(e, 9).is_err());
    }

    #[test]
    fn long_step_matches_short_steps() {
        let mut store = AnimationStore::new();
        let (a, b) = (EntityId::new(0, 0), EntityId::new(1, 0));
        store.set_animations(a, single(0, walk()), 0).unwrap();
        store.set_animations(b, single(0, walk()), 0).unwrap();

        // 10^6 full cycles of 150ms plus 120ms.
        store.advance(Duration::from_millis(150_000_000 + 120));
        assert_eq!(store.current_frame(a).unwrap().unwrap().gid, 11);

        let mut stepped = AnimationStore::new();
        stepped.set_animations(b, single(0, walk()), 0).unwrap();
        stepped.advance(Duration::from_millis(120));
        assert_eq!(
            store.current_frame(b).unwrap(),
            stepped.current_frame(b).unwrap()
        );
        // 20ms into frame 11 either way: 29ms more stays, 30ms more wraps.
        store.advance(Duration::from_millis(29));
        assert_eq!(store.current_frame(a).unwrap().unwrap().gid, 11);
        store.advance(Duration::from_millis(1));
        assert_eq!(store.current_frame(a).unwrap().unwrap().gid, 10);
    }

    #[test]
    fn factory_maps_frames_to_global_ids() {
        let doc = frames_document();
        let factory = TileAnimationFactory::new(&doc);
        let animation = factory.create(11).unwrap();
        let gids: Vec<u32> = animation.frames.iter().map(|f| f.gid).collect();
        assert_eq!(gids, [11, 12]);
        assert_eq!(factory.create(12).unwrap(), Animation::still(12));
        assert!(factory.create(99).is_err());
    }

    #[test]
    fn factory_rejects_frame_outside_tileset() {
        let mut doc = frames_document();
        doc.tilesets[0].tiles[0].animation[1].tile_id = u32::MAX;
        let err = TileAnimationFactory::new(&doc).create(11).unwrap_err();
        assert!(matches!(
            err,
            SceneError::Tmx(TmxError::TileOutOfRange { tile_id: u32::MAX, .. })
        ));
    }

    /// Tileset at firstgid 10 with four tiles; tile 1 animates 1 -> 2.
    fn frames_document() -> Document {
        let tree = serde_json::json!({
            "orientation": "orthogonal", "renderorder": "right-down",
            "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
            "tilesets": [{
                "name": "fx", "firstgid": 10, "tilewidth": 16, "tileheight": 16,
                "image": "fx.png", "imagewidth": 64, "imageheight": 16, "tilecount": 4,
                "tiles": [{ "id": 1, "animation": [
                    { "tileid": 1, "duration": 80 },
                    { "tileid": 2, "duration": 80 }
                ]}]
            }],
            "layers": []
        });
        Document::from_value(&tree, tessera_tmx::meta::Meta::new("./", "fx.json")).unwrap()
    }

    #[test]
    fn total_duration_sums_frames() {
        assert_eq!(walk().total_duration(), Duration::from_millis(150));
        assert_eq!(Animation::still(1).total_duration(), Duration::ZERO);
    }
}
