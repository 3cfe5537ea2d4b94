//! # Chunk System
//!
//! Wraps a generated map and pages fixed-size chunks in and out around a
//! moving viewer.
//!
//! ## Ownership
//!
//! The system owns the tile grid outright. [`ChunkSystem::set_tile`] is the
//! only way to edit it, and it updates the grid and the cached chunk (if
//! any) in the same call, so the two can never disagree.
//!
//! ## Paging
//!
//! ```text
//!            unload_radius
//!   ┌─────────────────────────────┐
//!   │        load_radius          │
//!   │    ┌───────────────┐        │   inside load  -> materialize + touch
//!   │    │       V       │        │   between      -> kept if cached
//!   │    └───────────────┘        │   outside      -> evicted
//!   └─────────────────────────────┘
//! ```
//!
//! Distances are Chebyshev, in chunks. `update_chunks` is meant to be
//! called at most once per frame; it is the only operation that evicts.

use std::collections::HashMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::chunk::{Chunk, ChunkCoord, EntityRef};
use crate::config::ChunkSystemConfig;
use crate::error::MapResult;
use crate::generator::MapGenerationResult;
use crate::tile::{TilePos, TileType};

/// Purpose tag for the query RNG stream.
const QUERY_PURPOSE: u64 = 0x7175_6572_795f_726e;

/// Paging counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Chunks materialized since construction.
    pub materialized: u64,
    /// Chunks evicted since construction.
    pub evicted: u64,
    /// Current access tick (one per `update_chunks` call).
    pub tick: u64,
}

/// Summary of the wrapped map for host systems.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapInfo {
    /// Grid width in tiles.
    pub width: i32,
    /// Grid height in tiles.
    pub height: i32,
    /// Theme id.
    pub theme_id: String,
    /// Enemy ids for this map.
    pub enemy_types: Vec<String>,
    /// Number of rooms.
    pub room_count: usize,
    /// Chunks currently cached.
    pub cached_chunk_count: usize,
}

/// Paged view over a generated map.
pub struct ChunkSystem {
    map: MapGenerationResult,
    config: ChunkSystemConfig,
    chunks: HashMap<ChunkCoord, Chunk>,
    rng: ChaCha8Rng,
    stats: ChunkStats,
}

impl ChunkSystem {
    /// Takes ownership of a generated map.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `config` fails validation.
    pub fn new(map: MapGenerationResult, config: ChunkSystemConfig) -> MapResult<Self> {
        config.validate()?;
        info!(
            width = map.width(),
            height = map.height(),
            theme = %map.theme().id(),
            chunk_size = config.chunk_size,
            "chunk system ready"
        );
        let rng = map.seed().derive(QUERY_PURPOSE).rng();
        Ok(Self {
            map,
            config,
            chunks: HashMap::new(),
            rng,
            stats: ChunkStats::default(),
        })
    }

    /// The wrapped map.
    #[must_use]
    pub fn map(&self) -> &MapGenerationResult {
        &self.map
    }

    /// Releases the wrapped map, dropping the chunk cache.
    #[must_use]
    pub fn into_map(self) -> MapGenerationResult {
        self.map
    }

    /// Pager tuning.
    #[must_use]
    pub fn config(&self) -> &ChunkSystemConfig {
        &self.config
    }

    /// Paging counters.
    #[must_use]
    pub fn stats(&self) -> ChunkStats {
        self.stats
    }

    // =========================================================================
    // Tile queries
    // =========================================================================

    /// Tile at `(x, y)`; `Wall` outside the map.
    #[inline]
    #[must_use]
    pub fn tile_at(&self, x: i32, y: i32) -> TileType {
        self.map.grid().get_or_wall(x, y)
    }

    /// Writes a tile to the grid and to the owning chunk if it is cached.
    /// Returns false (and changes nothing) outside the map.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: TileType) -> bool {
        if !self.map.grid_mut().set(x, y, tile) {
            return false;
        }
        let coord = ChunkCoord::from_tile(x, y, self.config.chunk_size);
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.write_world(x, y, tile);
        }
        true
    }

    /// Returns true if the tile at `(x, y)` can be walked on. False outside
    /// the map.
    #[inline]
    #[must_use]
    pub fn is_tile_passable(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y).is_passable()
    }

    /// Movement cost modifier at `(x, y)`; neutral (1.0) outside the map.
    #[inline]
    #[must_use]
    pub fn speed_multiplier(&self, x: i32, y: i32) -> f32 {
        self.map
            .grid()
            .get(x, y)
            .map_or(1.0, TileType::speed_multiplier)
    }

    // =========================================================================
    // Paging
    // =========================================================================

    /// Number of chunk columns covering the map.
    #[must_use]
    pub fn chunk_columns(&self) -> i32 {
        (self.map.width() + self.config.chunk_size - 1) / self.config.chunk_size
    }

    /// Number of chunk rows covering the map.
    #[must_use]
    pub fn chunk_rows(&self) -> i32 {
        (self.map.height() + self.config.chunk_size - 1) / self.config.chunk_size
    }

    /// Returns true if `coord` overlaps the map.
    #[must_use]
    pub fn is_valid_chunk(&self, coord: ChunkCoord) -> bool {
        (0..self.chunk_columns()).contains(&coord.x) && (0..self.chunk_rows()).contains(&coord.y)
    }

    fn ensure_chunk(&mut self, coord: ChunkCoord) -> &mut Chunk {
        let Self {
            map,
            config,
            chunks,
            stats,
            ..
        } = self;
        chunks.entry(coord).or_insert_with(|| {
            stats.materialized += 1;
            debug!(x = coord.x, y = coord.y, "materializing chunk");
            Chunk::materialize(coord, config.chunk_size, map.grid(), stats.tick)
        })
    }

    /// Loads every chunk within `load_radius` of the viewer, refreshes their
    /// access tick, then evicts cached chunks beyond `unload_radius`.
    ///
    /// `viewer_x`/`viewer_y` are in tiles. Chunks past the map edge are
    /// materialized too (they read as wall). Returns the number of chunks
    /// materialized by this call.
    pub fn update_chunks(&mut self, viewer_x: f32, viewer_y: f32) -> usize {
        self.stats.tick += 1;
        let tick = self.stats.tick;
        let before = self.stats.materialized;
        let center = ChunkCoord::from_world(viewer_x, viewer_y, self.config.chunk_size);
        let load = self.config.load_radius;

        for cy in center.y.saturating_sub(load)..=center.y.saturating_add(load) {
            for cx in center.x.saturating_sub(load)..=center.x.saturating_add(load) {
                self.ensure_chunk(ChunkCoord::new(cx, cy)).touch(tick);
            }
        }

        let unload = self.config.unload_radius;
        let evicted_before = self.chunks.len();
        self.chunks.retain(|coord, chunk| {
            let keep = coord.chebyshev(center) <= unload;
            if !keep {
                debug!(
                    x = coord.x,
                    y = coord.y,
                    dropped_entities = chunk.entities().len(),
                    "evicting chunk"
                );
            }
            keep
        });
        self.stats.evicted += (evicted_before - self.chunks.len()) as u64;

        (self.stats.materialized - before) as usize
    }

    /// Cache-or-create lookup. `None` for coordinates outside the map's
    /// chunk range.
    pub fn chunk(&mut self, coord: ChunkCoord) -> Option<&Chunk> {
        if !self.is_valid_chunk(coord) {
            return None;
        }
        Some(&*self.ensure_chunk(coord))
    }

    /// Cache lookup that never creates.
    #[must_use]
    pub fn cached_chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Returns true if `coord` is cached.
    #[must_use]
    pub fn is_cached(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of cached chunks.
    #[must_use]
    pub fn cached_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks visible on screen, created as needed.
    ///
    /// `viewer_screen` is the viewer's position in screen pixels; it is
    /// projected back into tiles through `tile_size * zoom`. The visibility
    /// radius covers half the screen diagonal plus one chunk of margin.
    /// Only chunks overlapping the map are returned, ordered row by row.
    pub fn chunks_to_render(
        &mut self,
        viewer_screen: (f32, f32),
        screen_width: f32,
        screen_height: f32,
        tile_size: f32,
        zoom: f32,
    ) -> Vec<&Chunk> {
        let scale = tile_size * zoom;
        if !(scale > 0.0) {
            return Vec::new();
        }
        let size = self.config.chunk_size;
        let center = ChunkCoord::from_world(viewer_screen.0 / scale, viewer_screen.1 / scale, size);

        let (columns, rows) = (self.chunk_columns(), self.chunk_rows());
        let half_diagonal = 0.5 * (screen_width * screen_width + screen_height * screen_height).sqrt();
        // A radius wider than the map covers the whole map.
        let radius = (half_diagonal / (scale * size as f32))
            .ceil()
            .min(columns.max(rows) as f32) as i32
            + 1;

        let x_lo = center.x.saturating_sub(radius).max(0);
        let x_hi = center.x.saturating_add(radius).min(columns - 1);
        let y_lo = center.y.saturating_sub(radius).max(0);
        let y_hi = center.y.saturating_add(radius).min(rows - 1);

        let mut visible = Vec::new();
        for cy in y_lo..=y_hi {
            for cx in x_lo..=x_hi {
                let coord = ChunkCoord::new(cx, cy);
                self.ensure_chunk(coord);
                visible.push(coord);
            }
        }
        visible.iter().filter_map(|c| self.chunks.get(c)).collect()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Registers an entity with the chunk owning tile `(x, y)`, creating the
    /// chunk if needed. False outside the map or if already registered.
    ///
    /// Registrations live in the cached chunk only: evicting the chunk drops
    /// them, and a re-materialized chunk starts with no entities.
    pub fn attach_entity(&mut self, x: i32, y: i32, entity: EntityRef) -> bool {
        if !self.map.grid().in_bounds(x, y) {
            return false;
        }
        let coord = ChunkCoord::from_tile(x, y, self.config.chunk_size);
        self.ensure_chunk(coord).attach(entity)
    }

    /// Removes an entity from the chunk owning tile `(x, y)`. False if the
    /// chunk is not cached or did not hold the entity.
    pub fn detach_entity(&mut self, x: i32, y: i32, entity: EntityRef) -> bool {
        let coord = ChunkCoord::from_tile(x, y, self.config.chunk_size);
        self.chunks
            .get_mut(&coord)
            .is_some_and(|chunk| chunk.detach(entity))
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    /// Random passable tile. Falls back to the first passable tile in scan
    /// order after `random_position_attempts` misses; `None` only if the map
    /// has no passable tile at all.
    pub fn random_passable_position(&mut self) -> Option<TilePos> {
        let (w, h) = (self.map.width(), self.map.height());
        for _ in 0..self.config.random_position_attempts {
            let x = self.rng.gen_range(1..w - 1);
            let y = self.rng.gen_range(1..h - 1);
            if self.is_tile_passable(x, y) {
                return Some(TilePos::new(x, y));
            }
        }
        let idx = self.map.grid().tiles().iter().position(|t| t.is_passable())?;
        Some(TilePos::new(idx as i32 % w, idx as i32 / w))
    }

    /// Center of the first room, or a random passable tile if there are no
    /// rooms or the center has since been walled in.
    pub fn player_spawn_position(&mut self) -> Option<TilePos> {
        if let Some(room) = self.map.rooms().first() {
            let center = room.center();
            if self.is_tile_passable(center.x, center.y) {
                return Some(center);
            }
        }
        self.random_passable_position()
    }

    /// Up to `count` passable enemy positions, all at least `min_distance`
    /// from `player`.
    ///
    /// Walks rooms after the first, skipping rooms whose center is closer
    /// than `min_distance`, and tries `enemies_per_room` random offsets in
    /// each remaining room.
    pub fn enemy_spawn_positions(
        &mut self,
        count: usize,
        player: TilePos,
        min_distance: f64,
    ) -> Vec<TilePos> {
        let mut positions = Vec::with_capacity(count);
        let rooms: Vec<_> = self.map.rooms().iter().skip(1).copied().collect();

        for room in rooms {
            if positions.len() >= count {
                break;
            }
            if room.center().distance(player) < min_distance {
                continue;
            }
            for _ in 0..self.config.enemies_per_room {
                if positions.len() >= count {
                    break;
                }
                let pos = TilePos::new(
                    self.rng.gen_range(room.x..room.x + room.width),
                    self.rng.gen_range(room.y..room.y + room.height),
                );
                if self.is_tile_passable(pos.x, pos.y)
                    && pos.distance(player) >= min_distance
                    && !positions.contains(&pos)
                {
                    positions.push(pos);
                }
            }
        }
        positions
    }

    /// Enemy id drawn from this map's pool (theme fallback when empty).
    pub fn random_enemy_type(&mut self) -> String {
        let pool = self.map.enemy_types();
        if pool.is_empty() {
            return self.map.theme().random_enemy_type(&mut self.rng).to_string();
        }
        pool[self.rng.gen_range(0..pool.len())].clone()
    }

    /// Summary for host systems.
    #[must_use]
    pub fn map_info(&self) -> MapInfo {
        MapInfo {
            width: self.map.width(),
            height: self.map.height(),
            theme_id: self.map.theme().id().to_string(),
            enemy_types: self.map.enemy_types().to_vec(),
            room_count: self.map.rooms().len(),
            cached_chunk_count: self.chunks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::generator::MapGenerator;
    use crate::seed::MapSeed;
    use crate::theme;

    fn system(width: i32, height: i32, config: ChunkSystemConfig) -> ChunkSystem {
        let map = MapGenerator::new(GeneratorConfig::default())
            .generate(width, height, &theme::forest(), MapSeed::new(42), None)
            .unwrap();
        ChunkSystem::new(map, config).unwrap()
    }

    #[test]
    fn test_rejects_oversized_chunk_config() {
        let map = MapGenerator::new(GeneratorConfig::default())
            .generate(32, 32, &theme::cave(), MapSeed::new(1), None)
            .unwrap();
        let config = ChunkSystemConfig {
            chunk_size: 50_000,
            ..ChunkSystemConfig::production()
        };
        assert!(matches!(
            ChunkSystem::new(map, config),
            Err(crate::error::MapError::Config(_))
        ));
    }

    #[test]
    fn test_bounds_safety() {
        let sys = system(64, 64, ChunkSystemConfig::production());
        assert_eq!(sys.tile_at(-1, -1), TileType::Wall);
        assert_eq!(sys.tile_at(64, 64), TileType::Wall);
        assert!(!sys.is_tile_passable(-1, -1));
        assert!(!sys.is_tile_passable(64, 64));
        assert_eq!(sys.speed_multiplier(-5, 3), 1.0);
    }

    #[test]
    fn test_set_tile_out_of_bounds_is_noop() {
        let mut sys = system(32, 32, ChunkSystemConfig::production());
        assert!(!sys.set_tile(-1, 0, TileType::Floor));
        assert!(!sys.set_tile(32, 0, TileType::Floor));
    }

    #[test]
    fn test_set_tile_writes_through_to_cached_chunk() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        sys.update_chunks(20.0, 20.0);
        let coord = ChunkCoord::from_tile(20, 20, 16);
        assert!(sys.is_cached(coord));

        assert!(sys.set_tile(20, 20, TileType::Column));
        assert_eq!(sys.tile_at(20, 20), TileType::Column);
        assert_eq!(
            sys.cached_chunk(coord).unwrap().tile_at_world(20, 20),
            TileType::Column
        );
        assert_eq!(sys.map().grid().get(20, 20), Some(TileType::Column));
    }

    #[test]
    fn test_set_tile_uncached_chunk_sees_edit_on_load() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        assert!(sys.set_tile(50, 50, TileType::Ice));
        let chunk = sys.chunk(ChunkCoord::from_tile(50, 50, 16)).unwrap();
        assert_eq!(chunk.tile_at_world(50, 50), TileType::Ice);
    }

    #[test]
    fn test_chunk_outside_range_is_none() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        assert!(sys.chunk(ChunkCoord::new(-1, 0)).is_none());
        assert!(sys.chunk(ChunkCoord::new(4, 0)).is_none());
        assert!(sys.chunk(ChunkCoord::new(3, 3)).is_some());
        assert_eq!(sys.cached_chunk_count(), 1);
    }

    #[test]
    fn test_partial_edge_chunk_counts() {
        let sys = system(70, 40, ChunkSystemConfig::production());
        assert_eq!(sys.chunk_columns(), 5);
        assert_eq!(sys.chunk_rows(), 3);
    }

    #[test]
    fn test_update_refreshes_access_tick() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        sys.update_chunks(8.0, 8.0);
        sys.update_chunks(8.0, 8.0);
        let chunk = sys.cached_chunk(ChunkCoord::new(0, 0)).unwrap();
        assert_eq!(chunk.last_access_tick(), 2);
        assert_eq!(sys.stats().tick, 2);
    }

    #[test]
    fn test_chunks_to_render_only_valid() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        let chunks = sys.chunks_to_render((0.0, 0.0), 320.0, 240.0, 16.0, 1.0);
        assert!(!chunks.is_empty());
        assert!(chunks
            .iter()
            .all(|c| (0..4).contains(&c.coord().x) && (0..4).contains(&c.coord().y)));
        assert!(sys.chunks_to_render((0.0, 0.0), 320.0, 240.0, 16.0, 0.0).is_empty());
    }

    #[test]
    fn test_chunks_to_render_zoomed_out_covers_map() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        assert_eq!(sys.chunks_to_render((0.0, 0.0), 1920.0, 1080.0, 16.0, 0.002).len(), 16);
        assert_eq!(sys.chunks_to_render((0.0, 0.0), 1920.0, 1080.0, 16.0, 1e-12).len(), 16);
        assert_eq!(sys.cached_chunk_count(), 16);
    }

    #[test]
    fn test_chunks_to_render_far_viewer_is_empty() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        let far = sys.chunks_to_render((1.0e9, 1.0e9), 320.0, 240.0, 16.0, 1.0);
        assert!(far.is_empty());
    }

    #[test]
    fn test_eviction_drops_entities() {
        let mut sys = system(512, 512, ChunkSystemConfig::production());
        sys.update_chunks(0.0, 0.0);
        assert!(sys.attach_entity(10, 10, EntityRef(7)));
        sys.update_chunks(400.0, 400.0);
        assert!(!sys.is_cached(ChunkCoord::new(0, 0)));
        let chunk = sys.chunk(ChunkCoord::new(0, 0)).unwrap();
        assert!(chunk.entities().is_empty());
    }

    #[test]
    fn test_entity_refs() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        assert!(sys.attach_entity(10, 10, EntityRef(1)));
        assert!(!sys.attach_entity(-3, 10, EntityRef(1)));
        let chunk = sys.cached_chunk(ChunkCoord::new(0, 0)).unwrap();
        assert_eq!(chunk.entities(), &[EntityRef(1)]);
        assert!(sys.detach_entity(10, 10, EntityRef(1)));
    }

    #[test]
    fn test_random_position_is_passable() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        for _ in 0..50 {
            let pos = sys.random_passable_position().unwrap();
            assert!(sys.is_tile_passable(pos.x, pos.y));
        }
    }

    #[test]
    fn test_map_info() {
        let mut sys = system(64, 64, ChunkSystemConfig::production());
        sys.update_chunks(0.0, 0.0);
        let info = sys.map_info();
        assert_eq!((info.width, info.height), (64, 64));
        assert_eq!(info.theme_id, "forest");
        assert_eq!(info.cached_chunk_count, 25);
        assert_eq!(info.room_count, sys.map().rooms().len());
    }
}
