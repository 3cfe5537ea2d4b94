//! # Map Persistence
//!
//! Flat, serde-friendly records for saving a level.
//!
//! - [`MapRecord`] stores only what generation decided (rooms and
//!   corridor pairs). Restoring it re-carves the layout deterministically;
//!   obstacles and later edits are not kept.
//! - [`ChunkSystemRecord`] stores the full grid, so restoring it gives back
//!   the exact map including edits made through `set_tile`.
//!
//! Table-valued fields come last so the records encode as TOML.
//!
//! Both restore the theme by id through a [`ThemeRegistry`], so an unknown
//! id degrades to the default theme rather than failing.

use serde::{Deserialize, Serialize};

use crate::chunk_system::ChunkSystem;
use crate::config::ChunkSystemConfig;
use crate::error::{MapError, MapResult};
use crate::generator::{carve_elbow, carve_room, Corridor, MapGenerationResult, MapGenerator, Room};
use crate::registry::ThemeRegistry;
use crate::seed::MapSeed;
use crate::tile::{TileGrid, TileType};

/// Layout-only record of a generated map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRecord {
    /// Grid width in tiles.
    pub width: i32,
    /// Grid height in tiles.
    pub height: i32,
    /// Generation seed.
    pub seed: MapSeed,
    /// Theme id.
    pub theme_id: String,
    /// Enemy ids.
    pub enemy_types: Vec<String>,
    /// Rooms in placement order.
    pub rooms: Vec<Room>,
    /// Room index pairs.
    pub corridors: Vec<Corridor>,
}

/// Full-grid record of a paged map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSystemRecord {
    /// Row-major tiles.
    pub grid: Vec<TileType>,
    /// Grid width in tiles.
    pub width: i32,
    /// Grid height in tiles.
    pub height: i32,
    /// Theme id.
    pub theme_id: String,
    /// Enemy ids.
    pub enemy_types: Vec<String>,
    /// Generation seed.
    pub seed: MapSeed,
    /// Rooms in placement order.
    pub rooms: Vec<Room>,
}

macro_rules! toml_codec {
    ($ty:ty) => {
        impl $ty {
            /// Encodes the record as TOML.
            ///
            /// # Errors
            ///
            /// Returns `Record` if serialization fails.
            pub fn to_toml_string(&self) -> MapResult<String> {
                Ok(toml::to_string(self)?)
            }

            /// Decodes a record from TOML.
            ///
            /// # Errors
            ///
            /// Returns `Config` if the text does not parse.
            pub fn from_toml_str(source: &str) -> MapResult<Self> {
                Ok(toml::from_str(source)?)
            }
        }
    };
}

toml_codec!(MapRecord);
toml_codec!(ChunkSystemRecord);

fn check_rooms(grid: &TileGrid, rooms: &[Room]) -> MapResult<()> {
    for (i, room) in rooms.iter().enumerate() {
        let inside = room.width > 0
            && room.height > 0
            && room.x >= 1
            && room.y >= 1
            && room.x + room.width <= grid.width() - 1
            && room.y + room.height <= grid.height() - 1;
        if !inside {
            return Err(MapError::Record(format!("room {i} {room:?} lies outside the map interior")));
        }
    }
    Ok(())
}

impl MapGenerator {
    /// Layout record of a generated map.
    #[must_use]
    pub fn serialize(map: &MapGenerationResult) -> MapRecord {
        MapRecord {
            width: map.width(),
            height: map.height(),
            seed: map.seed(),
            theme_id: map.theme().id().to_string(),
            enemy_types: map.enemy_types().to_vec(),
            rooms: map.rooms().to_vec(),
            corridors: map.corridors().to_vec(),
        }
    }

    /// Rebuilds a map from its layout record without re-running generation:
    /// rooms and corridors are carved again, no obstacles are scattered.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` for bad sizes and `Record` if a room lies
    /// outside the interior or a corridor names a missing room.
    pub fn deserialize(record: &MapRecord, registry: &ThemeRegistry) -> MapResult<MapGenerationResult> {
        let theme = registry.get(&record.theme_id).clone();
        let mut grid = TileGrid::filled(record.width, record.height, TileType::Wall)?;
        check_rooms(&grid, &record.rooms)?;

        for room in &record.rooms {
            carve_room(&mut grid, room);
        }
        let half_width = theme.params().corridor_width;
        for corridor in &record.corridors {
            let (Some(a), Some(b)) = (record.rooms.get(corridor.from), record.rooms.get(corridor.to)) else {
                return Err(MapError::Record(format!(
                    "corridor {}->{} references a missing room",
                    corridor.from, corridor.to
                )));
            };
            carve_elbow(&mut grid, a, b, half_width);
        }

        Ok(MapGenerationResult::from_parts(
            grid,
            record.rooms.clone(),
            record.corridors.clone(),
            theme,
            record.enemy_types.clone(),
            record.seed,
        ))
    }
}

impl ChunkSystem {
    /// Full-grid record of the current map state.
    #[must_use]
    pub fn serialize(&self) -> ChunkSystemRecord {
        let map = self.map();
        ChunkSystemRecord {
            grid: map.grid().tiles().to_vec(),
            width: map.width(),
            height: map.height(),
            theme_id: map.theme().id().to_string(),
            enemy_types: map.enemy_types().to_vec(),
            seed: map.seed(),
            rooms: map.rooms().to_vec(),
        }
    }

    /// Restores a chunk system from a full-grid record. The chunk cache
    /// starts empty. Corridor metadata is not part of this record.
    ///
    /// # Errors
    ///
    /// Returns `Record` if the grid length does not match the dimensions or
    /// a room lies outside the interior, and `Config` if `config` is invalid.
    pub fn deserialize(
        record: ChunkSystemRecord,
        registry: &ThemeRegistry,
        config: ChunkSystemConfig,
    ) -> MapResult<Self> {
        let theme = registry.get(&record.theme_id).clone();
        let grid = TileGrid::from_tiles(record.width, record.height, record.grid)?;
        check_rooms(&grid, &record.rooms)?;
        let map = MapGenerationResult::from_parts(
            grid,
            record.rooms,
            Vec::new(),
            theme,
            record.enemy_types,
            record.seed,
        );
        Self::new(map, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::theme;

    fn generate() -> MapGenerationResult {
        MapGenerator::new(GeneratorConfig::default())
            .generate(64, 64, &theme::forest(), MapSeed::new(42), None)
            .unwrap()
    }

    #[test]
    fn test_map_record_restores_layout() {
        let map = generate();
        let record = MapGenerator::serialize(&map);
        let restored = MapGenerator::deserialize(&record, &ThemeRegistry::with_builtin_themes()).unwrap();

        assert_eq!(restored.rooms(), map.rooms());
        assert_eq!(restored.corridors(), map.corridors());
        assert_eq!(restored.theme().id(), "forest");
        // Every passable tile of the original is either floor or an obstacle
        // sitting where the restored layout has floor.
        for y in 0..map.height() {
            for x in 0..map.width() {
                let original = map.grid().get_or_wall(x, y);
                let layout = restored.grid().get_or_wall(x, y);
                assert_eq!(original.is_passable(), layout == TileType::Floor, "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_map_record_rejects_dangling_corridor() {
        let mut record = MapGenerator::serialize(&generate());
        record.corridors.push(Corridor { from: 0, to: 999 });
        let result = MapGenerator::deserialize(&record, &ThemeRegistry::with_builtin_themes());
        assert!(matches!(result, Err(MapError::Record(_))));
    }

    #[test]
    fn test_chunk_system_record_keeps_edits() {
        let mut sys = ChunkSystem::new(generate(), ChunkSystemConfig::production()).unwrap();
        sys.set_tile(10, 10, TileType::Column);

        let text = sys.serialize().to_toml_string().unwrap();
        let record = ChunkSystemRecord::from_toml_str(&text).unwrap();
        let restored = ChunkSystem::deserialize(
            record,
            &ThemeRegistry::with_builtin_themes(),
            ChunkSystemConfig::production(),
        )
        .unwrap();

        assert_eq!(restored.tile_at(10, 10), TileType::Column);
        assert_eq!(restored.map().grid(), sys.map().grid());
        assert_eq!(restored.map().rooms(), sys.map().rooms());
        assert_eq!(restored.map().seed(), MapSeed::new(42));
        assert_eq!(restored.cached_chunk_count(), 0);
    }

    #[test]
    fn test_high_seed_survives_record_round_trip() {
        let seed = MapSeed::new(u64::MAX - 1);
        let map = MapGenerator::new(GeneratorConfig::default())
            .generate(48, 48, &theme::cave(), seed, None)
            .unwrap();
        let sys = ChunkSystem::new(map, ChunkSystemConfig::production()).unwrap();

        let text = sys.serialize().to_toml_string().unwrap();
        let record = ChunkSystemRecord::from_toml_str(&text).unwrap();
        assert_eq!(record.seed, seed);

        let text = MapGenerator::serialize(sys.map()).to_toml_string().unwrap();
        let record = MapRecord::from_toml_str(&text).unwrap();
        let restored = MapGenerator::deserialize(&record, &ThemeRegistry::with_builtin_themes()).unwrap();
        assert_eq!(restored.seed(), seed);
        assert_eq!(restored.rooms(), sys.map().rooms());
    }

    #[test]
    fn test_unknown_theme_restores_with_default() {
        let sys = ChunkSystem::new(generate(), ChunkSystemConfig::production()).unwrap();
        let mut record = sys.serialize();
        record.theme_id = "retired_biome".into();
        let restored = ChunkSystem::deserialize(
            record,
            &ThemeRegistry::with_builtin_themes(),
            ChunkSystemConfig::production(),
        )
        .unwrap();
        assert_eq!(restored.map_info().theme_id, "cave");
    }

    #[test]
    fn test_chunk_system_record_rejects_short_grid() {
        let sys = ChunkSystem::new(generate(), ChunkSystemConfig::production()).unwrap();
        let mut record = sys.serialize();
        record.grid.pop();
        let result = ChunkSystem::deserialize(
            record,
            &ThemeRegistry::with_builtin_themes(),
            ChunkSystemConfig::production(),
        );
        assert!(matches!(result, Err(MapError::Record(_))));
    }
}
