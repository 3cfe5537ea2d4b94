//! # CATACOMB Procedural Generation
//!
//! Finite, fully connected tile dungeons with a chunked paging layer.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and inputs always produce the same map
//! 2. **Connected**: Every passable tile is reachable, or generation fails loudly
//! 3. **Paged**: Consumers see the map through chunks loaded around a viewer
//! 4. **Single write path**: Tile edits go through `ChunkSystem::set_tile`
//!
//! ## Core Components
//!
//! - `Theme` / `ThemeRegistry`: biome data and id lookup
//! - `MapGenerator`: rooms, MST corridors, connectivity check, obstacles
//! - `ChunkSystem`: tile queries, chunk paging, spawn points
//! - `MapRecord` / `ChunkSystemRecord`: flat save records
//!
//! ## Example
//!
//! ```rust,ignore
//! use catacomb_procedural::{
//!     ChunkSystem, ChunkSystemConfig, GeneratorConfig, MapGenerator, MapSeed, ThemeRegistry,
//! };
//!
//! let registry = ThemeRegistry::with_builtin_themes();
//! let map = MapGenerator::new(GeneratorConfig::default())
//!     .generate(64, 64, registry.get("forest"), MapSeed::new(42), None)?;
//! let mut chunks = ChunkSystem::new(map, ChunkSystemConfig::production())?;
//!
//! let spawn = chunks.player_spawn_position().unwrap();
//! chunks.update_chunks(spawn.x as f32, spawn.y as f32);
//! assert!(chunks.is_tile_passable(spawn.x, spawn.y));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod chunk_system;
pub mod config;
pub mod error;
pub mod generator;
pub mod persistence;
pub mod registry;
pub mod seed;
pub mod theme;
pub mod tile;

pub use chunk::{Chunk, ChunkCoord, EntityRef};
pub use chunk_system::{ChunkStats, ChunkSystem, MapInfo};
pub use config::{
    ChunkSystemConfig, GeneratorConfig, WorldConfig, MAX_CHUNK_RADIUS, MAX_CHUNK_SIZE,
};
pub use error::{MapError, MapResult};
pub use generator::{Corridor, MapGenerationResult, MapGenerator, Room};
pub use persistence::{ChunkSystemRecord, MapRecord};
pub use registry::{ThemeRegistry, DEFAULT_THEME_ID};
pub use seed::MapSeed;
pub use theme::{
    Color, GenerationParams, ObstacleKind, ObstacleRule, Theme, ThemeDef, MAX_OBSTACLE_MIN_DISTANCE,
};
pub use tile::{TileGrid, TilePos, TileType};
