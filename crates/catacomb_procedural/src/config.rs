//! # Configuration
//!
//! Tuning for the generator and the chunk pager. Loaded once at startup,
//! typically from a TOML file; every field has a default so partial files
//! are fine.

use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

/// Largest accepted chunk side, in tiles.
pub const MAX_CHUNK_SIZE: i32 = 1024;

/// Largest accepted load/unload radius, in chunks.
pub const MAX_CHUNK_RADIUS: i32 = 64;

/// Generator tuning independent of the theme.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Full generation attempts before giving up on connectivity.
    pub max_attempts: u32,
    /// Placement tries per room inside its bucket.
    pub placement_attempts: u32,
    /// Padding (tiles) kept between any two rooms.
    pub room_padding: i32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            placement_attempts: 100,
            room_padding: 2,
        }
    }
}

/// Chunk pager tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSystemConfig {
    /// Chunk side length in tiles.
    pub chunk_size: i32,
    /// Chebyshev radius (chunks) within which chunks are materialized.
    pub load_radius: i32,
    /// Chebyshev radius (chunks) beyond which cached chunks are evicted.
    pub unload_radius: i32,
    /// Spawn offsets tried per eligible room when scattering enemies.
    pub enemies_per_room: u32,
    /// Random probes before `random_passable_position` falls back to a scan.
    pub random_position_attempts: u32,
}

impl Default for ChunkSystemConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl ChunkSystemConfig {
    /// Settings used in the shipped game.
    #[must_use]
    pub const fn production() -> Self {
        Self {
            chunk_size: 16,
            load_radius: 2,
            unload_radius: 4,
            enemies_per_room: 3,
            random_position_attempts: 1000,
        }
    }

    /// Small chunks and tight radii, for tests that want eviction quickly.
    #[must_use]
    pub const fn test() -> Self {
        Self {
            chunk_size: 8,
            load_radius: 1,
            unload_radius: 2,
            enemies_per_room: 2,
            random_position_attempts: 200,
        }
    }

    /// Checks the radii and chunk size are usable.
    ///
    /// # Errors
    ///
    /// Returns `Config` for a non-positive chunk size, a negative load
    /// radius, or an unload radius smaller than the load radius.
    pub fn validate(&self) -> MapResult<()> {
        if !(1..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(MapError::Config(format!(
                "chunk_size {} must be in 1..={MAX_CHUNK_SIZE}",
                self.chunk_size
            )));
        }
        if self.load_radius < 0
            || self.unload_radius < self.load_radius
            || self.unload_radius > MAX_CHUNK_RADIUS
        {
            return Err(MapError::Config(format!(
                "radii must satisfy 0 <= load ({}) <= unload ({}) <= {MAX_CHUNK_RADIUS}",
                self.load_radius, self.unload_radius
            )));
        }
        Ok(())
    }
}

/// Combined configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Generator tuning.
    pub generator: GeneratorConfig,
    /// Chunk pager tuning.
    pub chunks: ChunkSystemConfig,
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the text does not parse or fails validation.
    pub fn from_toml_str(source: &str) -> MapResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.chunks.validate()?;
        if config.generator.max_attempts == 0 {
            return Err(MapError::Config("generator.max_attempts must be at least 1".into()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WorldConfig::from_toml_str(
            r#"
            [chunks]
            chunk_size = 32
            "#,
        )
        .unwrap();
        assert_eq!(config.chunks.chunk_size, 32);
        assert_eq!(config.chunks.load_radius, 2);
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn test_rejects_inverted_radii() {
        let result = WorldConfig::from_toml_str(
            r#"
            [chunks]
            load_radius = 5
            unload_radius = 3
            "#,
        );
        assert!(matches!(result, Err(MapError::Config(_))));
    }

    #[test]
    fn test_rejects_oversized_chunks() {
        let result = WorldConfig::from_toml_str("[chunks]\nchunk_size = 50000\n");
        assert!(matches!(result, Err(MapError::Config(_))));

        let config = ChunkSystemConfig {
            chunk_size: MAX_CHUNK_SIZE,
            ..ChunkSystemConfig::production()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_huge_unload_radius() {
        let config = ChunkSystemConfig {
            unload_radius: MAX_CHUNK_RADIUS + 1,
            ..ChunkSystemConfig::production()
        };
        assert!(matches!(config.validate(), Err(MapError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let result = WorldConfig::from_toml_str("[generator]\nmax_attempts = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_presets_validate() {
        assert!(ChunkSystemConfig::production().validate().is_ok());
        assert!(ChunkSystemConfig::test().validate().is_ok());
    }
}
