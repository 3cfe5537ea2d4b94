//! # Level Loading
//!
//! Turns a level request (size, theme, optional enemy override, seed) into
//! a ready-to-query [`ChunkSystem`].
//!
//! The theme can be named by id, given inline, or drawn at random from the
//! registry. Unknown ids resolve to the registry's default theme.

use catacomb_procedural::{
    ChunkSystem, ChunkSystemRecord, MapGenerator, MapResult, MapSeed, Theme, ThemeRegistry,
    WorldConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::info;

/// How a request picks its theme.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ThemeSelector {
    /// Registry id.
    Id(String),
    /// Theme supplied with the request.
    Inline(Box<Theme>),
}

impl From<&str> for ThemeSelector {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<Theme> for ThemeSelector {
    fn from(theme: Theme) -> Self {
        Self::Inline(Box::new(theme))
    }
}

/// Generation input for one level.
#[derive(Clone, Debug, Deserialize)]
pub struct LevelRequest {
    /// Grid width in tiles.
    pub width: i32,
    /// Grid height in tiles.
    pub height: i32,
    /// Theme choice.
    pub theme: ThemeSelector,
    /// Replaces the theme's enemy pool when present.
    #[serde(default)]
    pub enemy_types: Option<Vec<String>>,
    /// Generation seed.
    pub seed: u64,
}

impl LevelRequest {
    /// Request for a themed level by id.
    #[must_use]
    pub fn new(width: i32, height: i32, theme: impl Into<ThemeSelector>, seed: u64) -> Self {
        Self {
            width,
            height,
            theme: theme.into(),
            enemy_types: None,
            seed,
        }
    }

    /// Overrides the enemy pool.
    #[must_use]
    pub fn with_enemy_types(mut self, enemy_types: Vec<String>) -> Self {
        self.enemy_types = Some(enemy_types);
        self
    }

    /// Parses a request from TOML.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the text does not parse.
    pub fn from_toml_str(source: &str) -> MapResult<Self> {
        Ok(toml::from_str(source)?)
    }
}

/// Builds levels from requests using one registry and one configuration.
pub struct LevelLoader {
    registry: ThemeRegistry,
    config: WorldConfig,
    generator: MapGenerator,
}

impl LevelLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new(registry: ThemeRegistry, config: WorldConfig) -> Self {
        let generator = MapGenerator::new(config.generator.clone());
        Self {
            registry,
            config,
            generator,
        }
    }

    /// Theme registry.
    #[must_use]
    pub fn registry(&self) -> &ThemeRegistry {
        &self.registry
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Resolves a theme selector against the registry.
    #[must_use]
    pub fn resolve_theme<'a>(&'a self, selector: &'a ThemeSelector) -> &'a Theme {
        match selector {
            ThemeSelector::Id(id) => self.registry.get(id),
            ThemeSelector::Inline(theme) => theme.as_ref(),
        }
    }

    /// Generates a level and wraps it for paging.
    ///
    /// # Errors
    ///
    /// Propagates generation errors (bad dimensions, exhausted connectivity
    /// retries) and chunk configuration errors.
    pub fn load(&self, request: &LevelRequest) -> MapResult<ChunkSystem> {
        let theme = self.resolve_theme(&request.theme);
        let map = self.generator.generate(
            request.width,
            request.height,
            theme,
            MapSeed::new(request.seed),
            request.enemy_types.clone(),
        )?;
        info!(theme = %theme.id(), seed = request.seed, "level loaded");
        ChunkSystem::new(map, self.config.chunks.clone())
    }

    /// Generates a level with a theme drawn from the registry by `seed`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_random(&self, width: i32, height: i32, seed: u64) -> MapResult<ChunkSystem> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let id = self.registry.random_theme(&mut rng).id().to_string();
        self.load(&LevelRequest::new(width, height, id.as_str(), seed))
    }

    /// Restores a saved level without regenerating it.
    ///
    /// # Errors
    ///
    /// Returns `Record` for malformed records.
    pub fn restore(&self, record: ChunkSystemRecord) -> MapResult<ChunkSystem> {
        ChunkSystem::deserialize(record, &self.registry, self.config.chunks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catacomb_procedural::MapError;

    fn loader() -> LevelLoader {
        LevelLoader::new(ThemeRegistry::with_builtin_themes(), WorldConfig::default())
    }

    #[test]
    fn test_load_by_id() {
        let chunks = loader().load(&LevelRequest::new(64, 64, "frost", 42)).unwrap();
        let info = chunks.map_info();
        assert_eq!(info.theme_id, "frost");
        assert_eq!(info.enemy_types, chunks.map().theme().enemy_types());
    }

    #[test]
    fn test_unknown_id_uses_default_theme() {
        let chunks = loader().load(&LevelRequest::new(64, 64, "volcano", 42)).unwrap();
        assert_eq!(chunks.map_info().theme_id, "cave");
    }

    #[test]
    fn test_inline_theme_and_enemy_override() {
        let loader = loader();
        let theme = loader.registry().get("forest").clone();
        let request = LevelRequest::new(64, 64, theme, 42).with_enemy_types(vec!["ogre".into()]);
        let chunks = loader.load(&request).unwrap();
        assert_eq!(chunks.map_info().enemy_types, vec!["ogre".to_string()]);
    }

    #[test]
    fn test_request_from_toml() {
        let request = LevelRequest::from_toml_str(
            r#"
            width = 80
            height = 60
            theme = "cave"
            enemy_types = ["rat"]
            seed = 9
            "#,
        )
        .unwrap();
        assert!(matches!(request.theme, ThemeSelector::Id(ref id) if id == "cave"));
        let chunks = loader().load(&request).unwrap();
        assert_eq!(chunks.map().width(), 80);
    }

    #[test]
    fn test_load_random_is_reproducible() {
        let loader = loader();
        let a = loader.load_random(64, 64, 77).unwrap();
        let b = loader.load_random(64, 64, 77).unwrap();
        assert_eq!(a.map_info().theme_id, b.map_info().theme_id);
        assert_eq!(a.map().rooms(), b.map().rooms());
    }

    #[test]
    fn test_bad_dimensions_surface() {
        let result = loader().load(&LevelRequest::new(1, 64, "forest", 1));
        assert!(matches!(result, Err(MapError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_restore_round_trip() {
        let loader = loader();
        let chunks = loader.load(&LevelRequest::new(48, 48, "cave", 5)).unwrap();
        let restored = loader.restore(chunks.serialize()).unwrap();
        assert_eq!(restored.map().grid(), chunks.map().grid());
    }
}
