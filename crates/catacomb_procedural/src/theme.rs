//! # Themes
//!
//! A theme is a biome described purely as data: a tile palette, an ordered
//! obstacle table, an enemy pool and the generation tuning knobs. Themes
//! never carry behavior of their own; the obstacle scatter pass in the
//! generator reads the table and does the same thing for every biome.
//!
//! Themes are immutable once built. Construction validates the data, so a
//! `Theme` in hand is always usable by the generator.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};
use crate::tile::{TileType, TILE_TYPE_COUNT};

/// Enemy id handed out when a theme's pool is empty.
pub const FALLBACK_ENEMY_TYPE: &str = "slime";

/// Largest accepted obstacle `min_distance`.
pub const MAX_OBSTACLE_MIN_DISTANCE: i32 = 16;

/// RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// Opaque color from RGB components.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }
}

/// Obstacle class a theme can scatter over open floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    /// Tall vegetation or pillars of growth.
    Tree,
    /// Boulders and rubble.
    Rock,
    /// Pools (water, ice sheets, ...).
    Water,
}

/// One entry of a theme's obstacle table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleRule {
    /// Obstacle class.
    pub kind: ObstacleKind,
    /// Tile written when this obstacle is placed.
    pub tile: TileType,
    /// Probability in `[0, 1]` that a floor tile becomes this obstacle.
    pub chance: f64,
    /// Minimum Chebyshev distance to another tile of the same type, at most
    /// [`MAX_OBSTACLE_MIN_DISTANCE`].
    #[serde(default)]
    pub min_distance: i32,
}

/// Generation tuning parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Rooms per tile of map area.
    pub room_density: f64,
    /// Smallest room side.
    pub min_room_size: i32,
    /// Largest room side.
    pub max_room_size: i32,
    /// Corridor half-width in tiles (0 = one tile wide).
    pub corridor_width: i32,
    /// Extra room pairs to connect, as a fraction of the room count.
    pub extra_connections_fraction: f64,
    /// Free-form numeric parameters, readable through
    /// [`Theme::generation_param`].
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            room_density: 0.0025,
            min_room_size: 4,
            max_room_size: 9,
            corridor_width: 1,
            extra_connections_fraction: 0.15,
            extra: BTreeMap::new(),
        }
    }
}

impl GenerationParams {
    fn validate(&self) -> Result<(), String> {
        if !(self.room_density > 0.0 && self.room_density <= 1.0) {
            return Err(format!("room_density {} outside (0, 1]", self.room_density));
        }
        if self.min_room_size < 1 || self.max_room_size < self.min_room_size {
            return Err(format!(
                "room size range [{}, {}] is empty",
                self.min_room_size, self.max_room_size
            ));
        }
        if !(0..=4).contains(&self.corridor_width) {
            return Err(format!("corridor_width {} outside [0, 4]", self.corridor_width));
        }
        if !(self.extra_connections_fraction >= 0.0) {
            return Err("extra_connections_fraction must be non-negative".into());
        }
        Ok(())
    }
}

/// Serialized shape of a theme, validated into [`Theme`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeDef {
    /// Registry id.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// One color per tile type, in [`TileType::ALL`] order.
    pub palette: [Color; TILE_TYPE_COUNT],
    /// Obstacle table, checked in order.
    #[serde(default)]
    pub obstacles: Vec<ObstacleRule>,
    /// Enemy ids this biome spawns.
    #[serde(default)]
    pub enemy_types: Vec<String>,
    /// Generation tuning.
    #[serde(default)]
    pub params: GenerationParams,
}

/// Immutable biome description.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "ThemeDef")]
pub struct Theme {
    id: String,
    display_name: String,
    palette: [Color; TILE_TYPE_COUNT],
    obstacles: Vec<ObstacleRule>,
    enemy_types: Vec<String>,
    params: GenerationParams,
}

impl TryFrom<ThemeDef> for Theme {
    type Error = MapError;

    fn try_from(def: ThemeDef) -> MapResult<Self> {
        Self::new(def)
    }
}

impl Theme {
    /// Validates a definition and builds the theme.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTheme` when the id is empty, an obstacle designates a
    /// blocking or floor tile, a kind appears twice, chances fall outside
    /// `[0, 1]` or sum past 1, or the generation params are inconsistent.
    pub fn new(def: ThemeDef) -> MapResult<Self> {
        let invalid = |reason: String| MapError::InvalidTheme {
            id: def.id.clone(),
            reason,
        };

        if def.id.trim().is_empty() {
            return Err(invalid("id must not be empty".into()));
        }

        let mut total = 0.0;
        for (i, rule) in def.obstacles.iter().enumerate() {
            if !rule.tile.is_passable() || rule.tile == TileType::Floor {
                return Err(invalid(format!(
                    "obstacle {:?} designates {:?}, which is not a passable obstacle tile",
                    rule.kind, rule.tile
                )));
            }
            if !(0.0..=1.0).contains(&rule.chance) {
                return Err(invalid(format!(
                    "obstacle {:?} chance {} outside [0, 1]",
                    rule.kind, rule.chance
                )));
            }
            if !(0..=MAX_OBSTACLE_MIN_DISTANCE).contains(&rule.min_distance) {
                return Err(invalid(format!(
                    "obstacle {:?} min_distance {} outside 0..={MAX_OBSTACLE_MIN_DISTANCE}",
                    rule.kind, rule.min_distance
                )));
            }
            if def.obstacles[..i].iter().any(|r| r.kind == rule.kind) {
                return Err(invalid(format!("obstacle {:?} listed twice", rule.kind)));
            }
            total += rule.chance;
        }
        if total > 1.0 {
            return Err(invalid(format!("obstacle chances sum to {total}")));
        }

        def.params.validate().map_err(invalid)?;

        Ok(Self {
            id: def.id,
            display_name: def.display_name,
            palette: def.palette,
            obstacles: def.obstacles,
            enemy_types: def.enemy_types,
            params: def.params,
        })
    }

    /// Registry id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Color used to draw a tile type.
    #[must_use]
    pub fn tile_color(&self, tile: TileType) -> Color {
        self.palette[tile.index()]
    }

    /// Probability that a floor tile becomes an obstacle of `kind`.
    /// Kinds the theme does not use report 0.
    #[must_use]
    pub fn obstacle_chance(&self, kind: ObstacleKind) -> f64 {
        self.obstacles
            .iter()
            .find(|r| r.kind == kind)
            .map_or(0.0, |r| r.chance)
    }

    /// Obstacle table in probability order.
    #[must_use]
    pub fn obstacles(&self) -> &[ObstacleRule] {
        &self.obstacles
    }

    /// Enemy ids this biome spawns.
    #[must_use]
    pub fn enemy_types(&self) -> &[String] {
        &self.enemy_types
    }

    /// Generation tuning.
    #[must_use]
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Reads a numeric generation parameter by name, falling back to
    /// `default` for unknown names.
    #[must_use]
    pub fn generation_param(&self, name: &str, default: f64) -> f64 {
        let p = &self.params;
        match name {
            "room_density" => p.room_density,
            "min_room_size" => f64::from(p.min_room_size),
            "max_room_size" => f64::from(p.max_room_size),
            "corridor_width" => f64::from(p.corridor_width),
            "extra_connections_fraction" => p.extra_connections_fraction,
            other => p.extra.get(other).copied().unwrap_or(default),
        }
    }

    /// Uniform draw from the enemy pool, or [`FALLBACK_ENEMY_TYPE`] if the
    /// pool is empty.
    pub fn random_enemy_type<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        if self.enemy_types.is_empty() {
            return FALLBACK_ENEMY_TYPE;
        }
        &self.enemy_types[rng.gen_range(0..self.enemy_types.len())]
    }

    /// Converts back into its serialized shape.
    #[must_use]
    pub fn to_def(&self) -> ThemeDef {
        ThemeDef {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            palette: self.palette,
            obstacles: self.obstacles.clone(),
            enemy_types: self.enemy_types.clone(),
            params: self.params.clone(),
        }
    }
}

fn builtin(def: ThemeDef) -> Theme {
    match Theme::new(def) {
        Ok(theme) => theme,
        Err(e) => unreachable!("built-in theme rejected: {e}"),
    }
}

fn rule(kind: ObstacleKind, tile: TileType, chance: f64, min_distance: i32) -> ObstacleRule {
    ObstacleRule {
        kind,
        tile,
        chance,
        min_distance,
    }
}

fn names(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| (*s).to_string()).collect()
}

/// Overgrown woodland: trees and boulders, the odd pond.
#[must_use]
pub fn forest() -> Theme {
    builtin(ThemeDef {
        id: "forest".into(),
        display_name: "Whispering Forest".into(),
        palette: [
            Color::rgb(86, 125, 70),
            Color::rgb(34, 51, 29),
            Color::rgb(92, 64, 51),
            Color::rgb(27, 94, 32),
            Color::rgb(120, 120, 110),
            Color::rgb(52, 101, 164),
            Color::rgb(200, 230, 240),
            Color::rgb(160, 190, 90),
        ],
        obstacles: vec![
            rule(ObstacleKind::Tree, TileType::ObstacleA, 0.08, 1),
            rule(ObstacleKind::Rock, TileType::ObstacleB, 0.03, 0),
            rule(ObstacleKind::Water, TileType::Water, 0.02, 0),
        ],
        enemy_types: names(&["wolf", "boar", "bandit", "treant"]),
        params: GenerationParams {
            room_density: 0.0025,
            min_room_size: 5,
            max_room_size: 10,
            corridor_width: 1,
            extra_connections_fraction: 0.15,
            extra: BTreeMap::new(),
        },
    })
}

/// Stone catacombs: rubble, fungus clumps, seeping pools.
#[must_use]
pub fn cave() -> Theme {
    builtin(ThemeDef {
        id: "cave".into(),
        display_name: "Sunken Catacombs".into(),
        palette: [
            Color::rgb(105, 98, 90),
            Color::rgb(40, 36, 34),
            Color::rgb(70, 66, 62),
            Color::rgb(130, 90, 140),
            Color::rgb(90, 85, 80),
            Color::rgb(40, 70, 90),
            Color::rgb(170, 200, 210),
            Color::rgb(150, 140, 110),
        ],
        obstacles: vec![
            rule(ObstacleKind::Tree, TileType::Decoration, 0.05, 0),
            rule(ObstacleKind::Rock, TileType::ObstacleB, 0.06, 1),
            rule(ObstacleKind::Water, TileType::Water, 0.03, 0),
        ],
        enemy_types: names(&["skeleton", "bat", "slime", "cultist"]),
        params: GenerationParams {
            room_density: 0.003,
            min_room_size: 4,
            max_room_size: 8,
            corridor_width: 0,
            extra_connections_fraction: 0.25,
            extra: BTreeMap::new(),
        },
    })
}

/// Frozen wastes: ice sheets, frosted pines.
#[must_use]
pub fn frost() -> Theme {
    let mut extra = BTreeMap::new();
    extra.insert("blizzard_intensity".to_string(), 0.4);
    builtin(ThemeDef {
        id: "frost".into(),
        display_name: "Frostbitten Wastes".into(),
        palette: [
            Color::rgb(225, 235, 240),
            Color::rgb(120, 140, 160),
            Color::rgb(150, 170, 190),
            Color::rgb(60, 100, 90),
            Color::rgb(170, 180, 190),
            Color::rgb(60, 110, 170),
            Color::rgb(180, 220, 250),
            Color::rgb(240, 250, 255),
        ],
        obstacles: vec![
            rule(ObstacleKind::Tree, TileType::ObstacleA, 0.04, 1),
            rule(ObstacleKind::Rock, TileType::ObstacleB, 0.04, 0),
            rule(ObstacleKind::Water, TileType::Ice, 0.10, 0),
        ],
        enemy_types: names(&["ice_wraith", "yeti", "frost_wolf"]),
        params: GenerationParams {
            room_density: 0.002,
            min_room_size: 6,
            max_room_size: 12,
            corridor_width: 1,
            extra_connections_fraction: 0.1,
            extra,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_builtin_themes_are_valid() {
        for theme in [forest(), cave(), frost()] {
            assert!(!theme.id().is_empty());
            assert!(theme.obstacles().iter().all(|r| r.tile.is_passable()));
        }
    }

    #[test]
    fn test_obstacle_chance_lookup() {
        let theme = forest();
        assert!((theme.obstacle_chance(ObstacleKind::Tree) - 0.08).abs() < f64::EPSILON);

        let mut def = theme.to_def();
        def.obstacles.retain(|r| r.kind != ObstacleKind::Water);
        let dry = Theme::new(def).unwrap();
        assert_eq!(dry.obstacle_chance(ObstacleKind::Water), 0.0);
    }

    #[test]
    fn test_generation_param_by_name() {
        let theme = frost();
        assert_eq!(theme.generation_param("min_room_size", 0.0), 6.0);
        assert_eq!(theme.generation_param("blizzard_intensity", 0.0), 0.4);
        assert_eq!(theme.generation_param("no_such_param", 3.5), 3.5);
    }

    #[test]
    fn test_random_enemy_type_uses_pool() {
        let theme = cave();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let enemy = theme.random_enemy_type(&mut rng);
            assert!(theme.enemy_types().iter().any(|e| e == enemy));
        }
    }

    #[test]
    fn test_empty_pool_falls_back() {
        let mut def = cave().to_def();
        def.enemy_types.clear();
        let theme = Theme::new(def).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(theme.random_enemy_type(&mut rng), FALLBACK_ENEMY_TYPE);
    }

    #[test]
    fn test_rejects_blocking_obstacle_tile() {
        let mut def = forest().to_def();
        def.obstacles[0].tile = TileType::Column;
        assert!(matches!(Theme::new(def), Err(MapError::InvalidTheme { .. })));
    }

    #[test]
    fn test_rejects_overfull_obstacle_table() {
        let mut def = forest().to_def();
        for r in &mut def.obstacles {
            r.chance = 0.5;
        }
        assert!(Theme::new(def).is_err());
    }

    #[test]
    fn test_min_distance_is_bounded() {
        let mut def = forest().to_def();
        def.obstacles[0].min_distance = i32::MAX;
        assert!(matches!(Theme::new(def), Err(MapError::InvalidTheme { .. })));

        let mut def = forest().to_def();
        def.obstacles[0].min_distance = MAX_OBSTACLE_MIN_DISTANCE;
        assert!(Theme::new(def).is_ok());
    }

    #[test]
    fn test_rejects_bad_room_sizes() {
        let mut def = forest().to_def();
        def.params.max_room_size = 2;
        assert!(Theme::new(def).is_err());
    }
}
