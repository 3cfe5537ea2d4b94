//! # Tile Model
//!
//! The grid is a flat, row-major array of [`TileType`] indexed as
//! `y * width + x`. Coordinates are signed so callers can probe outside the
//! map and get a safe answer instead of a panic.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

/// Number of distinct tile types.
pub const TILE_TYPE_COUNT: usize = 8;

/// Type of a single map cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TileType {
    /// Walkable ground.
    Floor = 0,
    /// Solid rock. Also the value of every out-of-bounds cell.
    #[default]
    Wall = 1,
    /// Blocking pillar.
    Column = 2,
    /// Tall obstacle ("tree" class). Slows movement.
    ObstacleA = 3,
    /// Low obstacle ("rock" class). Slows movement.
    ObstacleB = 4,
    /// Shallow water. Slows movement.
    Water = 5,
    /// Slippery ground. Speeds movement up.
    Ice = 6,
    /// Cosmetic ground clutter.
    Decoration = 7,
}

impl TileType {
    /// All tile types in palette order.
    pub const ALL: [Self; TILE_TYPE_COUNT] = [
        Self::Floor,
        Self::Wall,
        Self::Column,
        Self::ObstacleA,
        Self::ObstacleB,
        Self::Water,
        Self::Ice,
        Self::Decoration,
    ];

    /// Palette slot of this tile type.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Converts from u8. Unknown values map to `Wall`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Floor,
            2 => Self::Column,
            3 => Self::ObstacleA,
            4 => Self::ObstacleB,
            5 => Self::Water,
            6 => Self::Ice,
            7 => Self::Decoration,
            _ => Self::Wall,
        }
    }

    /// Returns true unless this tile blocks movement.
    #[inline]
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Wall | Self::Column)
    }

    /// Returns true for tiles an obstacle may stand next to without
    /// boxing the walker in (open ground only).
    #[inline]
    #[must_use]
    pub const fn is_open_ground(self) -> bool {
        matches!(self, Self::Floor | Self::Ice | Self::Decoration)
    }

    /// Movement cost modifier. Values below 1.0 slow the walker down.
    #[must_use]
    pub const fn speed_multiplier(self) -> f32 {
        match self {
            Self::ObstacleA => 0.6,
            Self::ObstacleB => 0.75,
            Self::Water => 0.5,
            Self::Ice => 1.4,
            _ => 1.0,
        }
    }

    /// Single character used by the ASCII dump.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Floor => '.',
            Self::Wall => '#',
            Self::Column => 'O',
            Self::ObstacleA => 'T',
            Self::ObstacleB => 'o',
            Self::Water => '~',
            Self::Ice => '_',
            Self::Decoration => ',',
        }
    }
}

/// Integer tile coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Creates a new tile position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position, in tiles.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Row-major tile grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<TileType>,
}

impl TileGrid {
    /// Smallest accepted side length: a border ring plus one interior cell.
    pub const MIN_SIDE: i32 = 3;

    /// Creates a grid filled with a single tile type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` if either side is below [`Self::MIN_SIDE`].
    pub fn filled(width: i32, height: i32, tile: TileType) -> MapResult<Self> {
        if width < Self::MIN_SIDE || height < Self::MIN_SIDE {
            return Err(MapError::InvalidDimensions {
                width,
                height,
                min: Self::MIN_SIDE,
            });
        }
        Ok(Self {
            width,
            height,
            tiles: vec![tile; (width as usize) * (height as usize)],
        })
    }

    /// Rebuilds a grid from a flat row-major tile list.
    ///
    /// # Errors
    ///
    /// Returns `Record` if the list length does not match the dimensions.
    pub fn from_tiles(width: i32, height: i32, tiles: Vec<TileType>) -> MapResult<Self> {
        let mut grid = Self::filled(width, height, TileType::Wall)?;
        if tiles.len() != grid.tiles.len() {
            return Err(MapError::Record(format!(
                "grid holds {} tiles, expected {}x{} = {}",
                tiles.len(),
                width,
                height,
                grid.tiles.len()
            )));
        }
        grid.tiles = tiles;
        Ok(grid)
    }

    /// Grid width in tiles.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in tiles.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Flat row-major tile slice.
    #[inline]
    #[must_use]
    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }

    /// Returns true if `(x, y)` lies inside the grid.
    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Returns true if `(x, y)` lies on the outermost ring.
    #[inline]
    #[must_use]
    pub const fn is_border(&self, x: i32, y: i32) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    /// Tile at `(x, y)`, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<TileType> {
        if self.in_bounds(x, y) {
            Some(self.tiles[self.index(x, y)])
        } else {
            None
        }
    }

    /// Tile at `(x, y)`, with `Wall` outside the grid.
    #[inline]
    #[must_use]
    pub fn get_or_wall(&self, x: i32, y: i32) -> TileType {
        self.get(x, y).unwrap_or(TileType::Wall)
    }

    /// Writes a tile. Returns false (and does nothing) outside the grid.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, tile: TileType) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        self.tiles[idx] = tile;
        true
    }

    /// Overwrites every cell with `tile`.
    pub fn fill(&mut self, tile: TileType) {
        self.tiles.fill(tile);
    }

    /// Number of cells holding `tile`.
    #[must_use]
    pub fn count(&self, tile: TileType) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    /// First cell holding `tile` in row-major scan order.
    #[must_use]
    pub fn find_first(&self, tile: TileType) -> Option<TilePos> {
        let width = self.width as usize;
        self.tiles
            .iter()
            .position(|&t| t == tile)
            .map(|idx| TilePos::new((idx % width) as i32, (idx / width) as i32))
    }

    /// Counts the cells of type `tile` reachable from `start` through
    /// 4-connected cells of the same type.
    #[must_use]
    pub fn flood_count(&self, start: TilePos, tile: TileType) -> usize {
        self.flood_count_by(start, |t| t == tile)
    }

    /// Counts the cells reachable from `start` through 4-connected cells
    /// accepted by `accept`. Returns 0 if `start` itself is rejected.
    #[must_use]
    pub fn flood_count_by(&self, start: TilePos, accept: impl Fn(TileType) -> bool) -> usize {
        if !self.get(start.x, start.y).is_some_and(&accept) {
            return 0;
        }
        let mut visited = vec![false; self.tiles.len()];
        let mut queue = VecDeque::new();
        visited[self.index(start.x, start.y)] = true;
        queue.push_back(start);
        let mut reached = 0;

        while let Some(pos) = queue.pop_front() {
            reached += 1;
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let (nx, ny) = (pos.x + dx, pos.y + dy);
                if !self.get(nx, ny).is_some_and(&accept) {
                    continue;
                }
                let idx = self.index(nx, ny);
                if !visited[idx] {
                    visited[idx] = true;
                    queue.push_back(TilePos::new(nx, ny));
                }
            }
        }
        reached
    }

    /// Renders the grid as text, one line per row.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.tiles.len() + self.height as usize);
        for row in self.tiles.chunks(self.width as usize) {
            out.extend(row.iter().map(|t| t.glyph()));
            out.push('\n');
        }
        out
    }
}
