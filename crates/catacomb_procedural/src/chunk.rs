//! # Chunks
//!
//! A chunk is a fixed-size square window over the tile grid, the unit the
//! pager materializes and evicts. Chunks are a cache: the grid owned by
//! the chunk system is the source of truth, and a chunk's tile copy is
//! only ever written through the system's write path.
//!
//! Chunks that hang off the edge of the map (or lie entirely outside it)
//! read as `Wall` there, the same as any out-of-bounds grid read.

use crate::tile::{TileGrid, TilePos, TileType};

/// Opaque handle to an entity owned by a host system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef(pub u64);

/// Chunk coordinate (identifies a chunk in the chunk grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not tiles).
    pub x: i32,
    /// Y coordinate (in chunks, not tiles).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk holding tile `(tile_x, tile_y)`.
    #[inline]
    #[must_use]
    pub const fn from_tile(tile_x: i32, tile_y: i32, chunk_size: i32) -> Self {
        Self {
            x: tile_x.div_euclid(chunk_size),
            y: tile_y.div_euclid(chunk_size),
        }
    }

    /// Chunk holding a fractional world position given in tiles.
    #[inline]
    #[must_use]
    pub fn from_world(world_x: f32, world_y: f32, chunk_size: i32) -> Self {
        Self::from_tile(world_x.floor() as i32, world_y.floor() as i32, chunk_size)
    }

    /// Tile coordinate of the chunk's top-left corner.
    #[inline]
    #[must_use]
    pub const fn origin(self, chunk_size: i32) -> TilePos {
        TilePos::new(self.x * chunk_size, self.y * chunk_size)
    }

    /// Chebyshev distance in chunks.
    #[inline]
    #[must_use]
    pub const fn chebyshev(self, other: Self) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        if dx > dy {
            dx
        } else {
            dy
        }
    }
}

/// A cached window of the map.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    origin: TilePos,
    size: i32,
    /// Local tile copy, indexed as `[local_y * size + local_x]`.
    tiles: Vec<TileType>,
    entities: Vec<EntityRef>,
    last_access_tick: u64,
}

impl Chunk {
    /// Copies the chunk's window out of the grid.
    pub(crate) fn materialize(coord: ChunkCoord, size: i32, grid: &TileGrid, tick: u64) -> Self {
        let origin = coord.origin(size);
        let mut tiles = Vec::with_capacity((size * size) as usize);
        for ly in 0..size {
            for lx in 0..size {
                tiles.push(grid.get_or_wall(origin.x + lx, origin.y + ly));
            }
        }
        Self {
            coord,
            origin,
            size,
            tiles,
            entities: Vec::new(),
            last_access_tick: tick,
        }
    }

    /// Chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Tile coordinate of the top-left corner.
    #[inline]
    #[must_use]
    pub const fn world_origin(&self) -> TilePos {
        self.origin
    }

    /// Side length in tiles.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> i32 {
        self.size
    }

    /// Tick of the last `update_chunks` pass that touched this chunk.
    #[inline]
    #[must_use]
    pub const fn last_access_tick(&self) -> u64 {
        self.last_access_tick
    }

    pub(crate) fn touch(&mut self, tick: u64) {
        self.last_access_tick = tick;
    }

    /// Local tile slice, row-major.
    #[must_use]
    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }

    /// Tile at local coordinates, `Wall` outside the chunk.
    #[inline]
    #[must_use]
    pub fn local_tile(&self, local_x: i32, local_y: i32) -> TileType {
        if (0..self.size).contains(&local_x) && (0..self.size).contains(&local_y) {
            self.tiles[(local_y * self.size + local_x) as usize]
        } else {
            TileType::Wall
        }
    }

    /// Tile at world coordinates, `Wall` outside the chunk.
    #[inline]
    #[must_use]
    pub fn tile_at_world(&self, x: i32, y: i32) -> TileType {
        self.local_tile(x - self.origin.x, y - self.origin.y)
    }

    /// Mirrors a grid write into the local copy. Only the chunk system's
    /// `set_tile` calls this.
    pub(crate) fn write_world(&mut self, x: i32, y: i32, tile: TileType) {
        let (lx, ly) = (x - self.origin.x, y - self.origin.y);
        if (0..self.size).contains(&lx) && (0..self.size).contains(&ly) {
            self.tiles[(ly * self.size + lx) as usize] = tile;
        }
    }

    /// Entities registered in this chunk.
    #[must_use]
    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    pub(crate) fn attach(&mut self, entity: EntityRef) -> bool {
        if self.entities.contains(&entity) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    pub(crate) fn detach(&mut self, entity: EntityRef) -> bool {
        let before = self.entities.len();
        self.entities.retain(|&e| e != entity);
        self.entities.len() != before
    }
}
