//! # Map Generator
//!
//! Builds a finite, fully connected dungeon in one synchronous pass:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ 1. Fill Wall │──>│ 2. Rooms     │──>│ 3. Prim MST  │──>│ 4. Extra     │
//! │              │   │  (buckets)   │   │  corridors   │   │  loops       │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────┬───────┘
//!        ^                                                        │
//!        │ retry (bounded)       ┌──────────────┐   ┌─────────────v┐
//!        └───────────────────────│ disconnected │<──│ 5. Flood     │
//!                                └──────────────┘   │  fill check  │
//!                                                   └──────┬───────┘
//!                                                          │ connected
//!                                                   ┌──────v───────┐
//!                                                   │ 6. Obstacles │
//!                                                   └──────────────┘
//! ```
//!
//! ## Determinism
//!
//! Identical inputs give identical maps. Bucket placement draws from the
//! stateless `MapSeed::unit` sequence indexed by room and try number;
//! the fallback placement, the loop corridors and the obstacle scatter
//! share one `ChaCha8Rng` stream derived from the attempt seed. Retry `k`
//! re-seeds from `seed.derive(k)` so it is not a replay of the failure.
//!
//! ## Cost
//!
//! The MST is O(rooms²). Generation is meant to run from a loading state,
//! not mid-frame.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::error::{MapError, MapResult};
use crate::seed::MapSeed;
use crate::theme::{GenerationParams, ObstacleRule, Theme};
use crate::tile::{TileGrid, TilePos, TileType};

/// Purpose tag for the per-attempt `ChaCha8Rng` stream.
const STREAM_PURPOSE: u64 = 0x6765_6e5f_7374_7265;

/// Draws consumed per bucket placement try (width, height, x, y).
const DRAWS_PER_TRY: u64 = 4;

/// Axis-aligned room rectangle in tile space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
}

impl Room {
    /// Creates a new room.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Center tile.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> TilePos {
        TilePos::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Returns true if `pos` lies inside the room.
    #[inline]
    #[must_use]
    pub const fn contains(&self, pos: TilePos) -> bool {
        pos.x >= self.x
            && pos.x < self.x + self.width
            && pos.y >= self.y
            && pos.y < self.y + self.height
    }

    /// The room grown by `pad` tiles on every side.
    #[inline]
    #[must_use]
    pub const fn padded(&self, pad: i32) -> Self {
        Self::new(self.x - pad, self.y - pad, self.width + 2 * pad, self.height + 2 * pad)
    }

    /// Returns true if the two rectangles share at least one tile.
    #[inline]
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Connection record between two rooms, kept as metadata only. The carved
/// path lives in the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Corridor {
    /// Index of the first room.
    #[serde(rename = "from_idx")]
    pub from: usize,
    /// Index of the second room.
    #[serde(rename = "to_idx")]
    pub to: usize,
}

/// Output of [`MapGenerator::generate`].
///
/// Read-only for every consumer; the chunk system takes ownership and
/// becomes the single write path.
#[derive(Clone, Debug)]
pub struct MapGenerationResult {
    grid: TileGrid,
    rooms: Vec<Room>,
    corridors: Vec<Corridor>,
    theme: Theme,
    enemy_types: Vec<String>,
    seed: MapSeed,
    attempts: u32,
}

impl MapGenerationResult {
    /// Assembles a result from parts (used when restoring records).
    pub(crate) fn from_parts(
        grid: TileGrid,
        rooms: Vec<Room>,
        corridors: Vec<Corridor>,
        theme: Theme,
        enemy_types: Vec<String>,
        seed: MapSeed,
    ) -> Self {
        Self {
            grid,
            rooms,
            corridors,
            theme,
            enemy_types,
            seed,
            attempts: 0,
        }
    }

    /// The tile grid.
    #[must_use]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub(crate) fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    /// Grid width in tiles.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.grid.width()
    }

    /// Grid height in tiles.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.grid.height()
    }

    /// Accepted rooms in placement order.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// MST edges followed by loop edges.
    #[must_use]
    pub fn corridors(&self) -> &[Corridor] {
        &self.corridors
    }

    /// Theme the map was generated with.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Enemy ids for this map (theme pool or caller override).
    #[must_use]
    pub fn enemy_types(&self) -> &[String] {
        &self.enemy_types
    }

    /// Seed the map was generated from.
    #[must_use]
    pub fn seed(&self) -> MapSeed {
        self.seed
    }

    /// Generation attempts used (0 for restored maps).
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Dungeon generator.
#[derive(Clone, Debug, Default)]
pub struct MapGenerator {
    config: GeneratorConfig,
}

impl MapGenerator {
    /// Creates a generator with the given tuning.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generator tuning.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a map.
    ///
    /// `enemy_types` overrides the theme's enemy pool when given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` for grids smaller than 3x3, and
    /// `ConnectivityExhausted` if every attempt left the floor split.
    pub fn generate(
        &self,
        width: i32,
        height: i32,
        theme: &Theme,
        seed: MapSeed,
        enemy_types: Option<Vec<String>>,
    ) -> MapResult<MapGenerationResult> {
        self.generate_with_check(width, height, theme, seed, enemy_types, floor_connectivity)
    }

    /// Retry loop behind [`Self::generate`]. `connectivity` reports
    /// `(reachable, total)` for a carved attempt; the attempt is accepted
    /// only when the two match.
    pub(crate) fn generate_with_check(
        &self,
        width: i32,
        height: i32,
        theme: &Theme,
        seed: MapSeed,
        enemy_types: Option<Vec<String>>,
        connectivity: impl Fn(&TileGrid) -> (usize, usize),
    ) -> MapResult<MapGenerationResult> {
        let mut grid = TileGrid::filled(width, height, TileType::Wall)?;
        let max_attempts = self.config.max_attempts.max(1);
        let mut last = (0, 0);

        for attempt in 0..max_attempts {
            let attempt_seed = if attempt == 0 {
                seed
            } else {
                seed.derive(u64::from(attempt))
            };
            let mut rng = attempt_seed.derive(STREAM_PURPOSE).rng();

            grid.fill(TileType::Wall);
            let rooms = self.place_rooms(&mut grid, theme.params(), attempt_seed, &mut rng);
            let mut corridors = connect_rooms(&mut grid, &rooms, theme.params().corridor_width);
            corridors.extend(add_loops(
                &mut grid,
                &rooms,
                theme.params(),
                &mut rng,
            ));

            let (reachable, total) = connectivity(&grid);
            if reachable != total {
                warn!(
                    attempt = attempt + 1,
                    max_attempts, reachable, total, "floor disconnected, regenerating"
                );
                last = (reachable, total);
                continue;
            }

            let placed = scatter_obstacles(&mut grid, theme.obstacles(), &mut rng);

            info!(
                theme = %theme.id(),
                width,
                height,
                seed = seed.value(),
                rooms = rooms.len(),
                corridors = corridors.len(),
                obstacles = placed,
                attempts = attempt + 1,
                "map generated"
            );

            return Ok(MapGenerationResult {
                grid,
                rooms,
                corridors,
                theme: theme.clone(),
                enemy_types: enemy_types.unwrap_or_else(|| theme.enemy_types().to_vec()),
                seed,
                attempts: attempt + 1,
            });
        }

        Err(MapError::ConnectivityExhausted {
            attempts: max_attempts,
            reachable: last.0,
            total: last.1,
        })
    }

    /// Places and carves rooms. Rooms are spread over a square bucket grid;
    /// each room first tries its own bucket, then the whole map.
    fn place_rooms(
        &self,
        grid: &mut TileGrid,
        params: &GenerationParams,
        seed: MapSeed,
        rng: &mut ChaCha8Rng,
    ) -> Vec<Room> {
        let (width, height) = (grid.width(), grid.height());
        let (inner_w, inner_h) = (width - 2, height - 2);
        let target = (f64::from(width) * f64::from(height) * params.room_density).floor() as usize;

        let min_size = params.min_room_size;
        let max_size = params.max_room_size.min(inner_w).min(inner_h);
        if target == 0 || max_size < min_size {
            return Vec::new();
        }

        let cols = ((target as f64).sqrt().ceil() as i32).max(1);
        let bucket_w = inner_w / cols;
        let bucket_h = inner_h / cols;
        let pad = self.config.room_padding;
        let tries = u64::from(self.config.placement_attempts);

        let mut rooms: Vec<Room> = Vec::with_capacity(target);
        let fits = |candidate: &Room, rooms: &[Room]| {
            let padded = candidate.padded(pad);
            !rooms.iter().any(|r| r.padded(pad).intersects(&padded))
        };

        for i in 0..target {
            let slot = i as i32;
            let bx = 1 + (slot % cols) * bucket_w;
            let by = 1 + (slot / cols) * bucket_h;

            let mut placed = None;
            if bucket_w >= min_size && bucket_h >= min_size {
                let max_w = max_size.min(bucket_w);
                let max_h = max_size.min(bucket_h);
                for t in 0..tries {
                    let base = (i as u64 * tries + t) * DRAWS_PER_TRY;
                    let w = seed.range(base, min_size, max_w);
                    let h = seed.range(base + 1, min_size, max_h);
                    let x = seed.range(base + 2, bx, bx + bucket_w - w);
                    let y = seed.range(base + 3, by, by + bucket_h - h);
                    let candidate = Room::new(x, y, w, h);
                    if fits(&candidate, &rooms) {
                        placed = Some(candidate);
                        break;
                    }
                }
            }

            if placed.is_none() {
                debug!(room = i, bucket_w, bucket_h, "bucket placement failed, trying whole map");
                for _ in 0..tries {
                    let w = rng.gen_range(min_size..=max_size);
                    let h = rng.gen_range(min_size..=max_size);
                    let x = rng.gen_range(1..=width - 1 - w);
                    let y = rng.gen_range(1..=height - 1 - h);
                    let candidate = Room::new(x, y, w, h);
                    if fits(&candidate, &rooms) {
                        placed = Some(candidate);
                        break;
                    }
                }
            }

            if let Some(room) = placed {
                carve_room(grid, &room);
                rooms.push(room);
            }
        }

        rooms
    }
}

/// Carves a room's interior to floor. Border cells are never touched.
pub(crate) fn carve_room(grid: &mut TileGrid, room: &Room) {
    for y in room.y..room.y + room.height {
        for x in room.x..room.x + room.width {
            if grid.in_bounds(x, y) && !grid.is_border(x, y) {
                grid.set(x, y, TileType::Floor);
            }
        }
    }
}

/// Bresenham line from `from` to `to`, both ends included.
#[must_use]
pub fn line(from: TilePos, to: TilePos) -> Vec<TilePos> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);
    let mut points = Vec::with_capacity((dx - dy) as usize + 1);

    loop {
        points.push(TilePos::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

/// Carves an elbow corridor between two room centers: horizontal first,
/// then vertical, widened by `half_width` on each side.
pub(crate) fn carve_elbow(grid: &mut TileGrid, a: &Room, b: &Room, half_width: i32) {
    let start = a.center();
    let end = b.center();
    let corner = TilePos::new(end.x, start.y);

    for pos in line(start, corner).into_iter().chain(line(corner, end)) {
        for dy in -half_width..=half_width {
            for dx in -half_width..=half_width {
                let (x, y) = (pos.x + dx, pos.y + dy);
                if grid.in_bounds(x, y) && !grid.is_border(x, y) {
                    grid.set(x, y, TileType::Floor);
                }
            }
        }
    }
}

/// Prim's algorithm over room centers (Euclidean distance). Returns edges
/// in the order rooms join the tree.
#[must_use]
pub fn minimum_spanning_edges(centers: &[TilePos]) -> Vec<(usize, usize)> {
    let n = centers.len();
    if n < 2 {
        return Vec::new();
    }

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut parent = vec![0usize; n];
    let mut edges = Vec::with_capacity(n - 1);

    in_tree[0] = true;
    for j in 1..n {
        best[j] = centers[0].distance(centers[j]);
    }

    for _ in 1..n {
        let mut next = None;
        for j in 0..n {
            if !in_tree[j] && next.map_or(true, |k: usize| best[j] < best[k]) {
                next = Some(j);
            }
        }
        let Some(j) = next else { break };

        in_tree[j] = true;
        edges.push((parent[j], j));

        for k in 0..n {
            if !in_tree[k] {
                let d = centers[j].distance(centers[k]);
                if d < best[k] {
                    best[k] = d;
                    parent[k] = j;
                }
            }
        }
    }
    edges
}

fn connect_rooms(grid: &mut TileGrid, rooms: &[Room], half_width: i32) -> Vec<Corridor> {
    let centers: Vec<TilePos> = rooms.iter().map(Room::center).collect();
    minimum_spanning_edges(&centers)
        .into_iter()
        .map(|(from, to)| {
            carve_elbow(grid, &rooms[from], &rooms[to], half_width);
            Corridor { from, to }
        })
        .collect()
}

fn add_loops(
    grid: &mut TileGrid,
    rooms: &[Room],
    params: &GenerationParams,
    rng: &mut ChaCha8Rng,
) -> Vec<Corridor> {
    let n = rooms.len();
    if n < 2 {
        return Vec::new();
    }
    let extra = (n as f64 * params.extra_connections_fraction).floor() as usize;

    (0..extra)
        .map(|_| {
            let from = rng.gen_range(0..n);
            let mut to = rng.gen_range(0..n);
            if to == from {
                to = (from + 1) % n;
            }
            carve_elbow(grid, &rooms[from], &rooms[to], params.corridor_width);
            Corridor { from, to }
        })
        .collect()
}

/// Returns `(reachable, total)` floor counts. A grid with no floor is
/// trivially connected.
#[must_use]
pub fn floor_connectivity(grid: &TileGrid) -> (usize, usize) {
    let total = grid.count(TileType::Floor);
    let reachable = grid
        .find_first(TileType::Floor)
        .map_or(0, |start| grid.flood_count(start, TileType::Floor));
    (reachable, total)
}

/// Returns `(reachable, total)` passable-tile counts, flooding from the
/// first passable tile in scan order.
#[must_use]
pub fn passable_connectivity(grid: &TileGrid) -> (usize, usize) {
    let total = grid.tiles().iter().filter(|t| t.is_passable()).count();
    let reachable = grid
        .tiles()
        .iter()
        .position(|t| t.is_passable())
        .map_or(0, |idx| {
            let w = grid.width() as usize;
            let start = TilePos::new((idx % w) as i32, (idx / w) as i32);
            grid.flood_count_by(start, TileType::is_passable)
        });
    (reachable, total)
}

/// 8-neighborhood in ring order, starting north and going clockwise.
const RING: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Returns true if turning `(x, y)` into an obstacle keeps its open-ground
/// neighbors locally connected: at least two open 4-neighbors, and every
/// open 4-neighbor lies on the same open run around the ring.
fn obstacle_keeps_connectivity(grid: &TileGrid, x: i32, y: i32) -> bool {
    let open: [bool; 8] =
        RING.map(|(dx, dy)| grid.get_or_wall(x + dx, y + dy).is_open_ground());

    let orthogonal_open = (0..8).step_by(2).filter(|&i| open[i]).count();
    if orthogonal_open < 2 {
        return false;
    }

    // Rotate so the scan starts on a closed cell; runs then never wrap.
    let Some(start) = (0..8).find(|&i| !open[i]) else {
        return true;
    };
    let mut runs_with_orthogonal = 0;
    let mut in_run = false;
    let mut run_has_orthogonal = false;
    for step in 1..=8 {
        let i = (start + step) % 8;
        if open[i] {
            in_run = true;
            run_has_orthogonal |= i % 2 == 0;
        } else if in_run {
            if run_has_orthogonal {
                runs_with_orthogonal += 1;
            }
            in_run = false;
            run_has_orthogonal = false;
        }
    }
    runs_with_orthogonal <= 1
}

fn too_close_to_same(grid: &TileGrid, x: i32, y: i32, rule: &ObstacleRule) -> bool {
    let d = rule.min_distance;
    (-d..=d).any(|dy| {
        (-d..=d).any(|dx| (dx != 0 || dy != 0) && grid.get(x + dx, y + dy) == Some(rule.tile))
    })
}

/// Scatters theme obstacles over floor tiles. One draw per floor tile picks
/// at most one obstacle, in table order. Returns how many were placed.
fn scatter_obstacles(grid: &mut TileGrid, rules: &[ObstacleRule], rng: &mut ChaCha8Rng) -> usize {
    if rules.is_empty() {
        return 0;
    }
    let mut placed = 0;

    for y in 1..grid.height() - 1 {
        for x in 1..grid.width() - 1 {
            if grid.get(x, y) != Some(TileType::Floor) {
                continue;
            }
            let roll: f64 = rng.gen();
            let mut threshold = 0.0;
            let Some(rule) = rules.iter().find(|r| {
                threshold += r.chance;
                roll < threshold
            }) else {
                continue;
            };

            if too_close_to_same(grid, x, y, rule) {
                continue;
            }
            grid.set(x, y, rule.tile);
            if obstacle_keeps_connectivity(grid, x, y) {
                placed += 1;
            } else {
                grid.set(x, y, TileType::Floor);
            }
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn generator() -> MapGenerator {
        MapGenerator::new(GeneratorConfig::default())
    }

    #[test]
    fn test_room_padding_intersection() {
        let a = Room::new(2, 2, 4, 4);
        let b = Room::new(8, 2, 4, 4);
        assert!(!a.intersects(&b));
        // 2-tile gap: padded by 2 they touch.
        assert!(a.padded(2).intersects(&b.padded(2)));
        let c = Room::new(10, 2, 4, 4);
        assert!(!a.padded(2).intersects(&c.padded(2)));
    }

    #[test]
    fn test_line_endpoints_and_continuity() {
        let pts = line(TilePos::new(1, 1), TilePos::new(7, 4));
        assert_eq!(pts.first(), Some(&TilePos::new(1, 1)));
        assert_eq!(pts.last(), Some(&TilePos::new(7, 4)));
        for w in pts.windows(2) {
            assert!((w[0].x - w[1].x).abs() <= 1 && (w[0].y - w[1].y).abs() <= 1);
        }
    }

    #[test]
    fn test_mst_has_n_minus_one_edges() {
        let centers = [
            TilePos::new(0, 0),
            TilePos::new(10, 0),
            TilePos::new(0, 10),
            TilePos::new(30, 30),
        ];
        let edges = minimum_spanning_edges(&centers);
        assert_eq!(edges.len(), 3);
        // Far room attaches to its nearest neighbor, not the root.
        assert!(edges.iter().any(|&(a, b)| b == 3 && a != 0));
        assert!(minimum_spanning_edges(&centers[..1]).is_empty());
    }

    #[test]
    fn test_generation_is_connected_and_bordered() {
        for seed in [1, 42, 777, 9001] {
            let result = generator()
                .generate(64, 48, &theme::forest(), MapSeed::new(seed), None)
                .unwrap();
            let grid = result.grid();
            for x in 0..grid.width() {
                assert_eq!(grid.get(x, 0), Some(TileType::Wall));
                assert_eq!(grid.get(x, grid.height() - 1), Some(TileType::Wall));
            }
            for y in 0..grid.height() {
                assert_eq!(grid.get(0, y), Some(TileType::Wall));
                assert_eq!(grid.get(grid.width() - 1, y), Some(TileType::Wall));
            }
            let (reachable, total) = passable_connectivity(grid);
            assert!(total > 0);
            assert_eq!(reachable, total, "seed {seed} left passable tiles unreachable");
        }
    }

    #[test]
    fn test_same_seed_same_map() {
        let gen = generator();
        let a = gen.generate(80, 60, &theme::cave(), MapSeed::new(5), None).unwrap();
        let b = gen.generate(80, 60, &theme::cave(), MapSeed::new(5), None).unwrap();
        assert_eq!(a.rooms(), b.rooms());
        assert_eq!(a.grid(), b.grid());
        assert_eq!(a.corridors(), b.corridors());
    }

    #[test]
    fn test_tiny_map_has_no_rooms_but_succeeds() {
        let result = generator()
            .generate(5, 5, &theme::frost(), MapSeed::new(3), None)
            .unwrap();
        assert!(result.rooms().is_empty());
        assert!(result.corridors().is_empty());
        assert_eq!(result.grid().count(TileType::Floor), 0);
    }

    #[test]
    fn test_enemy_override() {
        let result = generator()
            .generate(
                40,
                40,
                &theme::forest(),
                MapSeed::new(3),
                Some(vec!["dragon".to_string()]),
            )
            .unwrap();
        assert_eq!(result.enemy_types(), &["dragon".to_string()]);
    }

    #[test]
    fn test_obstacle_rejected_in_dead_end() {
        let mut grid = TileGrid::filled(5, 5, TileType::Wall).unwrap();
        grid.set(1, 2, TileType::Floor);
        grid.set(2, 2, TileType::Floor);
        // Only one open neighbor.
        assert!(!obstacle_keeps_connectivity(&grid, 1, 2));
    }

    #[test]
    fn test_obstacle_rejected_when_cutting_corridor() {
        let mut grid = TileGrid::filled(5, 3, TileType::Wall).unwrap();
        for x in 1..4 {
            grid.set(x, 1, TileType::Floor);
        }
        // Two open neighbors on opposite sides with walls between: a cut.
        assert!(!obstacle_keeps_connectivity(&grid, 2, 1));
    }

    #[test]
    fn test_obstacle_accepted_in_open_room() {
        let mut grid = TileGrid::filled(5, 5, TileType::Wall).unwrap();
        for y in 1..4 {
            for x in 1..4 {
                grid.set(x, y, TileType::Floor);
            }
        }
        assert!(obstacle_keeps_connectivity(&grid, 2, 2));
        assert!(obstacle_keeps_connectivity(&grid, 1, 1));
    }

    #[test]
    fn test_connectivity_exhausted_after_max_attempts() {
        let gen = MapGenerator::new(GeneratorConfig {
            max_attempts: 3,
            ..GeneratorConfig::default()
        });
        let calls = std::cell::Cell::new(0);
        let result = gen.generate_with_check(64, 48, &theme::forest(), MapSeed::new(42), None, |_| {
            calls.set(calls.get() + 1);
            (1, 2)
        });
        assert_eq!(
            result.unwrap_err(),
            MapError::ConnectivityExhausted {
                attempts: 3,
                reachable: 1,
                total: 2,
            }
        );
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_reseeds_after_failed_attempt() {
        let gen = generator();
        let first = gen
            .generate(64, 48, &theme::forest(), MapSeed::new(42), None)
            .unwrap();
        assert_eq!(first.attempts(), 1);

        let calls = std::cell::Cell::new(0);
        let retried = gen
            .generate_with_check(64, 48, &theme::forest(), MapSeed::new(42), None, |grid| {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    (0, 1)
                } else {
                    floor_connectivity(grid)
                }
            })
            .unwrap();
        assert_eq!(retried.attempts(), 2);
        assert_eq!(retried.seed(), MapSeed::new(42));
        assert_ne!(retried.rooms(), first.rooms());
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = generator()
            .generate(2, 40, &theme::forest(), MapSeed::new(1), None)
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidDimensions { .. }));
    }
}
