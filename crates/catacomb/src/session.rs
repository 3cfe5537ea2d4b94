//! # Level Session
//!
//! Per-frame driver for a loaded level:
//!
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. MOVE      viewer position from the host's movement update │
//! │ 2. PAGE      update_chunks (once, and only here)             │
//! │ 3. VISIBLE   chunks_to_render for the current screen         │
//! │ 4. STATS     timings + counters into FrameStats              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Generation happens before a session exists, in the loading state.

use std::time::{Duration, Instant};

use catacomb_procedural::{ChunkSystem, TilePos};
use tracing::warn;

/// Paging time above which a frame is reported as slow.
pub const MAX_PAGING_TIME: Duration = Duration::from_millis(4);

/// Screen setup used to pick visible chunks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Screen width in pixels.
    pub width: f32,
    /// Screen height in pixels.
    pub height: f32,
    /// Tile edge in pixels at zoom 1.
    pub tile_size: f32,
    /// Zoom factor.
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            tile_size: 16.0,
            zoom: 1.0,
        }
    }
}

/// Counters for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Time spent in `update_chunks`, microseconds.
    pub paging_us: u64,
    /// Chunks materialized by this frame's update.
    pub chunks_loaded: usize,
    /// Chunks cached after the update.
    pub chunks_cached: usize,
    /// Chunks returned for rendering.
    pub chunks_visible: usize,
}

/// A loaded level plus the viewer walking through it.
pub struct LevelSession {
    chunks: ChunkSystem,
    viewport: Viewport,
    frame: u64,
}

impl LevelSession {
    /// Wraps a loaded level.
    #[must_use]
    pub fn new(chunks: ChunkSystem, viewport: Viewport) -> Self {
        Self {
            chunks,
            viewport,
            frame: 0,
        }
    }

    /// The paged level.
    #[must_use]
    pub fn chunks(&self) -> &ChunkSystem {
        &self.chunks
    }

    /// Mutable access for spawn queries and tile edits.
    pub fn chunks_mut(&mut self) -> &mut ChunkSystem {
        &mut self.chunks
    }

    /// Changes the viewport (resize, zoom).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Runs one frame with the viewer at `viewer` (tile coordinates).
    pub fn frame(&mut self, viewer: TilePos) -> FrameStats {
        self.frame += 1;
        let (vx, vy) = (viewer.x as f32 + 0.5, viewer.y as f32 + 0.5);

        let start = Instant::now();
        let loaded = self.chunks.update_chunks(vx, vy);
        let paging = start.elapsed();
        if paging > MAX_PAGING_TIME {
            warn!(frame = self.frame, paging_us = paging.as_micros() as u64, "slow chunk paging");
        }

        let vp = self.viewport;
        let scale = vp.tile_size * vp.zoom;
        let visible = self
            .chunks
            .chunks_to_render((vx * scale, vy * scale), vp.width, vp.height, vp.tile_size, vp.zoom)
            .len();

        FrameStats {
            frame: self.frame,
            paging_us: paging.as_micros() as u64,
            chunks_loaded: loaded,
            chunks_cached: self.chunks.cached_chunk_count(),
            chunks_visible: visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{LevelLoader, LevelRequest};
    use catacomb_procedural::{ThemeRegistry, WorldConfig};

    fn session() -> LevelSession {
        let loader = LevelLoader::new(ThemeRegistry::with_builtin_themes(), WorldConfig::default());
        let chunks = loader.load(&LevelRequest::new(128, 128, "cave", 3)).unwrap();
        LevelSession::new(chunks, Viewport::default())
    }

    #[test]
    fn test_first_frame_loads_neighborhood() {
        let mut session = session();
        let stats = session.frame(TilePos::new(64, 64));
        assert_eq!(stats.frame, 1);
        assert_eq!(stats.chunks_loaded, 25);
        assert!(stats.chunks_visible > 0);
        assert!(stats.chunks_cached >= 25);
    }

    #[test]
    fn test_standing_still_loads_nothing_new() {
        let mut session = session();
        session.frame(TilePos::new(64, 64));
        let stats = session.frame(TilePos::new(65, 64));
        assert_eq!(stats.chunks_loaded, 0);
        assert_eq!(stats.frame, 2);
    }
}
