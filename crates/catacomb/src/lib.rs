//! # CATACOMB
//!
//! The host-facing crate: level loading and the per-frame paging driver,
//! built on the procedural core.
//!
//! ```text
//! ThemeRegistry ──> LevelLoader::load(request) ──> ChunkSystem ──> LevelSession
//!                        │                                             │
//!                   MapGenerator                              update_chunks /
//!                                                             chunks_to_render
//! ```
//!
//! ## Modules
//!
//! - `level`: Level requests and the loader
//! - `session`: Frame orchestration over a loaded level

pub mod level;
pub mod session;

// Re-export the core
pub use catacomb_procedural as procedural;

// Re-export commonly used types
pub use level::{LevelLoader, LevelRequest, ThemeSelector};
pub use session::{FrameStats, LevelSession, Viewport};
