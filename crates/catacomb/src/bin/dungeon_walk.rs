//! # Dungeon Walk
//!
//! Generates a level, walks the viewer through every room center in
//! order and reports paging behavior along the way.
//!
//! ```text
//! dungeon_walk [width] [height] [theme|random] [seed] [--ascii] [--config <file.toml>]
//! ```

use std::time::Instant;

use catacomb::{
    procedural::{ThemeRegistry, TilePos, WorldConfig},
    LevelLoader, LevelRequest, LevelSession, Viewport,
};

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                     CATACOMB - DUNGEON WALK                      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();
    let positional: Vec<&String> = args
        .iter()
        .skip(1)
        .take_while(|a| !a.starts_with("--"))
        .collect();

    let width: i32 = positional.first().and_then(|s| s.parse().ok()).unwrap_or(128);
    let height: i32 = positional.get(1).and_then(|s| s.parse().ok()).unwrap_or(128);
    let theme = positional.get(2).map_or("random", |s| s.as_str());
    let seed: u64 = positional.get(3).and_then(|s| s.parse().ok()).unwrap_or(42);
    let ascii = args.iter().any(|a| a == "--ascii");

    let config = match args.iter().position(|a| a == "--config").and_then(|i| args.get(i + 1)) {
        Some(path) => {
            let source = match std::fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    println!("Error: Could not read config {path}: {e}");
                    return;
                }
            };
            match WorldConfig::from_toml_str(&source) {
                Ok(c) => c,
                Err(e) => {
                    println!("Error: Invalid config: {e}");
                    return;
                }
            }
        }
        None => WorldConfig::default(),
    };

    let loader = LevelLoader::new(ThemeRegistry::with_builtin_themes(), config);

    let gen_start = Instant::now();
    let loaded = if theme == "random" {
        loader.load_random(width, height, seed)
    } else {
        loader.load(&LevelRequest::new(width, height, theme, seed))
    };
    let chunks = match loaded {
        Ok(c) => c,
        Err(e) => {
            println!("Error: Generation failed: {e}");
            return;
        }
    };
    let gen_us = gen_start.elapsed().as_micros();

    let info = chunks.map_info();
    let map = chunks.map();
    println!("┌─ MAP ──────────────────────────────────────────────────────────┐");
    println!("│ Size:        {}x{}", info.width, info.height);
    println!("│ Theme:       {}", info.theme_id);
    println!("│ Seed:        {}", map.seed().value());
    println!("│ Rooms:       {}", info.room_count);
    println!("│ Corridors:   {}", map.corridors().len());
    println!("│ Attempts:    {}", map.attempts());
    println!("│ Enemies:     {}", info.enemy_types.join(", "));
    println!("│ Generated:   {gen_us} µs");
    println!("└────────────────────────────────────────────────────────────────┘");
    println!();

    if ascii {
        println!("{}", map.grid().to_ascii());
    }

    let waypoints: Vec<TilePos> = map.rooms().iter().map(|r| r.center()).collect();
    let mut session = LevelSession::new(chunks, Viewport::default());

    let mut worst_us = 0;
    let mut total_loaded = 0;
    let mut max_cached = 0;
    for (i, waypoint) in waypoints.iter().enumerate() {
        let stats = session.frame(*waypoint);
        worst_us = worst_us.max(stats.paging_us);
        total_loaded += stats.chunks_loaded;
        max_cached = max_cached.max(stats.chunks_cached);
        println!(
            "  room {i:>3} at ({:>4},{:>4}): +{:>3} loaded, {:>4} cached, {:>3} visible, {:>5} µs",
            waypoint.x, waypoint.y, stats.chunks_loaded, stats.chunks_cached, stats.chunks_visible, stats.paging_us
        );
    }

    let spawns = session.chunks_mut();
    let player = spawns.player_spawn_position();
    let enemies = player.map_or_else(Vec::new, |p| spawns.enemy_spawn_positions(16, p, 8.0));
    let totals = spawns.stats();

    println!();
    println!("┌─ PAGING ───────────────────────────────────────────────────────┐");
    println!("│ Waypoints:        {}", waypoints.len());
    println!("│ Chunks loaded:    {total_loaded}");
    println!("│ Chunks evicted:   {}", totals.evicted);
    println!("│ Peak cache size:  {max_cached}");
    println!("│ Worst update:     {worst_us} µs");
    match player {
        Some(p) => println!("│ Player spawn:     ({}, {})", p.x, p.y),
        None => println!("│ Player spawn:     none"),
    }
    println!("│ Enemy spawns:     {}", enemies.len());
    println!("└────────────────────────────────────────────────────────────────┘");
}
