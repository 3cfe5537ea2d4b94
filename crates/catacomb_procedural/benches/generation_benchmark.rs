//! Benchmark for dungeon generation.
//!
//! Generation runs once per level load; the MST step is O(rooms²), so the
//! large-map case is the one to watch.
//!
//! Run with: cargo bench --package catacomb_procedural --bench generation_benchmark

use catacomb_procedural::{GeneratorConfig, MapGenerator, MapSeed, ThemeRegistry};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn benchmark_generate_sizes(c: &mut Criterion) {
    let registry = ThemeRegistry::with_builtin_themes();
    let generator = MapGenerator::new(GeneratorConfig::default());
    let theme = registry.get("forest");

    let mut group = c.benchmark_group("generate_forest");
    for side in [64, 128, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &side| {
            let mut seed = 0u64;
            b.iter(|| {
                seed = seed.wrapping_add(1);
                black_box(
                    generator
                        .generate(side, side, theme, MapSeed::new(seed), None)
                        .map(|m| m.rooms().len()),
                )
            });
        });
    }
    group.finish();
}

fn benchmark_generate_themes(c: &mut Criterion) {
    let registry = ThemeRegistry::with_builtin_themes();
    let generator = MapGenerator::new(GeneratorConfig::default());

    let mut group = c.benchmark_group("generate_theme_128");
    for id in registry.all_ids() {
        let theme = registry.get(id);
        group.bench_function(id, |b| {
            b.iter(|| black_box(generator.generate(128, 128, theme, MapSeed::new(42), None).is_ok()));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_generate_sizes, benchmark_generate_themes);
criterion_main!(benches);
