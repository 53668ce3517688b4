use criterion::{criterion_group, criterion_main, Criterion};
use heightmap::{
    demfile::{
        gl1::{write_tile, GL1_DIMENSION},
        LatLon, TileKey,
    },
    GeodesicModel, HeightReader, SrtmReader, TileCache,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Writes a sloped GL1 tile covering (44, -72) and returns its
/// directory.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn tile_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let samples: Vec<i16> = (0..GL1_DIMENSION * GL1_DIMENSION)
        .map(|i| ((i / GL1_DIMENSION + i % GL1_DIMENSION) / 4) as i16)
        .collect();
    write_tile(dir.path(), TileKey::new(44, -72), &samples).unwrap();
    dir
}

fn terrain_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("Terrain Profile");

    let start = LatLon::new(44.283_098_066_031_65, -71.308_307_164_413_69);
    let end = LatLon::new(44.256_280_984_242_78, -71.297_207_328_376_8);

    let dir = tile_dir();
    let cache = Arc::new(TileCache::new(dir.path(), 4));
    let reader = SrtmReader::new(cache, Arc::new(GeodesicModel::wgs84()));
    let _30m = 30.0;

    group.bench_with_input("short", &(reader, _30m, start, end), |b, (r, d, s, e)| {
        b.iter(|| r.profile(*s, *e, *d, 1.0))
    });
}

fn altitude_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("Altitude Matrix");

    let dir = tile_dir();
    let cache = Arc::new(TileCache::new(dir.path(), 4));
    let reader = SrtmReader::new(cache, Arc::new(GeodesicModel::wgs84()));
    let lats: Vec<f64> = (0..64).map(|i| 44.1 + f64::from(i) * 0.01).collect();
    let lons: Vec<f64> = (0..64).map(|i| -71.9 + f64::from(i) * 0.01).collect();

    group.bench_with_input("64x64", &(reader, lats, lons), |b, (r, lats, lons)| {
        b.iter(|| r.altitude_matrix(lats, lons, 1.0, 0.0))
    });
}

criterion_group!(benches, terrain_profile, altitude_matrix);
criterion_main!(benches);
