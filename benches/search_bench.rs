use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

use tuneindex::{CatalogConfig, SearchFilters, SortOrder, Track, TrackCatalog, VecSource};

const ARTISTS: [&str; 8] = [
    "Radiohead", "Bjork", "Portishead", "Massive Attack", "Boards of Canada", "Aphex Twin",
    "Sigur Ros", "Mogwai",
];

struct BenchEnv {
    _tmp: TempDir,
    catalog: TrackCatalog,
}

fn make_track(i: usize) -> Track {
    let artist = ARTISTS[i % ARTISTS.len()];
    let album = i / 12;
    Track {
        artist_id: format!("artist-{}", i % ARTISTS.len()),
        artist_name: artist.to_string(),
        album_id: format!("album-{album}"),
        album_name: format!("Album {album}"),
        album_image: String::new(),
        year: 1990 + (album % 30) as i32,
        track_id: format!("track-{i}"),
        track_name: format!("Song number {i}"),
        index: (i % 12) as u32 + 1,
        location: format!("file:///music/{i}.flac"),
        is_preferred: i % 2 == 0,
        genres: vec![if i % 3 == 0 { "Electronic" } else { "Rock" }.to_string()],
    }
}

fn build_env(track_count: usize) -> BenchEnv {
    let tmp = TempDir::new().unwrap();
    let catalog = TrackCatalog::open(CatalogConfig::new(tmp.path())).unwrap();
    let tracks = (0..track_count).map(make_track).collect();
    catalog.rebuild(&mut VecSource::new(tracks)).unwrap();
    BenchEnv { _tmp: tmp, catalog }
}

fn build_envs() -> Vec<(usize, BenchEnv)> {
    [1_000usize, 10_000, 50_000]
        .iter()
        .map(|&count| (count, build_env(count)))
        .collect()
}

fn bench_keyword_search(c: &mut Criterion) {
    let envs = build_envs();

    let mut group = c.benchmark_group("keyword_search");
    for (count, env) in envs.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), env, |b, env| {
            b.iter(|| {
                black_box(env.catalog.search(
                    Some("massive att"),
                    &SearchFilters::none(),
                    SortOrder::Default,
                ));
            });
        });
    }
    group.finish();
}

fn bench_filtered_search(c: &mut Criterion) {
    let envs = build_envs();

    let mut group = c.benchmark_group("filtered_search");
    let filters = SearchFilters::year(2001).with_genre("Rock");
    for (count, env) in envs.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), env, |b, env| {
            b.iter(|| {
                black_box(env.catalog.search(Some("*"), &filters, SortOrder::Track));
            });
        });
    }
    group.finish();
}

fn bench_shuffled_playlist(c: &mut Criterion) {
    let envs = build_envs();

    let mut group = c.benchmark_group("shuffled_playlist");
    for (count, env) in envs.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), env, |b, env| {
            b.iter(|| {
                black_box(env.catalog.shuffled_playlist(50, None));
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_keyword_search,
    bench_filtered_search,
    bench_shuffled_playlist
);
criterion_main!(benches);
