//! End-to-end tests for the catalog: rebuild, search, lookups, facets and
//! shuffled playlists against an on-disk index.

use std::collections::HashSet;
use std::io::Write;

use tempfile::{NamedTempFile, TempDir};
use tuneindex::{
    CatalogConfig, CatalogError, Field, JsonLinesSource, SearchFilters, SearchRequest, SortOrder,
    Track, TrackCatalog, VecSource, UNSPECIFIED_GENRE,
};

fn create_track(
    id: &str,
    artist: &str,
    album: &str,
    name: &str,
    year: i32,
    index: u32,
    genres: &[&str],
) -> Track {
    Track {
        artist_id: format!("{}-id", artist.to_lowercase().replace(' ', "-")),
        artist_name: artist.to_string(),
        album_id: format!("{}-id", album.to_lowercase().replace(' ', "-")),
        album_name: album.to_string(),
        album_image: format!("file:///covers/{id}.jpg"),
        year,
        track_id: id.to_string(),
        track_name: name.to_string(),
        index,
        location: format!("file:///music/{id}.mp3"),
        is_preferred: false,
        genres: genres.iter().map(|g| g.to_string()).collect(),
    }
}

/// Two artists, two albums; three tracks from 2001 and two from 2005
fn five_tracks() -> Vec<Track> {
    vec![
        create_track("t1", "The Examples", "First Light", "Opening", 2001, 1, &["Rock"]),
        create_track("t2", "The Examples", "First Light", "Example Song", 2001, 2, &["Rock"]),
        create_track("t3", "The Examples", "First Light", "Closing Time", 2001, 3, &["Rock", "Indie"]),
        create_track("t4", "Sample Band", "Late Hours", "Exam Night", 2005, 2, &["Jazz"]),
        create_track("t5", "Sample Band", "Late Hours", "Morning", 2005, 1, &[]),
    ]
}

fn setup_catalog(tracks: Vec<Track>) -> (TempDir, TrackCatalog) {
    let tmp = TempDir::new().unwrap();
    let catalog = TrackCatalog::open(CatalogConfig::new(tmp.path())).unwrap();
    catalog.rebuild(&mut VecSource::new(tracks)).unwrap();
    (tmp, catalog)
}

fn ids(tracks: &[Track]) -> Vec<&str> {
    tracks.iter().map(|t| t.track_id.as_str()).collect()
}

fn sorted_ids(tracks: &[Track]) -> Vec<String> {
    let mut ids: Vec<String> = tracks.iter().map(|t| t.track_id.clone()).collect();
    ids.sort();
    ids
}

#[test]
fn test_prefix_search_finds_partial_word() {
    let (_tmp, catalog) = setup_catalog(five_tracks());

    let hits = catalog.search(Some("exam"), &SearchFilters::none(), SortOrder::Default);
    // "exam" prefixes "examples" (artist of t1..t3), "example" (t2) and "exam" (t4)
    assert_eq!(sorted_ids(&hits), vec!["t1", "t2", "t3", "t4"]);

    let hits = catalog.search(Some("example so"), &SearchFilters::none(), SortOrder::Default);
    assert_eq!(ids(&hits), vec!["t2"]);
}

#[test]
fn test_year_filter_excludes_other_years() {
    let (_tmp, catalog) = setup_catalog(five_tracks());

    let hits = catalog.search(Some("exam"), &SearchFilters::year(2001), SortOrder::Default);
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|t| t.year == 2001));
    assert!(hits.iter().any(|t| t.track_name == "Example Song"));
}

#[test]
fn test_genre_filter_with_wildcard() {
    let (_tmp, catalog) = setup_catalog(five_tracks());

    let hits = catalog.search(Some("*"), &SearchFilters::genre("Indie"), SortOrder::Default);
    assert_eq!(ids(&hits), vec!["t3"]);

    let all = catalog.search(Some(" * "), &SearchFilters::none(), SortOrder::Default);
    assert_eq!(all.len(), 5);
}

#[test]
fn test_blank_keywords_return_empty() {
    let (_tmp, catalog) = setup_catalog(five_tracks());

    for keywords in [None, Some(""), Some("   "), Some("!!")] {
        assert!(catalog
            .search(keywords, &SearchFilters::none(), SortOrder::Default)
            .is_empty());
    }
}

#[test]
fn test_accents_and_case_are_ignored() {
    let (_tmp, catalog) = setup_catalog(vec![create_track(
        "b1", "Beyoncé", "Déjà Vu", "Crazy in Love", 2003, 1, &["Pop"],
    )]);

    let hits = catalog.search(Some("BEYONCE deja"), &SearchFilters::none(), SortOrder::Default);
    assert_eq!(ids(&hits), vec!["b1"]);
}

#[test]
fn test_sort_orders() {
    let (_tmp, catalog) = setup_catalog(five_tracks());
    let all = |sort| catalog.search(Some("*"), &SearchFilters::none(), sort);

    // Default: artist, then year, album and track index
    assert_eq!(ids(&all(SortOrder::Default)), vec!["t5", "t4", "t1", "t2", "t3"]);
    // Track order: year first, then track name
    assert_eq!(ids(&all(SortOrder::Track)), vec!["t3", "t2", "t1", "t4", "t5"]);
    // Artist and album orders group by year first
    let by_artist = all(SortOrder::Artist);
    assert!(by_artist[..3].iter().all(|t| t.year == 2001));
    assert!(by_artist[3..].iter().all(|t| t.year == 2005));
}

#[test]
fn test_search_request() {
    let (_tmp, catalog) = setup_catalog(five_tracks());
    let request = SearchRequest::new("late")
        .with_filters(SearchFilters::year(2005))
        .with_sort(SortOrder::Track);

    assert_eq!(ids(&catalog.search_request(&request)), vec!["t4", "t5"]);
}

#[test]
fn test_max_hits_caps_results() {
    let tmp = TempDir::new().unwrap();
    let catalog = TrackCatalog::open(CatalogConfig::new(tmp.path()).with_max_hits(2)).unwrap();
    catalog.rebuild(&mut VecSource::new(five_tracks())).unwrap();

    let hits = catalog.search(Some("*"), &SearchFilters::none(), SortOrder::Default);
    assert_eq!(ids(&hits), vec!["t5", "t4"]);
}

#[test]
fn test_get_by_id() {
    let mut tracks = five_tracks();
    tracks[3].genres = vec!["Jazz".to_string(), "Blues".to_string()];
    tracks[3].is_preferred = true;
    let (_tmp, catalog) = setup_catalog(tracks.clone());

    let found = catalog.get_by_id("t4").unwrap().unwrap();
    assert_eq!(found, tracks[3]);

    assert!(catalog.get_by_id("missing").unwrap().is_none());
    assert!(catalog.get_by_id("  ").unwrap().is_none());
}

#[test]
fn test_get_by_album_id_in_track_order() {
    let (_tmp, catalog) = setup_catalog(five_tracks());

    let album = catalog.get_by_album_id("late-hours-id").unwrap();
    assert_eq!(ids(&album), vec!["t5", "t4"]);

    let album = catalog.get_by_album_id("first-light-id").unwrap();
    assert_eq!(ids(&album), vec!["t1", "t2", "t3"]);

    assert!(catalog.get_by_album_id("nope").unwrap().is_empty());
}

#[test]
fn test_distinct_values_and_cached_facets() {
    let (_tmp, catalog) = setup_catalog(five_tracks());

    let years: HashSet<String> = catalog.distinct_values(Field::Year).into_iter().collect();
    assert_eq!(years, HashSet::from(["2001".to_string(), "2005".to_string()]));

    let genres = catalog.genres();
    assert_eq!(genres, vec!["Indie", "Jazz", "Rock", UNSPECIFIED_GENRE]);
    assert_eq!(catalog.years(), vec![2001, 2005]);

    assert!(catalog.distinct_values_by_name("location").is_empty());
}

#[test]
fn test_unspecified_genre_survives_rebuild() {
    let (_tmp, catalog) = setup_catalog(five_tracks());

    assert!(catalog
        .distinct_values(Field::Genre)
        .contains(&UNSPECIFIED_GENRE.to_string()));
    let morning = catalog.get_by_id("t5").unwrap().unwrap();
    assert_eq!(morning.genres, vec![UNSPECIFIED_GENRE]);
}

#[test]
fn test_shuffle_larger_than_pool_returns_permutation() {
    let (_tmp, catalog) = setup_catalog(five_tracks());

    let playlist = catalog.shuffled_playlist(10, None);
    assert_eq!(sorted_ids(&playlist), vec!["t1", "t2", "t3", "t4", "t5"]);

    let playlist = catalog.shuffled_playlist(5, Some(2005));
    assert_eq!(sorted_ids(&playlist), vec!["t4", "t5"]);

    assert!(catalog.shuffled_playlist(0, None).is_empty());
    assert!(catalog.shuffled_playlist(3, Some(1970)).is_empty());
}

#[test]
fn test_shuffle_from_large_pool() {
    let tracks: Vec<Track> = (0..2_000)
        .map(|i| {
            let year = if i % 2 == 0 { 2001 } else { 2002 };
            create_track(&format!("id{i}"), "Artist", "Album", &format!("Song {i}"), year, i, &["Pop"])
        })
        .collect();
    let (_tmp, catalog) = setup_catalog(tracks);

    let start = std::time::Instant::now();
    let playlist = catalog.shuffled_playlist(25, Some(2002));
    assert!(start.elapsed() < std::time::Duration::from_secs(2));

    assert!(playlist.len() <= 25);
    assert!(!playlist.is_empty());
    assert!(playlist.iter().all(|t| t.year == 2002));
    let distinct: HashSet<&str> = playlist.iter().map(|t| t.track_id.as_str()).collect();
    assert_eq!(distinct.len(), playlist.len());
}

#[test]
fn test_rebuild_twice_equals_once() {
    let (_tmp, catalog) = setup_catalog(five_tracks());
    let first = catalog.search(Some("*"), &SearchFilters::none(), SortOrder::Default);
    let first_genres = catalog.genres();

    let stats = catalog.rebuild(&mut VecSource::new(five_tracks())).unwrap();
    assert_eq!(stats.indexed, 5);

    let second = catalog.search(Some("*"), &SearchFilters::none(), SortOrder::Default);
    assert_eq!(first, second);
    assert_eq!(first_genres, catalog.genres());
    assert_eq!(catalog.store().doc_count(), 5);
}

#[test]
fn test_malformed_records_are_skipped() {
    let mut blank_id = create_track("x", "A", "B", "C", 2001, 1, &["Rock"]);
    blank_id.track_id = String::new();
    let mut tracks = five_tracks();
    tracks.push(blank_id);

    let (_tmp, catalog) = setup_catalog(Vec::new());
    let stats = catalog.rebuild(&mut VecSource::new(tracks)).unwrap();
    assert_eq!(stats.indexed, 5);
    assert_eq!(stats.skipped, 1);
    assert_eq!(catalog.store().doc_count(), 5);
}

#[test]
fn test_json_lines_feed() {
    let mut feed = NamedTempFile::new().unwrap();
    for track in five_tracks() {
        writeln!(feed, "{}", serde_json::to_string(&track).unwrap()).unwrap();
    }
    writeln!(feed, "{{\"trackId\": 12").unwrap();
    feed.flush().unwrap();

    let tmp = TempDir::new().unwrap();
    let catalog = TrackCatalog::open(CatalogConfig::new(tmp.path())).unwrap();
    let stats = catalog
        .prepare(&mut JsonLinesSource::new(feed.path()))
        .unwrap()
        .unwrap();
    assert_eq!(stats.indexed, 5);
    assert_eq!(stats.skipped, 1);

    // Same feed again: nothing to do
    assert!(catalog
        .prepare(&mut JsonLinesSource::new(feed.path()))
        .unwrap()
        .is_none());
}

#[test]
fn test_json_lines_row_with_bad_encoding_is_skipped() {
    let tracks = five_tracks();
    let mut feed = NamedTempFile::new().unwrap();
    writeln!(feed, "{}", serde_json::to_string(&tracks[0]).unwrap()).unwrap();
    feed.write_all(b"{\"trackName\":\"\xff\xfe\"}\n").unwrap();
    writeln!(feed, "{}", serde_json::to_string(&tracks[1]).unwrap()).unwrap();
    feed.flush().unwrap();

    let tmp = TempDir::new().unwrap();
    let catalog = TrackCatalog::open(CatalogConfig::new(tmp.path())).unwrap();
    let stats = catalog.rebuild(&mut JsonLinesSource::new(feed.path())).unwrap();
    assert_eq!(stats.indexed, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(catalog.get_by_id("t2").unwrap().unwrap(), tracks[1]);
}

#[test]
fn test_prepare_on_reopen() {
    let tmp = TempDir::new().unwrap();
    {
        let catalog = TrackCatalog::open(CatalogConfig::new(tmp.path())).unwrap();
        assert!(catalog.prepare(&mut VecSource::new(five_tracks())).unwrap().is_some());
        catalog.close().unwrap();
    }

    let catalog = TrackCatalog::open(CatalogConfig::new(tmp.path())).unwrap();
    assert_eq!(catalog.genres().len(), 4);
    assert!(catalog.prepare(&mut VecSource::new(five_tracks())).unwrap().is_none());
    assert_eq!(catalog.get_by_id("t2").unwrap().unwrap().track_name, "Example Song");

    // A changed feed is picked up
    let mut changed = five_tracks();
    changed.pop();
    let stats = catalog.prepare(&mut VecSource::new(changed)).unwrap().unwrap();
    assert_eq!(stats.indexed, 4);
    assert_eq!(catalog.store().doc_count(), 4);
}

#[test]
fn test_second_open_is_lock_held() {
    let (tmp, _catalog) = setup_catalog(five_tracks());

    match TrackCatalog::open(CatalogConfig::new(tmp.path())) {
        Err(e @ CatalogError::LockHeld(_)) => assert!(e.is_fatal()),
        Err(other) => panic!("expected LockHeld, got {other}"),
        Ok(_) => panic!("second open should fail"),
    }
}
