//! `SearchService` against a mocked song repository.

use std::sync::Arc;

use async_trait::async_trait;
use core_artists::{ArtistGraph, ArtistRef, GroupMembership, LineUpRef, SongCredits};
use core_library::{
    Anime, CatalogEntry, CatalogSong, LibraryError, SongFilter, SongRepository,
};
use core_service::{
    AnnIdSearch, ArtistId, ArtistSearch, CombinationLogic, CreditType, CreditTypes, GlobalSearch,
    MatchPolicy, SearchFilters, SearchService, SearchSettings, SongCategory, SongType, TextSearch,
};
use mockall::mock;

mock! {
    pub SongRepo {}

    #[async_trait]
    impl SongRepository for SongRepo {
        async fn find_song_ids_by_artists(
            &self,
            artist_ids: &[ArtistId],
            credit_types: CreditTypes,
        ) -> core_library::Result<Vec<i64>>;
        async fn find_candidates(&self, filter: &SongFilter) -> core_library::Result<Vec<CatalogEntry>>;
        async fn insert(&self, song: &CatalogSong) -> core_library::Result<()>;
        async fn count(&self) -> core_library::Result<i64>;
    }
}

const KANA: i64 = 1;
const AYANE: i64 = 2;
const YUI: i64 = 3;
const UNIT: i64 = 10;

fn vocalist(id: i64) -> GroupMembership {
    GroupMembership::new(id, CreditType::Vocalist, LineUpRef::Solo)
}

/// Unit 10 = {1, 2, 3}.
fn graph() -> ArtistGraph {
    let mut builder = ArtistGraph::builder();
    builder.add_artist(KANA, vec!["Kana Hanazawa".to_string()]).unwrap();
    builder.add_artist(AYANE, vec!["Ayane Sakura".to_string()]).unwrap();
    builder.add_artist(YUI, vec!["Yui Ogura".to_string()]).unwrap();
    builder.add_artist(UNIT, vec!["Petit Rabbit's".to_string()]).unwrap();
    for id in [KANA, AYANE, YUI] {
        builder
            .add_group(
                id,
                GroupMembership::new(UNIT, CreditType::Vocalist, LineUpRef::Index(0)),
            )
            .unwrap();
    }
    builder
        .add_line_up(UNIT, 0, vec![vocalist(KANA), vocalist(AYANE), vocalist(YUI)])
        .unwrap();
    builder.build()
}

fn entry(ann_song_id: i64, name: &str, vocalists: Vec<ArtistRef>) -> CatalogEntry {
    CatalogEntry {
        anime: Anime::new(100, "Gochuumon wa Usagi desu ka?"),
        song: CatalogSong {
            ann_song_id,
            ann_id: 100,
            song_id: ann_song_id,
            song_type: SongType::Opening,
            song_number: 1,
            name: name.to_string(),
            artist: "Petit Rabbit's".to_string(),
            difficulty: Some(40.0),
            category: SongCategory::Standard,
            hq: None,
            mq: None,
            audio: None,
            credits: SongCredits {
                vocalists,
                ..SongCredits::default()
            },
        },
    }
}

fn service(repo: MockSongRepo, settings: SearchSettings) -> SearchService {
    SearchService::new(Arc::new(graph()), Arc::new(repo), settings)
}

#[tokio::test]
async fn test_unknown_artist_id_is_not_found() {
    let mut repo = MockSongRepo::new();
    repo.expect_find_song_ids_by_artists().never();
    repo.expect_find_candidates().never();

    let err = service(repo, SearchSettings::default())
        .search_by_artist(&ArtistSearch::by_ids([ArtistId(404)]))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_unmatched_name_is_empty_without_queries() {
    let mut repo = MockSongRepo::new();
    repo.expect_find_song_ids_by_artists().never();
    repo.expect_find_candidates().never();

    let results = service(repo, SearchSettings::default())
        .search_by_artist(&ArtistSearch::by_name("nobody at all", true))
        .await
        .unwrap();

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_artist_search_prefilters_then_evaluates() {
    let mut repo = MockSongRepo::new();
    repo.expect_find_song_ids_by_artists()
        .withf(|ids, credit_types| {
            ids == [ArtistId(AYANE), ArtistId(UNIT)] && *credit_types == CreditTypes::all()
        })
        .times(1)
        .returning(|_, _| Ok(vec![1, 2, 3]));
    repo.expect_find_candidates()
        .withf(|filter| filter.song_ids == Some(vec![1, 2, 3]) && filter.limit.is_none())
        .times(1)
        .returning(|_| {
            Ok(vec![
                entry(1, "Daydream café", vec![ArtistRef::line_up(UNIT, 0)]),
                entry(2, "Solo", vec![ArtistRef::solo(AYANE)]),
                entry(3, "Duet", vec![ArtistRef::solo(AYANE), ArtistRef::solo(KANA)]),
            ])
        });

    let search = ArtistSearch::by_name("sakura ayane", true).with_policy(MatchPolicy {
        max_other_artists: 0,
        ..MatchPolicy::default()
    });
    let results = service(repo, SearchSettings::default())
        .search_by_artist(&search)
        .await
        .unwrap();

    let names: Vec<&str> = results.songs.iter().map(|s| s.song_name.as_str()).collect();
    assert_eq!(names, vec!["Solo"]);
    assert_eq!(results.songs[0].song_type, "Opening 1");
    assert_eq!(results.anime.len(), 1);
    assert_eq!(results.artists.len(), 1);
    assert_eq!(results.artists[0].artist_id, ArtistId(AYANE));
}

#[tokio::test]
async fn test_artist_search_suppresses_duplicates_after_matching() {
    let mut repo = MockSongRepo::new();
    repo.expect_find_song_ids_by_artists()
        .returning(|_, _| Ok(vec![1, 2]));
    repo.expect_find_candidates()
        .withf(|filter| !filter.ignore_duplicates)
        .returning(|_| {
            Ok(vec![
                entry(1, "Same", vec![ArtistRef::solo(KANA), ArtistRef::solo(AYANE)]),
                entry(2, "Same", vec![ArtistRef::solo(KANA)]),
            ])
        });

    let search = ArtistSearch::by_ids([ArtistId(KANA)])
        .with_policy(MatchPolicy {
            max_other_artists: 0,
            ..MatchPolicy::default()
        })
        .with_filters(SearchFilters {
            ignore_duplicates: true,
            ..SearchFilters::default()
        });
    let results = service(repo, SearchSettings::default())
        .search_by_artist(&search)
        .await
        .unwrap();

    assert_eq!(results.songs.len(), 1);
    assert_eq!(results.songs[0].ann_song_id, 2);
}

#[tokio::test]
async fn test_text_searches_are_capped() {
    let mut repo = MockSongRepo::new();
    repo.expect_find_candidates()
        .withf(|filter| {
            filter.limit == Some(5)
                && filter.song_name.as_ref().is_some_and(|p| p.is_match("Daydream café"))
                && filter.anime_name.is_none()
        })
        .times(1)
        .returning(|_| Ok(vec![entry(1, "Daydream café", Vec::new())]));

    let settings = SearchSettings {
        max_results_per_search: Some(5),
        ..SearchSettings::default()
    };
    let results = service(repo, settings)
        .search_by_song_name(&TextSearch::new("daydream cafe", true))
        .await
        .unwrap();

    assert_eq!(results.songs.len(), 1);
}

#[tokio::test]
async fn test_ann_id_search_passes_ids_through() {
    let mut repo = MockSongRepo::new();
    repo.expect_find_candidates()
        .withf(|filter| filter.ann_ids == Some(vec![100, 200]))
        .times(1)
        .returning(|_| Ok(vec![entry(1, "A", Vec::new())]));

    let results = service(repo, SearchSettings::default())
        .search_by_ann_ids(&AnnIdSearch {
            ann_ids: vec![100, 200],
            filters: SearchFilters::default(),
        })
        .await
        .unwrap();

    assert_eq!(results.anime[0].ann_id, 100);
}

#[tokio::test]
async fn test_global_search_combines_sub_searches() {
    let mut repo = MockSongRepo::new();
    repo.expect_find_candidates()
        .withf(|filter| filter.anime_name.is_some())
        .returning(|_| Ok(vec![entry(1, "A", Vec::new()), entry(2, "B", Vec::new())]));
    repo.expect_find_candidates()
        .withf(|filter| filter.song_name.is_some())
        .returning(|_| Ok(vec![entry(2, "B", Vec::new()), entry(3, "C", Vec::new())]));

    let service = service(repo, SearchSettings::default());
    let mut search = GlobalSearch {
        anime_searches: vec![TextSearch::new("usagi", true)],
        song_name_searches: vec![TextSearch::new("b", true)],
        ..GlobalSearch::default()
    };

    let union = service.search_global(&search).await.unwrap();
    let mut ids: Vec<i64> = union.songs.iter().map(|s| s.ann_song_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);

    search.combination_logic = CombinationLogic::And;
    let intersection = service.search_global(&search).await.unwrap();
    let ids: Vec<i64> = intersection.songs.iter().map(|s| s.ann_song_id).collect();
    assert_eq!(ids, vec![2]);
    assert_eq!(intersection.anime.len(), 1);
}

#[tokio::test]
async fn test_global_and_without_sub_searches_is_empty() {
    let mut repo = MockSongRepo::new();
    repo.expect_find_candidates().never();

    let search = GlobalSearch {
        combination_logic: CombinationLogic::And,
        ..GlobalSearch::default()
    };
    let results = service(repo, SearchSettings::default())
        .search_global(&search)
        .await
        .unwrap();

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_repository_errors_propagate() {
    let mut repo = MockSongRepo::new();
    repo.expect_find_candidates()
        .returning(|_| Err(LibraryError::InvalidData("corrupt row".to_string())));

    let err = service(repo, SearchSettings::default())
        .search_by_anime_name(&TextSearch::new("usagi", true))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("corrupt row"));
}
