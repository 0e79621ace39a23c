//! Search requests accepted by [`crate::SearchService`].

use core_artists::{ArtistId, CombinationLogic, MatchPolicy};
use core_library::{AnimeType, DifficultyRange, SongCategory, SongFilter, SongType};
use serde::{Deserialize, Serialize};

fn partial_by_default() -> bool {
    true
}

/// Row filters shared by every search kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Keep one song per (song name, song artist).
    pub ignore_duplicates: bool,
    pub song_types: Vec<SongType>,
    pub song_categories: Vec<SongCategory>,
    pub difficulty: DifficultyRange,
    /// `None` accepts every anime type, including unknown ones.
    pub anime_types: Option<Vec<AnimeType>>,
    pub anime_seasons: Option<Vec<String>>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            ignore_duplicates: false,
            song_types: SongType::ALL.to_vec(),
            song_categories: SongCategory::ALL.to_vec(),
            difficulty: DifficultyRange::full(),
            anime_types: None,
            anime_seasons: None,
        }
    }
}

impl SearchFilters {
    pub(crate) fn to_song_filter(&self) -> SongFilter {
        SongFilter {
            song_types: self.song_types.clone(),
            categories: self.song_categories.clone(),
            difficulty: self.difficulty,
            anime_types: self.anime_types.clone(),
            anime_seasons: self.anime_seasons.clone(),
            ignore_duplicates: self.ignore_duplicates,
            ..SongFilter::default()
        }
    }
}

/// Who an artist search is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtistTarget {
    /// Known artist ids; every id must exist in the snapshot.
    Ids(Vec<ArtistId>),
    /// Free-text name resolved against every artist name.
    Name {
        query: String,
        #[serde(default = "partial_by_default")]
        partial_match: bool,
    },
}

/// Songs credited to an artist, its groups or its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistSearch {
    pub target: ArtistTarget,
    #[serde(default)]
    pub policy: MatchPolicy,
    #[serde(default)]
    pub filters: SearchFilters,
}

impl ArtistSearch {
    pub fn by_ids(ids: impl IntoIterator<Item = ArtistId>) -> Self {
        Self {
            target: ArtistTarget::Ids(ids.into_iter().collect()),
            policy: MatchPolicy::default(),
            filters: SearchFilters::default(),
        }
    }

    pub fn by_name(query: impl Into<String>, partial_match: bool) -> Self {
        Self {
            target: ArtistTarget::Name {
                query: query.into(),
                partial_match,
            },
            policy: MatchPolicy::default(),
            filters: SearchFilters::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// A fuzzy text query with its row filters.
///
/// Used for anime names, song names and the catalog song-artist text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSearch {
    pub query: String,
    #[serde(default = "partial_by_default")]
    pub partial_match: bool,
    #[serde(default)]
    pub filters: SearchFilters,
}

impl TextSearch {
    pub fn new(query: impl Into<String>, partial_match: bool) -> Self {
        Self {
            query: query.into(),
            partial_match,
            filters: SearchFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }
}

pub type AnimeSearch = TextSearch;
pub type SongNameSearch = TextSearch;
pub type SongArtistSearch = TextSearch;

/// Songs of the given ANN anime ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnIdSearch {
    pub ann_ids: Vec<i64>,
    #[serde(default)]
    pub filters: SearchFilters,
}

/// Independent sub-searches combined over their songs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSearch {
    pub anime_searches: Vec<AnimeSearch>,
    pub song_name_searches: Vec<SongNameSearch>,
    pub song_artist_searches: Vec<SongArtistSearch>,
    pub artist_searches: Vec<ArtistSearch>,
    pub combination_logic: CombinationLogic,
}

impl GlobalSearch {
    pub fn len(&self) -> usize {
        self.anime_searches.len()
            + self.song_name_searches.len()
            + self.song_artist_searches.len()
            + self.artist_searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
