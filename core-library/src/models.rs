//! Domain models for the song catalog
//!
//! Rows handed to the search engine, with validation and the string codes
//! used in the database.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use core_artists::{FuzzyPattern, SongCredits};
use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

// =============================================================================
// Anime
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimeType {
    #[serde(rename = "TV")]
    Tv,
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "OVA")]
    Ova,
    #[serde(rename = "ONA")]
    Ona,
    #[serde(rename = "special")]
    Special,
}

impl AnimeType {
    pub const ALL: [AnimeType; 5] = [
        AnimeType::Tv,
        AnimeType::Movie,
        AnimeType::Ova,
        AnimeType::Ona,
        AnimeType::Special,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimeType::Tv => "TV",
            AnimeType::Movie => "movie",
            AnimeType::Ova => "OVA",
            AnimeType::Ona => "ONA",
            AnimeType::Special => "special",
        }
    }
}

impl fmt::Display for AnimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimeType {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        AnimeType::ALL
            .into_iter()
            .find(|anime_type| anime_type.as_str() == s)
            .ok_or_else(|| LibraryError::InvalidData(format!("unknown anime type {s:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub ann_id: i64,
    /// Display name, always present; used when a language name is missing.
    pub expand_name: String,
    pub jp_name: Option<String>,
    pub en_name: Option<String>,
    pub alt_names: Vec<String>,
    /// e.g. "Winter 2019"
    pub season: Option<String>,
    pub anime_type: Option<AnimeType>,
}

impl Anime {
    pub fn new(ann_id: i64, expand_name: impl Into<String>) -> Self {
        Self {
            ann_id,
            expand_name: expand_name.into(),
            jp_name: None,
            en_name: None,
            alt_names: Vec::new(),
            season: None,
            anime_type: None,
        }
    }

    /// Every name the anime may be searched by.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.expand_name.as_str())
            .chain(self.jp_name.as_deref())
            .chain(self.en_name.as_deref())
            .chain(self.alt_names.iter().map(String::as_str))
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.expand_name.trim().is_empty() {
            return Err("Anime name cannot be empty".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Songs
// =============================================================================

/// Where a song plays in its anime. Stored as 1, 2 and 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongType {
    Opening,
    Ending,
    Insert,
}

impl SongType {
    pub const ALL: [SongType; 3] = [SongType::Opening, SongType::Ending, SongType::Insert];

    pub fn code(&self) -> i64 {
        match self {
            SongType::Opening => 1,
            SongType::Ending => 2,
            SongType::Insert => 3,
        }
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(SongType::Opening),
            2 => Ok(SongType::Ending),
            3 => Ok(SongType::Insert),
            other => Err(LibraryError::InvalidData(format!("unknown song type {other}"))),
        }
    }

    /// "Opening 1", "Ending 3" or "Insert Song"; insert songs are not numbered.
    pub fn label(&self, number: u32) -> String {
        match self {
            SongType::Opening => format!("Opening {number}"),
            SongType::Ending => format!("Ending {number}"),
            SongType::Insert => "Insert Song".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SongCategory {
    Standard,
    Chanting,
    Character,
    Instrumental,
}

impl SongCategory {
    pub const ALL: [SongCategory; 4] = [
        SongCategory::Standard,
        SongCategory::Chanting,
        SongCategory::Character,
        SongCategory::Instrumental,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SongCategory::Standard => "Standard",
            SongCategory::Chanting => "Chanting",
            SongCategory::Character => "Character",
            SongCategory::Instrumental => "Instrumental",
        }
    }
}

impl fmt::Display for SongCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SongCategory {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        SongCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| LibraryError::InvalidData(format!("unknown song category {s:?}")))
    }
}

/// Inclusive guess-rate range, 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyRange {
    min: u8,
    max: u8,
}

impl DifficultyRange {
    pub const LOWEST: u8 = 0;
    pub const HIGHEST: u8 = 100;

    pub fn new(min: u8, max: u8) -> Result<Self> {
        if max > Self::HIGHEST {
            return Err(LibraryError::InvalidInput {
                field: "difficulty".to_string(),
                message: format!("max must be at most {}", Self::HIGHEST),
            });
        }
        if min >= max {
            return Err(LibraryError::InvalidInput {
                field: "difficulty".to_string(),
                message: "min must be lower than max".to_string(),
            });
        }
        Ok(Self { min, max })
    }

    pub fn full() -> Self {
        Self {
            min: Self::LOWEST,
            max: Self::HIGHEST,
        }
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn is_full(&self) -> bool {
        *self == Self::full()
    }

    pub fn contains(&self, difficulty: f64) -> bool {
        difficulty >= f64::from(self.min) && difficulty <= f64::from(self.max)
    }
}

impl Default for DifficultyRange {
    fn default() -> Self {
        Self::full()
    }
}

/// One appearance of a song in an anime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSong {
    pub ann_song_id: i64,
    pub ann_id: i64,
    /// Catalog-wide song identity; credits hang off it.
    pub song_id: i64,
    pub song_type: SongType,
    pub song_number: u32,
    pub name: String,
    /// Credited artist as printed.
    pub artist: String,
    pub difficulty: Option<f64>,
    pub category: SongCategory,
    pub hq: Option<String>,
    pub mq: Option<String>,
    pub audio: Option<String>,
    pub credits: SongCredits,
}

impl CatalogSong {
    pub fn type_label(&self) -> String {
        self.song_type.label(self.song_number)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Song name cannot be empty".to_string());
        }
        if let Some(difficulty) = self.difficulty {
            if !(0.0..=100.0).contains(&difficulty) {
                return Err(format!("Difficulty {difficulty} is outside 0-100"));
            }
        }
        Ok(())
    }
}

/// A candidate row: the song and the anime it plays in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub anime: Anime,
    pub song: CatalogSong,
}

/// Keeps the first entry of each (song name, song artist) pair.
pub fn suppress_duplicates(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert((entry.song.name.clone(), entry.song.artist.clone())))
        .collect()
}

// =============================================================================
// Candidate filter
// =============================================================================

/// Coarse filter of a candidate fetch.
///
/// `None` lists do not filter; an empty list selects nothing. Fuzzy
/// patterns are evaluated in memory after the SQL fetch.
#[derive(Debug, Clone)]
pub struct SongFilter {
    pub ann_ids: Option<Vec<i64>>,
    pub song_ids: Option<Vec<i64>>,
    pub song_types: Vec<SongType>,
    pub categories: Vec<SongCategory>,
    pub difficulty: DifficultyRange,
    pub anime_types: Option<Vec<AnimeType>>,
    pub anime_seasons: Option<Vec<String>>,
    /// Matched against every name of the anime.
    pub anime_name: Option<FuzzyPattern>,
    pub song_name: Option<FuzzyPattern>,
    pub song_artist: Option<FuzzyPattern>,
    pub ignore_duplicates: bool,
    pub limit: Option<usize>,
}

impl Default for SongFilter {
    fn default() -> Self {
        Self {
            ann_ids: None,
            song_ids: None,
            song_types: SongType::ALL.to_vec(),
            categories: SongCategory::ALL.to_vec(),
            difficulty: DifficultyRange::full(),
            anime_types: None,
            anime_seasons: None,
            anime_name: None,
            song_name: None,
            song_artist: None,
            ignore_duplicates: false,
            limit: None,
        }
    }
}

impl SongFilter {
    /// True when some list filter leaves nothing to select.
    pub fn selects_nothing(&self) -> bool {
        self.song_types.is_empty()
            || self.categories.is_empty()
            || self.limit == Some(0)
            || self.ann_ids.as_ref().is_some_and(Vec::is_empty)
            || self.song_ids.as_ref().is_some_and(Vec::is_empty)
            || self.anime_types.as_ref().is_some_and(Vec::is_empty)
            || self.anime_seasons.as_ref().is_some_and(Vec::is_empty)
    }

    /// True when rows need in-memory filtering after the SQL fetch.
    pub fn has_text_patterns(&self) -> bool {
        self.anime_name.is_some() || self.song_name.is_some() || self.song_artist.is_some()
    }

    /// Applies the fuzzy patterns to an assembled entry.
    pub fn matches_text(&self, entry: &CatalogEntry) -> bool {
        self.anime_name
            .as_ref()
            .map_or(true, |pattern| pattern.matches_any(entry.anime.names()))
            && self
                .song_name
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(&entry.song.name))
            && self
                .song_artist
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(&entry.song.artist))
    }
}
