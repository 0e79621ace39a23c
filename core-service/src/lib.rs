//! Catalog search façade.
//!
//! [`SearchService`] owns the artist snapshot loaded at startup and the song
//! repository, and answers artist, anime-name, song-name, song-artist, ANN id
//! and combined searches with a [`SearchResults`] envelope.

pub mod error;
pub mod params;
pub mod results;
pub mod search;

pub use error::{CoreError, Result};
pub use params::{
    AnimeSearch, AnnIdSearch, ArtistSearch, ArtistTarget, GlobalSearch, SearchFilters,
    SongArtistSearch, SongNameSearch, TextSearch,
};
pub use results::{AnimeEntry, ArtistEntry, SearchResults, SongEntry};
pub use search::{SearchService, SearchSettings};

pub use core_artists::{ArtistId, CombinationLogic, CreditType, CreditTypes, MatchPolicy};
pub use core_library::{AnimeType, DifficultyRange, SongCategory, SongType};
pub use core_runtime::config::CoreConfig;
