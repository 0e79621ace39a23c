//! # Catalog Storage Module
//!
//! Owns the song catalog database and provides repositories for it.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema and migrations for artists, anime, songs and credits
//! - Loading the artist snapshot into a [`core_artists::ArtistGraph`]
//! - The coarse candidate fetch behind every search ([`SongFilter`])
//!
//! Exact artist matching and fuzzy name filtering happen in memory with
//! `core-artists`; this crate only hands rows over.

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{
    suppress_duplicates, Anime, AnimeType, CatalogEntry, CatalogSong, DifficultyRange,
    SongCategory, SongFilter, SongType,
};
pub use repositories::{
    AnimeRepository, ArtistRepository, SongRepository, SqliteAnimeRepository,
    SqliteArtistRepository, SqliteSongRepository,
};
