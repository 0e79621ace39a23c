//! # Repository Pattern Implementation
//!
//! Repository traits and SQLite implementations for the catalog.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//!
//! ## Available Repositories
//!
//! - `ArtistRepository` - Artists, group memberships and line-ups; loads the snapshot
//! - `SongRepository` - Song appearances with per-role credits; candidate fetches
//! - `AnimeRepository` - Anime with their alternative names

pub mod anime;
pub mod artist;
pub mod song;

pub use anime::{AnimeRepository, SqliteAnimeRepository};
pub use artist::{ArtistRepository, SqliteArtistRepository};
pub use song::{SongRepository, SqliteSongRepository};
