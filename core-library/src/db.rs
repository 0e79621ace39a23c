//! # Catalog Database
//!
//! Opens the SQLite file holding the song catalog.
//!
//! The catalog is written once by an import and then only read by searches,
//! so a pool is small: WAL lets every connection read while an import runs,
//! and foreign keys keep songs tied to their anime. Opening a pool applies
//! the embedded migrations and then checks that every catalog table is
//! present before any repository touches it.
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("catalog.db")).await?;
//! let graph = SqliteArtistRepository::new(pool.clone()).load_graph().await?;
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::{LibraryError, Result};

/// Tables the repositories read, in dependency order.
pub const CATALOG_TABLES: [&str; 9] = [
    "artists",
    "artist_names",
    "artist_groups",
    "line_ups",
    "line_up_members",
    "anime",
    "anime_alt_names",
    "songs",
    "song_credits",
];

/// Where the catalog lives and how many readers may share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// A catalog file, created and migrated if missing.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_url: format!("sqlite:{}", database_path.into().display()),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// A private in-memory catalog.
    ///
    /// Each SQLite connection to `:memory:` is its own database, so the pool
    /// holds exactly one.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

/// Row counts of the main catalog tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub artists: i64,
    pub anime: i64,
    pub songs: i64,
}

impl CatalogStats {
    pub fn is_empty(&self) -> bool {
        self.artists == 0 && self.anime == 0 && self.songs == 0
    }
}

/// Opens, migrates and verifies a catalog pool.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a migration fails, or a
/// catalog table is missing afterwards.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool> {
    info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "Opening catalog database"
    );

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true)
        // Candidate fetches scan songs joined with anime.
        .pragma("cache_size", "-64000")
        .pragma("temp_store", "memory");

    // In-memory pools must never drop their only connection.
    let (max_lifetime, idle_timeout) = if config.is_in_memory() {
        (None, None)
    } else {
        (
            Some(Duration::from_secs(1800)),
            Some(Duration::from_secs(600)),
        )
    };

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(max_lifetime)
        .idle_timeout(idle_timeout)
        .connect_with(options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open catalog database");
            LibraryError::Database(e)
        })?;

    run_migrations(&pool).await?;
    let stats = verify_schema(&pool).await?;
    if stats.is_empty() {
        warn!("Catalog database is empty");
    }

    Ok(pool)
}

/// In-memory catalog with the schema applied.
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_pool(DatabaseConfig::in_memory()).await
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Catalog migration failed");
            LibraryError::Migration(e.to_string())
        })?;

    debug!("Catalog migrations applied");
    Ok(())
}

/// Checks that every catalog table exists and returns the main row counts.
///
/// # Errors
///
/// Returns [`LibraryError::Migration`] naming the first missing table.
pub async fn verify_schema(pool: &SqlitePool) -> Result<CatalogStats> {
    let present: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?;

    if let Some(missing) = CATALOG_TABLES
        .iter()
        .find(|table| !present.iter().any(|(name,)| name == *table))
    {
        return Err(LibraryError::Migration(format!(
            "catalog table {missing} is missing"
        )));
    }

    let (artists, anime, songs): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT (SELECT COUNT(*) FROM artists),
               (SELECT COUNT(*) FROM anime),
               (SELECT COUNT(*) FROM songs)
        "#,
    )
    .fetch_one(pool)
    .await?;

    let stats = CatalogStats {
        artists,
        anime,
        songs,
    };
    info!(artists, anime, songs, "Catalog schema verified");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_url() {
        let config = DatabaseConfig::new("/srv/catalog/songs.db");
        assert_eq!(config.database_url, "sqlite:/srv/catalog/songs.db");
        assert!(!config.is_in_memory());
        assert!(DatabaseConfig::in_memory().is_in_memory());
        assert_eq!(DatabaseConfig::in_memory().max_connections, 1);
    }

    #[tokio::test]
    async fn test_fresh_catalog_is_verified_and_empty() {
        let pool = create_test_pool().await.unwrap();
        let stats = verify_schema(&pool).await.unwrap();
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn test_stats_count_catalog_rows() {
        let pool = create_test_pool().await.unwrap();
        sqlx::query("INSERT INTO artists (id) VALUES (1), (2)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO anime (ann_id, expand_name) VALUES (100, 'Bakemonogatari')")
            .execute(&pool)
            .await
            .unwrap();

        let stats = verify_schema(&pool).await.unwrap();
        assert_eq!(
            stats,
            CatalogStats {
                artists: 2,
                anime: 1,
                songs: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_table_fails_verification() {
        let pool = create_test_pool().await.unwrap();
        sqlx::query("DROP TABLE song_credits")
            .execute(&pool)
            .await
            .unwrap();

        let err = verify_schema(&pool).await.unwrap_err();
        assert!(matches!(err, LibraryError::Migration(ref message) if message.contains("song_credits")));
    }

    #[tokio::test]
    async fn test_songs_require_their_anime() {
        let pool = create_test_pool().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO songs (ann_song_id, ann_id, song_id, song_type, song_number, song_name, song_artist) \
             VALUES (1, 999, 1, 1, 1, 'Orphan', 'Nobody')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err(), "foreign keys should reject songs of unknown anime");
    }
}
