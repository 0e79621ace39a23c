//! Anime repository trait and implementation

use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

use crate::error::{LibraryError, Result};
use crate::models::{Anime, AnimeType};

/// Anime repository interface for data access operations
#[async_trait]
pub trait AnimeRepository: Send + Sync {
    /// Find an anime by its ANN id
    ///
    /// # Returns
    /// - `Ok(Some(anime))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, ann_id: i64) -> Result<Option<Anime>>;

    /// Insert a new anime with its alternative names
    ///
    /// # Errors
    /// Returns error if:
    /// - Anime with same ANN id already exists
    /// - Anime validation fails
    /// - Database error occurs
    async fn insert(&self, anime: &Anime) -> Result<()>;

    /// Count total anime
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of AnimeRepository
pub struct SqliteAnimeRepository {
    pool: SqlitePool,
}

impl SqliteAnimeRepository {
    /// Create a new SqliteAnimeRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

type AnimeRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

#[async_trait]
impl AnimeRepository for SqliteAnimeRepository {
    async fn find_by_id(&self, ann_id: i64) -> Result<Option<Anime>> {
        let row: Option<AnimeRow> = query_as(
            r#"
            SELECT ann_id, expand_name, jp_name, en_name, season, anime_type
            FROM anime
            WHERE ann_id = ?
            "#,
        )
        .bind(ann_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((ann_id, expand_name, jp_name, en_name, season, anime_type)) = row else {
            return Ok(None);
        };

        let alt_names: Vec<(String,)> =
            query_as("SELECT name FROM anime_alt_names WHERE ann_id = ? ORDER BY position")
                .bind(ann_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(Anime {
            ann_id,
            expand_name,
            jp_name,
            en_name,
            alt_names: alt_names.into_iter().map(|(name,)| name).collect(),
            season,
            anime_type: anime_type
                .as_deref()
                .map(str::parse::<AnimeType>)
                .transpose()?,
        }))
    }

    async fn insert(&self, anime: &Anime) -> Result<()> {
        // Validate before insertion
        anime.validate().map_err(|e| LibraryError::InvalidInput {
            field: "Anime".to_string(),
            message: e,
        })?;

        let mut tx = self.pool.begin().await?;

        query(
            r#"
            INSERT INTO anime (ann_id, expand_name, jp_name, en_name, season, anime_type)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(anime.ann_id)
        .bind(&anime.expand_name)
        .bind(&anime.jp_name)
        .bind(&anime.en_name)
        .bind(&anime.season)
        .bind(anime.anime_type.map(|anime_type| anime_type.as_str()))
        .execute(&mut *tx)
        .await?;

        for (position, name) in anime.alt_names.iter().enumerate() {
            query("INSERT INTO anime_alt_names (ann_id, position, name) VALUES (?, ?, ?)")
                .bind(anime.ann_id)
                .bind(position as i64)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM anime")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
