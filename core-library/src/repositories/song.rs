//! Song repository trait and implementation
//!
//! Serves the two storage phases of a search: the coarse prefilter over
//! song credits, and the candidate fetch described by a [`SongFilter`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use core_artists::{ArtistId, ArtistRef, CreditType, CreditTypes, LineUpRef, SongCredits};
use sqlx::{query, query_as, FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};

use crate::error::{LibraryError, Result};
use crate::models::{
    suppress_duplicates, Anime, AnimeType, CatalogEntry, CatalogSong, SongCategory, SongFilter, SongType,
};

/// Keeps `IN (...)` lists well under SQLite's bound parameter limit.
const MAX_BIND_PARAMS: usize = 900;

/// Song repository interface for data access operations
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Ids of the songs crediting any of `artist_ids` under one of `credit_types`
    async fn find_song_ids_by_artists(
        &self,
        artist_ids: &[ArtistId],
        credit_types: CreditTypes,
    ) -> Result<Vec<i64>>;

    /// Songs matching `filter`, with their anime and credits, ordered by ANN song id
    async fn find_candidates(&self, filter: &SongFilter) -> Result<Vec<CatalogEntry>>;

    /// Insert a song appearance; its credits replace any stored for the same song id
    ///
    /// # Errors
    /// Returns error if:
    /// - Song validation fails
    /// - The anime does not exist
    /// - Database error occurs
    async fn insert(&self, song: &CatalogSong) -> Result<()>;

    /// Count total song appearances
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of SongRepository
pub struct SqliteSongRepository {
    pool: SqlitePool,
    skipped_credits: AtomicU64,
}

impl SqliteSongRepository {
    /// Create a new SqliteSongRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            skipped_credits: AtomicU64::new(0),
        }
    }

    /// Credit rows dropped so far because their role or line-up id is malformed.
    pub fn skipped_credit_count(&self) -> u64 {
        self.skipped_credits.load(Ordering::Relaxed)
    }

    fn skip_credit(&self, song_id: i64, role: &str, line_up_id: i64, reason: &str) {
        self.skipped_credits.fetch_add(1, Ordering::Relaxed);
        warn!(
            song_id,
            role_type = role,
            line_up_id,
            reason,
            "Skipping malformed song credit"
        );
    }

    async fn load_alt_names(&self, ann_ids: &[i64]) -> Result<HashMap<i64, Vec<String>>> {
        let mut alt_names: HashMap<i64, Vec<String>> = HashMap::new();
        for chunk in ann_ids.chunks(MAX_BIND_PARAMS) {
            let mut builder =
                QueryBuilder::<Sqlite>::new("SELECT ann_id, name FROM anime_alt_names WHERE ann_id IN (");
            push_list(&mut builder, chunk.iter().copied());
            builder.push(" ORDER BY ann_id, position");

            let rows: Vec<(i64, String)> = builder.build_query_as().fetch_all(&self.pool).await?;
            for (ann_id, name) in rows {
                alt_names.entry(ann_id).or_default().push(name);
            }
        }
        Ok(alt_names)
    }

    async fn load_credits(&self, song_ids: &[i64]) -> Result<HashMap<i64, SongCredits>> {
        let mut credits: HashMap<i64, SongCredits> = HashMap::new();
        for chunk in song_ids.chunks(MAX_BIND_PARAMS) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "SELECT song_id, role_type, artist_id, line_up_id FROM song_credits WHERE song_id IN (",
            );
            push_list(&mut builder, chunk.iter().copied());
            builder.push(" ORDER BY song_id, role_type, position");

            let rows: Vec<(i64, String, i64, i64)> =
                builder.build_query_as().fetch_all(&self.pool).await?;
            for (song_id, role_type, artist_id, line_up_id) in rows {
                let role = match role_type.parse::<CreditType>() {
                    Ok(role) => role,
                    Err(err) => {
                        self.skip_credit(song_id, &role_type, line_up_id, &err.to_string());
                        continue;
                    }
                };
                let line_up = match LineUpRef::from_raw(line_up_id) {
                    Ok(line_up) => line_up,
                    Err(err) => {
                        self.skip_credit(song_id, &role_type, line_up_id, &err.to_string());
                        continue;
                    }
                };
                credits.entry(song_id).or_default().push(
                    role,
                    ArtistRef {
                        artist_id: ArtistId(artist_id),
                        line_up,
                    },
                );
            }
        }
        Ok(credits)
    }
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    ann_song_id: i64,
    ann_id: i64,
    song_id: i64,
    song_type: i64,
    song_number: i64,
    song_name: String,
    song_artist: String,
    song_difficulty: Option<f64>,
    song_category: String,
    hq: Option<String>,
    mq: Option<String>,
    audio: Option<String>,
    expand_name: String,
    jp_name: Option<String>,
    en_name: Option<String>,
    season: Option<String>,
    anime_type: Option<String>,
}

impl CandidateRow {
    fn into_entry(self, alt_names: Vec<String>) -> Result<CatalogEntry> {
        let anime = Anime {
            ann_id: self.ann_id,
            expand_name: self.expand_name,
            jp_name: self.jp_name,
            en_name: self.en_name,
            alt_names,
            season: self.season,
            anime_type: self
                .anime_type
                .as_deref()
                .map(str::parse::<AnimeType>)
                .transpose()?,
        };

        let song = CatalogSong {
            ann_song_id: self.ann_song_id,
            ann_id: self.ann_id,
            song_id: self.song_id,
            song_type: SongType::from_code(self.song_type)?,
            song_number: u32::try_from(self.song_number).map_err(|_| {
                LibraryError::InvalidData(format!(
                    "song {} has number {}",
                    self.ann_song_id, self.song_number
                ))
            })?,
            name: self.song_name,
            artist: self.song_artist,
            difficulty: self.song_difficulty,
            category: self.song_category.parse::<SongCategory>()?,
            hq: self.hq,
            mq: self.mq,
            audio: self.audio,
            credits: SongCredits::default(),
        };

        Ok(CatalogEntry { anime, song })
    }
}

fn push_list<'a, T>(builder: &mut QueryBuilder<'a, Sqlite>, values: impl IntoIterator<Item = T>)
where
    T: 'a + sqlx::Encode<'a, Sqlite> + sqlx::Type<Sqlite> + Send,
{
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(value);
    }
    separated.push_unseparated(")");
}

/// Binds an id list as one JSON array, so its length is not bounded by
/// SQLite's parameter limit.
fn push_json_ids(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) -> Result<()> {
    let json = serde_json::to_string(ids)
        .map_err(|err| LibraryError::InvalidData(format!("id list: {err}")))?;
    builder
        .push("(SELECT value FROM json_each(")
        .push_bind(json)
        .push("))");
    Ok(())
}

fn build_candidate_query(filter: &SongFilter) -> Result<QueryBuilder<'_, Sqlite>> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT s.ann_song_id, s.ann_id, s.song_id, s.song_type, s.song_number,
               s.song_name, s.song_artist, s.song_difficulty, s.song_category,
               s.hq, s.mq, s.audio,
               a.expand_name, a.jp_name, a.en_name, a.season, a.anime_type
        FROM songs s
        INNER JOIN anime a ON a.ann_id = s.ann_id
        WHERE s.song_type IN (
        "#,
    );
    push_list(&mut builder, filter.song_types.iter().map(SongType::code));

    builder.push(" AND s.song_category IN (");
    push_list(&mut builder, filter.categories.iter().map(|category| category.as_str() as &str));

    if let Some(ann_ids) = &filter.ann_ids {
        builder.push(" AND s.ann_id IN ");
        push_json_ids(&mut builder, ann_ids)?;
    }

    if let Some(song_ids) = &filter.song_ids {
        builder.push(" AND s.song_id IN ");
        push_json_ids(&mut builder, song_ids)?;
    }

    if let Some(anime_types) = &filter.anime_types {
        builder.push(" AND a.anime_type IN (");
        push_list(&mut builder, anime_types.iter().map(|anime_type| anime_type.as_str() as &str));
    }

    if let Some(seasons) = &filter.anime_seasons {
        builder.push(" AND a.season IN (");
        push_list(&mut builder, seasons.iter().map(String::as_str));
    }

    // Songs without a measured difficulty only survive the unrestricted range.
    if !filter.difficulty.is_full() {
        builder
            .push(" AND s.song_difficulty BETWEEN ")
            .push_bind(i64::from(filter.difficulty.min()))
            .push(" AND ")
            .push_bind(i64::from(filter.difficulty.max()));
    }

    builder.push(" ORDER BY s.ann_song_id");

    let filtered_in_memory = filter.has_text_patterns() || filter.ignore_duplicates;
    if let (Some(limit), false) = (filter.limit, filtered_in_memory) {
        builder.push(" LIMIT ").push_bind(limit as i64);
    }

    Ok(builder)
}

#[async_trait]
impl SongRepository for SqliteSongRepository {
    async fn find_song_ids_by_artists(
        &self,
        artist_ids: &[ArtistId],
        credit_types: CreditTypes,
    ) -> Result<Vec<i64>> {
        if artist_ids.is_empty() || credit_types.is_empty() {
            return Ok(Vec::new());
        }

        let mut song_ids: HashSet<i64> = HashSet::new();
        for chunk in artist_ids.chunks(MAX_BIND_PARAMS) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "SELECT DISTINCT song_id FROM song_credits WHERE role_type IN (",
            );
            push_list(&mut builder, credit_types.iter().map(|role| role.as_str()));
            builder.push(" AND artist_id IN (");
            push_list(&mut builder, chunk.iter().map(|id| id.value()));

            let rows: Vec<(i64,)> = builder.build_query_as().fetch_all(&self.pool).await?;
            song_ids.extend(rows.into_iter().map(|(song_id,)| song_id));
        }

        let mut song_ids: Vec<i64> = song_ids.into_iter().collect();
        song_ids.sort_unstable();
        debug!(
            artists = artist_ids.len(),
            songs = song_ids.len(),
            "Prefiltered songs by credited artists"
        );
        Ok(song_ids)
    }

    async fn find_candidates(&self, filter: &SongFilter) -> Result<Vec<CatalogEntry>> {
        if filter.selects_nothing() {
            return Ok(Vec::new());
        }

        let rows: Vec<CandidateRow> = build_candidate_query(filter)?
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;
        let fetched = rows.len();

        let mut ann_ids: Vec<i64> = rows.iter().map(|row| row.ann_id).collect();
        ann_ids.sort_unstable();
        ann_ids.dedup();
        let alt_names = self.load_alt_names(&ann_ids).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let names = alt_names.get(&row.ann_id).cloned().unwrap_or_default();
            let entry = row.into_entry(names)?;
            if filter.matches_text(&entry) {
                entries.push(entry);
            }
        }

        if filter.ignore_duplicates {
            entries = suppress_duplicates(entries);
        }
        if let Some(limit) = filter.limit {
            entries.truncate(limit);
        }

        let mut song_ids: Vec<i64> = entries.iter().map(|entry| entry.song.song_id).collect();
        song_ids.sort_unstable();
        song_ids.dedup();
        let credits = self.load_credits(&song_ids).await?;
        for entry in &mut entries {
            if let Some(song_credits) = credits.get(&entry.song.song_id) {
                entry.song.credits = song_credits.clone();
            }
        }

        debug!(fetched, returned = entries.len(), "Fetched candidate songs");
        Ok(entries)
    }

    async fn insert(&self, song: &CatalogSong) -> Result<()> {
        // Validate before insertion
        song.validate().map_err(|e| LibraryError::InvalidInput {
            field: "Song".to_string(),
            message: e,
        })?;

        let mut tx = self.pool.begin().await?;

        query(
            r#"
            INSERT INTO songs (
                ann_song_id, ann_id, song_id, song_type, song_number, song_name,
                song_artist, song_difficulty, song_category, hq, mq, audio
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(song.ann_song_id)
        .bind(song.ann_id)
        .bind(song.song_id)
        .bind(song.song_type.code())
        .bind(i64::from(song.song_number))
        .bind(&song.name)
        .bind(&song.artist)
        .bind(song.difficulty)
        .bind(song.category.as_str())
        .bind(&song.hq)
        .bind(&song.mq)
        .bind(&song.audio)
        .execute(&mut *tx)
        .await?;

        query("DELETE FROM song_credits WHERE song_id = ?")
            .bind(song.song_id)
            .execute(&mut *tx)
            .await?;

        for role in CreditType::ALL {
            for (position, credit) in song.credits.by_role(role).iter().enumerate() {
                query(
                    r#"
                    INSERT INTO song_credits (song_id, role_type, position, artist_id, line_up_id)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(song.song_id)
                .bind(role.as_str())
                .bind(position as i64)
                .bind(credit.artist_id.value())
                .bind(credit.line_up.to_raw())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM songs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
