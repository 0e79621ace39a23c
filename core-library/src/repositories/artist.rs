//! Artist repository trait and implementation

use std::collections::HashMap;

use async_trait::async_trait;
use core_artists::{Artist, ArtistError, ArtistGraph, CreditType, GroupMembership, LineUpRef};
use sqlx::{query, query_as, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{LibraryError, Result};

/// Artist repository interface for data access operations
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Load every artist, group membership and line-up into a snapshot
    ///
    /// # Errors
    /// Returns `InvalidData` if:
    /// - A group's line-up ids are not contiguous from 0
    /// - A stored role or line-up id cannot be decoded
    ///
    /// References to artists or line-ups missing from the catalog are kept
    /// and reported by the snapshot.
    async fn load_graph(&self) -> Result<ArtistGraph>;

    /// Insert an artist with its names, groups and line-ups
    ///
    /// # Errors
    /// Returns error if:
    /// - Artist with same ID already exists
    /// - Artist has no name or line-ups are out of order
    /// - Database error occurs
    async fn insert(&self, artist: &Artist) -> Result<()>;

    /// Count total artists
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of ArtistRepository
pub struct SqliteArtistRepository {
    pool: SqlitePool,
}

impl SqliteArtistRepository {
    /// Create a new SqliteArtistRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn invalid_snapshot(err: ArtistError) -> LibraryError {
    LibraryError::InvalidData(err.to_string())
}

fn membership(artist_id: i64, role: &str, line_up_id: i64) -> Result<GroupMembership> {
    let role: CreditType = role.parse().map_err(invalid_snapshot)?;
    let line_up = LineUpRef::from_raw(line_up_id).map_err(invalid_snapshot)?;
    Ok(GroupMembership::new(artist_id, role, line_up))
}

fn validate(artist: &Artist) -> std::result::Result<(), String> {
    if artist.names.iter().all(|name| name.trim().is_empty()) {
        return Err(format!("Artist {} needs at least one name", artist.id));
    }
    if let Some((position, _)) = artist
        .line_ups
        .iter()
        .enumerate()
        .find(|(position, line_up)| line_up.index != *position)
    {
        return Err(format!(
            "Artist {} line-up at position {} has the wrong index",
            artist.id, position
        ));
    }
    Ok(())
}

#[async_trait]
impl ArtistRepository for SqliteArtistRepository {
    async fn load_graph(&self) -> Result<ArtistGraph> {
        let ids: Vec<(i64,)> = query_as("SELECT id FROM artists ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let name_rows: Vec<(i64, String)> =
            query_as("SELECT artist_id, name FROM artist_names ORDER BY artist_id, position")
                .fetch_all(&self.pool)
                .await?;

        let group_rows: Vec<(i64, i64, String, i64)> = query_as(
            r#"
            SELECT artist_id, group_id, role_type, line_up_id
            FROM artist_groups
            ORDER BY artist_id, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let line_up_rows: Vec<(i64, i64)> =
            query_as("SELECT group_id, line_up_id FROM line_ups ORDER BY group_id, line_up_id")
                .fetch_all(&self.pool)
                .await?;

        let member_rows: Vec<(i64, i64, i64, String, i64)> = query_as(
            r#"
            SELECT group_id, line_up_id, member_id, role_type, member_line_up_id
            FROM line_up_members
            ORDER BY group_id, line_up_id, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut names: HashMap<i64, Vec<String>> = HashMap::new();
        for (artist_id, name) in name_rows {
            names.entry(artist_id).or_default().push(name);
        }

        let mut members: HashMap<(i64, i64), Vec<GroupMembership>> = HashMap::new();
        for (group_id, line_up_id, member_id, role, member_line_up_id) in member_rows {
            members
                .entry((group_id, line_up_id))
                .or_default()
                .push(membership(member_id, &role, member_line_up_id)?);
        }

        let mut builder = ArtistGraph::builder();
        for (id,) in ids {
            builder
                .add_artist(id, names.remove(&id).unwrap_or_default())
                .map_err(invalid_snapshot)?;
        }

        for (artist_id, group_id, role, line_up_id) in group_rows {
            builder
                .add_group(artist_id, membership(group_id, &role, line_up_id)?)
                .map_err(invalid_snapshot)?;
        }

        for (group_id, line_up_id) in line_up_rows {
            let index = usize::try_from(line_up_id).map_err(|_| {
                LibraryError::InvalidData(format!("group {group_id} has line-up id {line_up_id}"))
            })?;
            let roster = members.remove(&(group_id, line_up_id)).unwrap_or_default();
            builder
                .add_line_up(group_id, index, roster)
                .map_err(invalid_snapshot)?;
        }

        if !members.is_empty() {
            warn!(
                orphaned_line_ups = members.len(),
                "Ignoring members of undeclared line-ups"
            );
        }

        let graph = builder.build();
        info!(artists = graph.len(), "Loaded artist snapshot");
        Ok(graph)
    }

    async fn insert(&self, artist: &Artist) -> Result<()> {
        // Validate before insertion
        validate(artist).map_err(|e| LibraryError::InvalidInput {
            field: "Artist".to_string(),
            message: e,
        })?;

        let artist_id = artist.id.value();
        let mut tx = self.pool.begin().await?;

        query("INSERT INTO artists (id) VALUES (?)")
            .bind(artist_id)
            .execute(&mut *tx)
            .await?;

        for (position, name) in artist.names.iter().enumerate() {
            query("INSERT INTO artist_names (artist_id, position, name) VALUES (?, ?, ?)")
                .bind(artist_id)
                .bind(position as i64)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        for (position, group) in artist.groups.iter().enumerate() {
            query(
                r#"
                INSERT INTO artist_groups (artist_id, position, group_id, role_type, line_up_id)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(artist_id)
            .bind(position as i64)
            .bind(group.artist_id.value())
            .bind(group.role.as_str())
            .bind(group.line_up.to_raw())
            .execute(&mut *tx)
            .await?;
        }

        for line_up in &artist.line_ups {
            let line_up_id = line_up.index as i64;
            query("INSERT INTO line_ups (group_id, line_up_id) VALUES (?, ?)")
                .bind(artist_id)
                .bind(line_up_id)
                .execute(&mut *tx)
                .await?;

            for (position, member) in line_up.members.iter().enumerate() {
                query(
                    r#"
                    INSERT INTO line_up_members (
                        group_id, line_up_id, position, member_id, role_type, member_line_up_id
                    )
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(artist_id)
                .bind(line_up_id)
                .bind(position as i64)
                .bind(member.artist_id.value())
                .bind(member.role.as_str())
                .bind(member.line_up.to_raw())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        debug!(artist_id, line_ups = artist.line_ups.len(), "Inserted artist");
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM artists")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
