//! # Artist Graph
//!
//! Immutable in-memory snapshot of every artist in the catalog, its names,
//! the groups it belongs to and, for groups, the successive line-ups.
//!
//! ## Overview
//!
//! Artists live in an arena (`Vec<Artist>`) addressed by [`ArtistHandle`];
//! an id index maps catalog ids to handles. The snapshot is assembled once
//! through [`ArtistGraphBuilder`], which enforces that line-up slots are
//! contiguous, and is then shared read-only (typically behind an `Arc`)
//! by every query.
//!
//! References between artists are not required to resolve. The catalog can
//! name groups or line-ups that were never imported; such dangling
//! references are reported with [`ArtistGraph::record_dangling`] and
//! skipped by the consumers instead of failing the query.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{ArtistError, Result};
use crate::fuzzy::FuzzyPattern;
use crate::models::{ArtistId, GroupMembership, LineUpRef};

/// One roster of a group. `index` equals the position in [`Artist::line_ups`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineUp {
    pub index: usize,
    pub members: Vec<GroupMembership>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    /// Display names, canonical name first.
    pub names: Vec<String>,
    pub groups: Vec<GroupMembership>,
    pub line_ups: Vec<LineUp>,
}

impl Artist {
    pub fn new(id: impl Into<ArtistId>, names: Vec<String>) -> Self {
        Self {
            id: id.into(),
            names,
            groups: Vec::new(),
            line_ups: Vec::new(),
        }
    }

    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn is_group(&self) -> bool {
        !self.line_ups.is_empty()
    }
}

/// Typed index into the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtistHandle(u32);

impl ArtistHandle {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A reference that does not resolve inside the snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DanglingReference {
    #[error("artist {0} is not in the snapshot")]
    UnknownArtist(ArtistId),

    #[error("artist {artist_id} has no line-up {index} ({available} known)")]
    LineUpOutOfRange {
        artist_id: ArtistId,
        index: usize,
        available: usize,
    },
}

#[derive(Debug, Default)]
pub struct ArtistGraph {
    artists: Vec<Artist>,
    index: HashMap<ArtistId, ArtistHandle>,
    dangling: AtomicU64,
}

impl ArtistGraph {
    pub fn builder() -> ArtistGraphBuilder {
        ArtistGraphBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    pub fn handle(&self, id: ArtistId) -> Option<ArtistHandle> {
        self.index.get(&id).copied()
    }

    /// Resolves a handle; `None` when it was issued by a larger graph.
    pub fn artist(&self, handle: ArtistHandle) -> Option<&Artist> {
        self.artists.get(handle.index())
    }

    pub fn get(&self, id: ArtistId) -> Option<&Artist> {
        self.handle(id).and_then(|handle| self.artist(handle))
    }

    pub fn contains(&self, id: ArtistId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artist> {
        self.artists.iter()
    }

    /// Looks up line-up `index` of `artist_id`.
    pub fn line_up(
        &self,
        artist_id: ArtistId,
        index: usize,
    ) -> std::result::Result<&LineUp, DanglingReference> {
        let artist = self
            .get(artist_id)
            .ok_or(DanglingReference::UnknownArtist(artist_id))?;
        artist
            .line_ups
            .get(index)
            .ok_or(DanglingReference::LineUpOutOfRange {
                artist_id,
                index,
                available: artist.line_ups.len(),
            })
    }

    /// Logs a dangling reference met while walking the graph and counts it.
    pub fn record_dangling(&self, reference: &DanglingReference) {
        let total = self.dangling.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(reference = %reference, total, "Skipping dangling artist reference");
    }

    /// Number of dangling references met by queries since the snapshot was built.
    pub fn dangling_reference_count(&self) -> u64 {
        self.dangling.load(Ordering::Relaxed)
    }

    /// Lists every group and line-up reference of the snapshot that does not resolve.
    pub fn validate(&self) -> Vec<DanglingReference> {
        let mut problems = Vec::new();
        for artist in &self.artists {
            let line_up_members = artist.line_ups.iter().flat_map(|line_up| &line_up.members);
            for membership in artist.groups.iter().chain(line_up_members) {
                if let Err(problem) = self.check_membership(membership) {
                    problems.push(problem);
                }
            }
        }
        problems
    }

    fn check_membership(
        &self,
        membership: &GroupMembership,
    ) -> std::result::Result<(), DanglingReference> {
        match membership.line_up {
            LineUpRef::Solo => {
                if self.contains(membership.artist_id) {
                    Ok(())
                } else {
                    Err(DanglingReference::UnknownArtist(membership.artist_id))
                }
            }
            LineUpRef::Index(index) => self.line_up(membership.artist_id, index).map(|_| ()),
        }
    }

    /// Ids of the artists having at least one name matched by `pattern`,
    /// in snapshot order, at most `limit` of them.
    pub fn find_by_name(&self, pattern: &FuzzyPattern, limit: usize) -> Vec<ArtistId> {
        let found: Vec<ArtistId> = self
            .artists
            .iter()
            .filter(|artist| pattern.matches_any(&artist.names))
            .map(|artist| artist.id)
            .take(limit)
            .collect();

        debug!(
            query = pattern.query(),
            limit,
            found = found.len(),
            "Resolved artist name"
        );
        found
    }
}

/// Assembles an [`ArtistGraph`].
///
/// # Example
///
/// ```
/// use core_artists::{ArtistGraph, CreditType, GroupMembership, LineUpRef};
///
/// let mut builder = ArtistGraph::builder();
/// builder.add_artist(1, vec!["Member".to_string()]).unwrap();
/// builder.add_artist(10, vec!["Group".to_string()]).unwrap();
/// builder
///     .add_line_up(10, 0, vec![GroupMembership::new(1, CreditType::Vocalist, LineUpRef::Solo)])
///     .unwrap();
/// let graph = builder.build();
/// assert_eq!(graph.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ArtistGraphBuilder {
    artists: Vec<Artist>,
    index: HashMap<ArtistId, ArtistHandle>,
}

impl ArtistGraphBuilder {
    pub fn add_artist(
        &mut self,
        id: impl Into<ArtistId>,
        names: Vec<String>,
    ) -> Result<ArtistHandle> {
        self.push_artist(Artist::new(id, names))
    }

    /// Adds a complete artist record, groups and line-ups included.
    pub fn push_artist(&mut self, artist: Artist) -> Result<ArtistHandle> {
        if self.index.contains_key(&artist.id) {
            return Err(ArtistError::InvalidSnapshot(format!(
                "artist {} appears twice",
                artist.id
            )));
        }
        if let Some((position, line_up)) = artist
            .line_ups
            .iter()
            .enumerate()
            .find(|(position, line_up)| line_up.index != *position)
        {
            return Err(skipped_line_up(artist.id, line_up.index, position));
        }

        let handle = u32::try_from(self.artists.len())
            .map(ArtistHandle)
            .map_err(|_| ArtistError::InvalidSnapshot("too many artists".to_string()))?;
        self.index.insert(artist.id, handle);
        self.artists.push(artist);
        Ok(handle)
    }

    pub fn add_group(
        &mut self,
        artist_id: impl Into<ArtistId>,
        membership: GroupMembership,
    ) -> Result<()> {
        self.artist_mut(artist_id.into())?.groups.push(membership);
        Ok(())
    }

    /// Appends line-up `index` to `group_id`; slots must be added in order.
    pub fn add_line_up(
        &mut self,
        group_id: impl Into<ArtistId>,
        index: usize,
        members: Vec<GroupMembership>,
    ) -> Result<()> {
        let group_id = group_id.into();
        let group = self.artist_mut(group_id)?;
        let expected = group.line_ups.len();
        if index != expected {
            return Err(skipped_line_up(group_id, index, expected));
        }
        group.line_ups.push(LineUp { index, members });
        Ok(())
    }

    fn artist_mut(&mut self, id: ArtistId) -> Result<&mut Artist> {
        let handle = self.index.get(&id).copied().ok_or_else(|| {
            ArtistError::InvalidSnapshot(format!("artist {id} is referenced before it is defined"))
        })?;
        Ok(&mut self.artists[handle.index()])
    }

    pub fn build(self) -> ArtistGraph {
        let graph = ArtistGraph {
            artists: self.artists,
            index: self.index,
            dangling: AtomicU64::new(0),
        };

        let problems = graph.validate();
        if !problems.is_empty() {
            warn!(
                dangling = problems.len(),
                first = %problems[0],
                "Artist snapshot contains unresolved references"
            );
        }
        debug!(artists = graph.len(), "Built artist graph");
        graph
    }
}

fn skipped_line_up(artist_id: ArtistId, index: usize, expected: usize) -> ArtistError {
    ArtistError::InvalidSnapshot(format!(
        "a group line up id has been skipped: artist {artist_id} got line-up {index}, expected {expected}"
    ))
}
