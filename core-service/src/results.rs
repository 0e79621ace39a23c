//! The search response envelope.

use std::collections::{BTreeSet, HashSet};

use core_artists::{
    ArtistGraph, ArtistId, ArtistRef, CreditTypes, FlattenMode, GroupMembership,
    MembershipExpander,
};
use core_library::{AnimeType, CatalogEntry, SongCategory};
use serde::{Deserialize, Serialize};

/// Songs found by a search, with the anime and artists they reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub anime: Vec<AnimeEntry>,
    pub songs: Vec<SongEntry>,
    pub artists: Vec<ArtistEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongEntry {
    pub ann_song_id: i64,
    pub ann_id: i64,
    pub song_id: i64,
    /// "Opening N", "Ending N" or "Insert Song".
    pub song_type: String,
    pub song_name: String,
    pub song_artist: String,
    pub song_difficulty: Option<f64>,
    pub song_category: SongCategory,
    pub hq: Option<String>,
    pub mq: Option<String>,
    pub audio: Option<String>,
    pub vocalists: Vec<ArtistRef>,
    pub backing_vocalists: Vec<ArtistRef>,
    pub performers: Vec<ArtistRef>,
    pub composers: Vec<ArtistRef>,
    pub arrangers: Vec<ArtistRef>,
}

impl From<&CatalogEntry> for SongEntry {
    fn from(entry: &CatalogEntry) -> Self {
        let song = &entry.song;
        Self {
            ann_song_id: song.ann_song_id,
            ann_id: song.ann_id,
            song_id: song.song_id,
            song_type: song.type_label(),
            song_name: song.name.clone(),
            song_artist: song.artist.clone(),
            song_difficulty: song.difficulty,
            song_category: song.category,
            hq: song.hq.clone(),
            mq: song.mq.clone(),
            audio: song.audio.clone(),
            vocalists: song.credits.vocalists.clone(),
            backing_vocalists: song.credits.backing_vocalists.clone(),
            performers: song.credits.performers.clone(),
            composers: song.credits.composers.clone(),
            arrangers: song.credits.arrangers.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeEntry {
    pub ann_id: i64,
    pub expand_name: String,
    /// Falls back to the expand name.
    pub jp_name: String,
    /// Falls back to the expand name.
    pub en_name: String,
    pub alt_names: Vec<String>,
    pub season: Option<String>,
    pub anime_type: Option<AnimeType>,
}

impl From<&CatalogEntry> for AnimeEntry {
    fn from(entry: &CatalogEntry) -> Self {
        let anime = &entry.anime;
        Self {
            ann_id: anime.ann_id,
            expand_name: anime.expand_name.clone(),
            jp_name: anime
                .jp_name
                .clone()
                .unwrap_or_else(|| anime.expand_name.clone()),
            en_name: anime
                .en_name
                .clone()
                .unwrap_or_else(|| anime.expand_name.clone()),
            alt_names: anime.alt_names.clone(),
            season: anime.season.clone(),
            anime_type: anime.anime_type,
        }
    }
}

/// A credited artist as stored in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistEntry {
    pub artist_id: ArtistId,
    pub names: Vec<String>,
    pub groups: Vec<GroupMembership>,
    /// Members of each line-up, in line-up order.
    pub line_ups: Vec<Vec<GroupMembership>>,
}

impl ArtistEntry {
    fn from_graph(graph: &ArtistGraph, artist_id: ArtistId) -> Option<Self> {
        let artist = graph.get(artist_id)?;
        Some(Self {
            artist_id,
            names: artist.names.clone(),
            groups: artist.groups.clone(),
            line_ups: artist
                .line_ups
                .iter()
                .map(|line_up| line_up.members.clone())
                .collect(),
        })
    }
}

impl SearchResults {
    /// Builds the envelope from catalog rows, keeping their order.
    ///
    /// Each anime is listed once, by first appearance. Artists cover every
    /// credited artist plus the members of credited line-ups, sorted by id.
    pub fn from_entries(graph: &ArtistGraph, entries: &[CatalogEntry]) -> Self {
        let mut seen_anime = HashSet::new();
        let anime = entries
            .iter()
            .filter(|entry| seen_anime.insert(entry.anime.ann_id))
            .map(AnimeEntry::from)
            .collect();

        // Matching already reported any dangling credit on these songs.
        let expander = MembershipExpander::unreported(graph);
        let credited: BTreeSet<ArtistId> = entries
            .iter()
            .flat_map(|entry| {
                expander.flatten(
                    CreditTypes::all(),
                    entry.song.credits.iter().map(|(_, artist)| *artist),
                    FlattenMode::WithGroups,
                )
            })
            .collect();
        let artists = credited
            .into_iter()
            .filter_map(|artist_id| ArtistEntry::from_graph(graph, artist_id))
            .collect();

        Self {
            anime,
            songs: entries.iter().map(SongEntry::from).collect(),
            artists,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_artists::{CreditType, LineUpRef, SongCredits};
    use core_library::{Anime, CatalogSong, SongType};

    fn entry(ann_id: i64, ann_song_id: i64, credits: SongCredits) -> CatalogEntry {
        CatalogEntry {
            anime: Anime::new(ann_id, format!("anime {ann_id}")),
            song: CatalogSong {
                ann_song_id,
                ann_id,
                song_id: ann_song_id,
                song_type: SongType::Opening,
                song_number: 2,
                name: format!("song {ann_song_id}"),
                artist: "someone".to_string(),
                difficulty: None,
                category: SongCategory::Standard,
                hq: None,
                mq: None,
                audio: None,
                credits,
            },
        }
    }

    fn graph() -> ArtistGraph {
        let mut builder = ArtistGraph::builder();
        builder.add_artist(1, vec!["Member".to_string()]).unwrap();
        builder.add_artist(7, vec!["Composer".to_string()]).unwrap();
        builder.add_artist(10, vec!["Unit".to_string()]).unwrap();
        builder
            .add_line_up(
                10,
                0,
                vec![GroupMembership::new(1, CreditType::Vocalist, LineUpRef::Solo)],
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_envelope_lists_anime_once_and_expands_line_ups() {
        let credits = SongCredits {
            vocalists: vec![ArtistRef::line_up(10, 0)],
            composers: vec![ArtistRef::solo(7), ArtistRef::solo(99)],
            ..SongCredits::default()
        };
        let entries = vec![
            entry(5, 1, credits.clone()),
            entry(5, 2, SongCredits::default()),
            entry(6, 3, SongCredits::default()),
        ];

        let results = SearchResults::from_entries(&graph(), &entries);

        assert_eq!(results.songs.len(), 3);
        assert_eq!(results.songs[0].song_type, "Opening 2");
        assert_eq!(results.songs[0].vocalists, vec![ArtistRef::line_up(10, 0)]);
        let ann_ids: Vec<i64> = results.anime.iter().map(|anime| anime.ann_id).collect();
        assert_eq!(ann_ids, vec![5, 6]);
        assert_eq!(results.anime[0].jp_name, "anime 5");

        let artist_ids: Vec<ArtistId> = results.artists.iter().map(|a| a.artist_id).collect();
        assert_eq!(artist_ids, vec![ArtistId(1), ArtistId(7), ArtistId(10)]);
        assert_eq!(results.artists[2].line_ups.len(), 1);
    }

    #[test]
    fn test_envelope_does_not_recount_dangling_credits() {
        let graph = graph();
        let credits = SongCredits {
            vocalists: vec![ArtistRef::line_up(10, 3), ArtistRef::solo(1)],
            ..SongCredits::default()
        };

        let results = SearchResults::from_entries(&graph, &[entry(5, 1, credits)]);

        assert_eq!(results.artists.len(), 1);
        assert_eq!(graph.dangling_reference_count(), 0);
    }

    #[test]
    fn test_empty_envelope() {
        let results = SearchResults::from_entries(&graph(), &[]);
        assert!(results.is_empty());
        assert!(results.anime.is_empty());
        assert!(results.artists.is_empty());
    }
}
