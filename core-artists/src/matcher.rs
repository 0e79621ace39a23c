//! # Group Match Evaluation
//!
//! Exact per-song acceptance test for artist searches.
//!
//! A song is accepted for a searched artist when either
//!
//! - the artist is among the song's performers, composers or arrangers
//!   (groups crossed on the way down count), or
//! - the song's vocalists overlap one of the artist's line-ups (or the
//!   artist alone when it has none) closely enough: at least one shared
//!   member, at least `min(group_granularity, line-up size)` of them, and
//!   no more than `max_other_artists` vocalists from outside the line-up.
//!
//! Line-up member sets only depend on the searched artists, so they are
//! computed once in [`GroupMatchEvaluator::new`] and reused for every
//! candidate song.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::ArtistGraph;
use crate::membership::{FlattenMode, MembershipExpander};
use crate::models::{ArtistId, CreditTypes, GroupMembership, SongCredits};

/// Tolerance settings of an artist search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    pub credit_types: CreditTypes,
    pub group_granularity: usize,
    pub max_other_artists: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            credit_types: CreditTypes::all(),
            group_granularity: 0,
            max_other_artists: 99,
        }
    }
}

#[derive(Debug)]
struct LineUpContext {
    members: HashSet<ArtistId>,
    size: usize,
}

#[derive(Debug)]
struct SearchTarget {
    artist_id: ArtistId,
    contexts: Vec<LineUpContext>,
}

#[derive(Debug)]
pub struct GroupMatchEvaluator<'g> {
    expander: MembershipExpander<'g>,
    targets: Vec<SearchTarget>,
    policy: MatchPolicy,
}

impl<'g> GroupMatchEvaluator<'g> {
    pub fn new(graph: &'g ArtistGraph, search_ids: &[ArtistId], policy: MatchPolicy) -> Self {
        let expander = MembershipExpander::new(graph);
        let targets = search_ids
            .iter()
            .map(|&artist_id| SearchTarget {
                artist_id,
                contexts: Self::contexts(&expander, artist_id, policy.credit_types),
            })
            .collect();

        Self {
            expander,
            targets,
            policy,
        }
    }

    /// Line-ups of a searched artist, or the artist alone.
    fn contexts(
        expander: &MembershipExpander<'_>,
        artist_id: ArtistId,
        credit_types: CreditTypes,
    ) -> Vec<LineUpContext> {
        let line_ups = expander
            .graph()
            .get(artist_id)
            .map(|artist| artist.line_ups.as_slice())
            .unwrap_or_default();

        if line_ups.is_empty() {
            return vec![LineUpContext {
                members: HashSet::from([artist_id]),
                size: 1,
            }];
        }

        line_ups
            .iter()
            .map(|line_up| LineUpContext {
                members: expander.flatten(
                    credit_types,
                    line_up.members.iter().map(GroupMembership::to_ref),
                    FlattenMode::LeavesOnly,
                ),
                size: line_up.members.len(),
            })
            .collect()
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn accepts(&self, credits: &SongCredits) -> bool {
        let credit_types = self.policy.credit_types;
        let vocal = self
            .expander
            .flatten(credit_types, credits.vocal_refs(), FlattenMode::LeavesOnly);
        let support = self
            .expander
            .flatten(credit_types, credits.support_refs(), FlattenMode::WithGroups);

        self.targets.iter().any(|target| {
            support.contains(&target.artist_id)
                || target
                    .contexts
                    .iter()
                    .any(|context| self.overlaps(&vocal, context))
        })
    }

    fn overlaps(&self, vocal: &HashSet<ArtistId>, context: &LineUpContext) -> bool {
        let present = vocal.intersection(&context.members).count();
        let additional = vocal.len() - present;
        let required = self.policy.group_granularity.min(context.size);

        present >= 1 && additional <= self.policy.max_other_artists && present >= required
    }

    /// Keeps the items whose credits are accepted.
    pub fn retain<T, F>(&self, items: Vec<T>, credits: F) -> Vec<T>
    where
        F: Fn(&T) -> &SongCredits,
    {
        let total = items.len();
        let kept: Vec<T> = items
            .into_iter()
            .filter(|item| self.accepts(credits(item)))
            .collect();
        debug!(candidates = total, accepted = kept.len(), "Evaluated candidate songs");
        kept
    }
}

/// One-shot form of [`GroupMatchEvaluator::accepts`].
pub fn accepts(
    graph: &ArtistGraph,
    credits: &SongCredits,
    search_ids: &[ArtistId],
    policy: MatchPolicy,
) -> bool {
    GroupMatchEvaluator::new(graph, search_ids, policy).accepts(credits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtistRef, CreditType, LineUpRef};

    fn solo_vocals(vocalists: &[i64]) -> SongCredits {
        SongCredits {
            vocalists: vocalists.iter().copied().map(ArtistRef::solo).collect(),
            ..SongCredits::default()
        }
    }

    fn vocalist(id: i64) -> GroupMembership {
        GroupMembership::new(id, CreditType::Vocalist, LineUpRef::Solo)
    }

    /// Trio 10 = {1, 2, 3}; later duo line-up 10/1 = {1, 2}. 5 is a composer.
    fn graph() -> ArtistGraph {
        let mut builder = ArtistGraph::builder();
        for id in [1, 2, 3, 4, 5, 10] {
            builder.add_artist(id, vec![format!("artist {id}")]).unwrap();
        }
        builder
            .add_line_up(10, 0, vec![vocalist(1), vocalist(2), vocalist(3)])
            .unwrap();
        builder.add_line_up(10, 1, vec![vocalist(1), vocalist(2)]).unwrap();
        builder.build()
    }

    fn strict() -> MatchPolicy {
        MatchPolicy {
            credit_types: CreditTypes::all(),
            group_granularity: 0,
            max_other_artists: 0,
        }
    }

    #[test]
    fn test_solo_search_without_extra_vocalists() {
        let graph = graph();
        let ids = [ArtistId(1)];

        assert!(accepts(&graph, &solo_vocals(&[1]), &ids, strict()));
        assert!(!accepts(&graph, &solo_vocals(&[1, 4]), &ids, strict()));
        assert!(!accepts(&graph, &solo_vocals(&[4]), &ids, strict()));
    }

    #[test]
    fn test_max_other_artists_tolerance() {
        let graph = graph();
        let policy = MatchPolicy {
            max_other_artists: 1,
            ..strict()
        };
        assert!(accepts(&graph, &solo_vocals(&[1, 4]), &[ArtistId(1)], policy));
        assert!(!accepts(&graph, &solo_vocals(&[1, 4, 5]), &[ArtistId(1)], policy));
    }

    #[test]
    fn test_group_credit_matches_member_search() {
        let graph = graph();
        let credits = SongCredits {
            vocalists: vec![ArtistRef::line_up(10, 0)],
            ..SongCredits::default()
        };
        let policy = MatchPolicy {
            max_other_artists: 2,
            ..strict()
        };
        assert!(accepts(&graph, &credits, &[ArtistId(1)], policy));
        assert!(!accepts(&graph, &credits, &[ArtistId(1)], strict()));
    }

    #[test]
    fn test_group_granularity_counts_members() {
        let graph = graph();
        let ids = [ArtistId(10)];
        let policy = MatchPolicy {
            group_granularity: 2,
            max_other_artists: 0,
            ..MatchPolicy::default()
        };

        assert!(accepts(&graph, &solo_vocals(&[1, 2]), &ids, policy));
        assert!(!accepts(&graph, &solo_vocals(&[3]), &ids, policy));

        let loose = MatchPolicy {
            group_granularity: 0,
            ..policy
        };
        assert!(accepts(&graph, &solo_vocals(&[3]), &ids, loose));
    }

    #[test]
    fn test_granularity_capped_by_line_up_size() {
        let graph = graph();
        let policy = MatchPolicy {
            group_granularity: 3,
            max_other_artists: 0,
            ..MatchPolicy::default()
        };
        // The duo line-up only has two members.
        assert!(accepts(&graph, &solo_vocals(&[1, 2]), &[ArtistId(10)], policy));
    }

    #[test]
    fn test_support_roles_match_directly() {
        let graph = graph();
        let credits = SongCredits {
            vocalists: vec![ArtistRef::solo(4)],
            composers: vec![ArtistRef::solo(5)],
            ..SongCredits::default()
        };
        assert!(accepts(&graph, &credits, &[ArtistId(5)], strict()));
    }

    #[test]
    fn test_support_group_matches_group_search() {
        let graph = graph();
        let credits = SongCredits {
            vocalists: vec![ArtistRef::solo(4)],
            performers: vec![ArtistRef::line_up(10, 1)],
            ..SongCredits::default()
        };
        assert!(accepts(&graph, &credits, &[ArtistId(10)], strict()));
        assert!(accepts(&graph, &credits, &[ArtistId(2)], strict()));
    }

    #[test]
    fn test_credit_type_filter_on_line_up_members() {
        let graph = graph();
        let credits = SongCredits {
            performers: vec![ArtistRef::line_up(10, 0)],
            ..SongCredits::default()
        };
        let composers_only = MatchPolicy {
            credit_types: CreditTypes::empty().with(CreditType::Composer),
            ..strict()
        };
        assert!(!accepts(&graph, &credits, &[ArtistId(1)], composers_only));
    }

    #[test]
    fn test_unknown_search_id_behaves_as_solo() {
        let graph = graph();
        assert!(accepts(&graph, &solo_vocals(&[77]), &[ArtistId(77)], strict()));
    }

    #[test]
    fn test_retain_filters_items() {
        let graph = graph();
        let evaluator = GroupMatchEvaluator::new(&graph, &[ArtistId(1)], strict());
        let songs = vec![("a", solo_vocals(&[1])), ("b", solo_vocals(&[2]))];
        let kept = evaluator.retain(songs, |(_, credits)| credits);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0, "a");
    }
}
