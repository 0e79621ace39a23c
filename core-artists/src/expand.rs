//! Coarse widening of searched artists before candidate songs are fetched.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{ArtistError, Result};
use crate::graph::ArtistGraph;
use crate::membership::{FlattenMode, MembershipExpander};
use crate::models::{ArtistId, CreditTypes, GroupMembership};

/// Widens seed artists to every id a matching song could be credited to.
///
/// The result is deliberately over-inclusive; [`GroupMatchEvaluator`]
/// makes the precise decision per song.
///
/// [`GroupMatchEvaluator`]: crate::matcher::GroupMatchEvaluator
#[derive(Debug, Clone, Copy)]
pub struct ArtistIdExpander<'g> {
    graph: &'g ArtistGraph,
}

impl<'g> ArtistIdExpander<'g> {
    pub fn new(graph: &'g ArtistGraph) -> Self {
        Self { graph }
    }

    /// Every seed plus the groups it belongs to. With a non-zero
    /// `group_granularity`, the members of each of the seed's line-ups (and
    /// the sub-groups crossed to reach them) are added as well.
    pub fn expand<I>(
        &self,
        seeds: I,
        credit_types: CreditTypes,
        group_granularity: usize,
    ) -> Result<HashSet<ArtistId>>
    where
        I: IntoIterator<Item = ArtistId>,
    {
        let members = MembershipExpander::new(self.graph);
        let mut expanded = HashSet::new();

        for seed in seeds {
            let artist = self
                .graph
                .get(seed)
                .ok_or(ArtistError::NotFound { artist_id: seed })?;

            expanded.insert(seed);
            expanded.extend(artist.groups.iter().map(|group| group.artist_id));

            if group_granularity > 0 {
                for line_up in &artist.line_ups {
                    expanded.extend(members.flatten(
                        credit_types,
                        line_up.members.iter().map(GroupMembership::to_ref),
                        FlattenMode::WithGroups,
                    ));
                }
            }
        }

        debug!(
            expanded = expanded.len(),
            group_granularity,
            "Expanded searched artists"
        );
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreditType, LineUpRef};

    fn ids(values: &[i64]) -> HashSet<ArtistId> {
        values.iter().copied().map(ArtistId).collect()
    }

    /// Group 10 = {1, 2}; 1 also belongs to 30 as a composer.
    fn graph() -> ArtistGraph {
        let mut builder = ArtistGraph::builder();
        for id in [1, 2, 10, 30] {
            builder.add_artist(id, vec![format!("artist {id}")]).unwrap();
        }
        builder
            .add_group(1, GroupMembership::new(10, CreditType::Vocalist, LineUpRef::Index(0)))
            .unwrap();
        builder
            .add_group(1, GroupMembership::new(30, CreditType::Composer, LineUpRef::Solo))
            .unwrap();
        builder
            .add_group(2, GroupMembership::new(10, CreditType::Vocalist, LineUpRef::Index(0)))
            .unwrap();
        builder
            .add_line_up(
                10,
                0,
                vec![
                    GroupMembership::new(1, CreditType::Vocalist, LineUpRef::Solo),
                    GroupMembership::new(2, CreditType::Vocalist, LineUpRef::Solo),
                ],
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_zero_granularity_is_seed_and_groups() {
        let graph = graph();
        let expander = ArtistIdExpander::new(&graph);
        let vocal_only = CreditTypes::empty().with(CreditType::Vocalist);

        // Groups are added whatever the role they were joined under.
        let expanded = expander.expand([ArtistId(1)], vocal_only, 0).unwrap();
        assert_eq!(expanded, ids(&[1, 10, 30]));
    }

    #[test]
    fn test_granularity_adds_line_up_members() {
        let graph = graph();
        let expander = ArtistIdExpander::new(&graph);

        assert_eq!(
            expander.expand([ArtistId(10)], CreditTypes::all(), 0).unwrap(),
            ids(&[10])
        );
        assert_eq!(
            expander.expand([ArtistId(10)], CreditTypes::all(), 2).unwrap(),
            ids(&[1, 2, 10])
        );
    }

    #[test]
    fn test_unknown_seed_is_not_found() {
        let graph = graph();
        let expander = ArtistIdExpander::new(&graph);
        let err = expander
            .expand([ArtistId(1), ArtistId(404)], CreditTypes::all(), 0)
            .unwrap_err();
        assert!(matches!(err, ArtistError::NotFound { artist_id } if artist_id == ArtistId(404)));
    }
}
