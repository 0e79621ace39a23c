//! Flattening of group and line-up references into the artists behind them.

use std::collections::HashSet;

use tracing::trace;

use crate::graph::ArtistGraph;
use crate::models::{ArtistId, ArtistRef, CreditTypes, GroupMembership, LineUpRef};

/// How much of a nested reference survives flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenMode {
    /// Only the individual artists at the bottom of the hierarchy.
    LeavesOnly,
    /// Every group crossed on the way down is kept as well.
    WithGroups,
}

#[derive(Debug, Clone, Copy)]
pub struct MembershipExpander<'g> {
    graph: &'g ArtistGraph,
    report_dangling: bool,
}

impl<'g> MembershipExpander<'g> {
    pub fn new(graph: &'g ArtistGraph) -> Self {
        Self {
            graph,
            report_dangling: true,
        }
    }

    /// An expander that skips dangling line-ups without recording them.
    ///
    /// For walks over credits that a matching pass has already reported.
    pub fn unreported(graph: &'g ArtistGraph) -> Self {
        Self {
            graph,
            report_dangling: false,
        }
    }

    pub fn graph(&self) -> &'g ArtistGraph {
        self.graph
    }

    /// Resolves `refs` to a flat set of artist ids.
    ///
    /// A solo reference contributes its own id. A line-up reference descends
    /// into the line-up's members whose role is in `credit_types`, and in
    /// [`FlattenMode::WithGroups`] also contributes the group id. The role
    /// filter applies to line-up members only, never to `refs` themselves.
    ///
    /// Each (group, line-up) pair is expanded at most once per call, which
    /// bounds the walk on cyclic graphs. Unresolvable line-ups contribute
    /// nothing and, unless built with [`Self::unreported`], are recorded on
    /// the graph.
    pub fn flatten<I>(&self, credit_types: CreditTypes, refs: I, mode: FlattenMode) -> HashSet<ArtistId>
    where
        I: IntoIterator<Item = ArtistRef>,
    {
        let mut flat = HashSet::new();
        let mut visited: HashSet<(ArtistId, usize)> = HashSet::new();
        let mut pending: Vec<ArtistRef> = refs.into_iter().collect();

        while let Some(reference) = pending.pop() {
            let index = match reference.line_up {
                LineUpRef::Solo => {
                    flat.insert(reference.artist_id);
                    continue;
                }
                LineUpRef::Index(index) => index,
            };

            if !visited.insert((reference.artist_id, index)) {
                trace!(artist_id = %reference.artist_id, index, "Line-up already expanded");
                continue;
            }

            match self.graph.line_up(reference.artist_id, index) {
                Ok(line_up) => {
                    if mode == FlattenMode::WithGroups {
                        flat.insert(reference.artist_id);
                    }
                    pending.extend(
                        line_up
                            .members
                            .iter()
                            .filter(|member| credit_types.contains(member.role))
                            .map(GroupMembership::to_ref),
                    );
                }
                Err(dangling) if self.report_dangling => self.graph.record_dangling(&dangling),
                Err(dangling) => trace!(reference = %dangling, "Skipping dangling line-up"),
            }
        }

        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreditType;

    fn vocalist(id: i64) -> GroupMembership {
        GroupMembership::new(id, CreditType::Vocalist, LineUpRef::Solo)
    }

    fn ids(values: &[i64]) -> HashSet<ArtistId> {
        values.iter().copied().map(ArtistId).collect()
    }

    /// 10 = {1, 2, composer 3}; 20 = {10/0, 4}
    fn nested_graph() -> ArtistGraph {
        let mut builder = ArtistGraph::builder();
        for id in [1, 2, 3, 4, 10, 20] {
            builder.add_artist(id, vec![format!("artist {id}")]).unwrap();
        }
        builder
            .add_line_up(
                10,
                0,
                vec![
                    vocalist(1),
                    vocalist(2),
                    GroupMembership::new(3, CreditType::Composer, LineUpRef::Solo),
                ],
            )
            .unwrap();
        builder
            .add_line_up(
                20,
                0,
                vec![
                    GroupMembership::new(10, CreditType::Vocalist, LineUpRef::Index(0)),
                    vocalist(4),
                ],
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_solo_reference_is_kept() {
        let graph = nested_graph();
        let expander = MembershipExpander::new(&graph);
        let flat = expander.flatten(
            CreditTypes::all(),
            [ArtistRef::solo(10)],
            FlattenMode::LeavesOnly,
        );
        assert_eq!(flat, ids(&[10]));
    }

    #[test]
    fn test_nested_line_up_leaves() {
        let graph = nested_graph();
        let expander = MembershipExpander::new(&graph);
        let flat = expander.flatten(
            CreditTypes::all(),
            [ArtistRef::line_up(20, 0)],
            FlattenMode::LeavesOnly,
        );
        assert_eq!(flat, ids(&[1, 2, 3, 4]));
    }

    #[test]
    fn test_with_groups_keeps_intermediate_groups() {
        let graph = nested_graph();
        let expander = MembershipExpander::new(&graph);
        let flat = expander.flatten(
            CreditTypes::all(),
            [ArtistRef::line_up(20, 0)],
            FlattenMode::WithGroups,
        );
        assert_eq!(flat, ids(&[1, 2, 3, 4, 10, 20]));
    }

    #[test]
    fn test_role_filter_applies_to_members() {
        let graph = nested_graph();
        let expander = MembershipExpander::new(&graph);
        let vocal_only = CreditTypes::empty().with(CreditType::Vocalist);
        let flat = expander.flatten(vocal_only, [ArtistRef::line_up(10, 0)], FlattenMode::LeavesOnly);
        assert_eq!(flat, ids(&[1, 2]));
    }

    #[test]
    fn test_order_independent_and_idempotent() {
        let graph = nested_graph();
        let expander = MembershipExpander::new(&graph);
        let refs = [ArtistRef::line_up(10, 0), ArtistRef::solo(4), ArtistRef::line_up(20, 0)];

        let forward = expander.flatten(CreditTypes::all(), refs, FlattenMode::LeavesOnly);
        let mut reversed = refs;
        reversed.reverse();
        let backward = expander.flatten(CreditTypes::all(), reversed, FlattenMode::LeavesOnly);
        assert_eq!(forward, backward);

        let doubled = refs.iter().chain(refs.iter()).copied();
        assert_eq!(
            expander.flatten(CreditTypes::all(), doubled, FlattenMode::LeavesOnly),
            forward
        );
    }

    #[test]
    fn test_cycle_terminates() {
        let mut builder = ArtistGraph::builder();
        builder.add_artist(1, vec!["A".into()]).unwrap();
        builder.add_artist(2, vec!["B".into()]).unwrap();
        builder
            .add_line_up(
                1,
                0,
                vec![GroupMembership::new(2, CreditType::Vocalist, LineUpRef::Index(0))],
            )
            .unwrap();
        builder
            .add_line_up(
                2,
                0,
                vec![
                    GroupMembership::new(1, CreditType::Vocalist, LineUpRef::Index(0)),
                    vocalist(3),
                ],
            )
            .unwrap();
        let graph = builder.build();
        let expander = MembershipExpander::new(&graph);

        let flat = expander.flatten(
            CreditTypes::all(),
            [ArtistRef::line_up(1, 0)],
            FlattenMode::WithGroups,
        );
        assert_eq!(flat, ids(&[1, 2, 3]));
    }

    #[test]
    fn test_dangling_line_up_is_skipped_and_counted() {
        let graph = nested_graph();
        let expander = MembershipExpander::new(&graph);
        let flat = expander.flatten(
            CreditTypes::all(),
            [ArtistRef::line_up(10, 5), ArtistRef::line_up(99, 0), ArtistRef::solo(4)],
            FlattenMode::WithGroups,
        );
        assert_eq!(flat, ids(&[4]));
        assert_eq!(graph.dangling_reference_count(), 2);
    }

    #[test]
    fn test_unreported_expander_leaves_counter_alone() {
        let graph = nested_graph();
        let flat = MembershipExpander::unreported(&graph).flatten(
            CreditTypes::all(),
            [ArtistRef::line_up(10, 5), ArtistRef::line_up(20, 0)],
            FlattenMode::WithGroups,
        );
        assert_eq!(flat, ids(&[20, 10, 1, 2, 3, 4]));
        assert_eq!(graph.dangling_reference_count(), 0);
    }
}
