//! # Artist Matching Core
//!
//! Artist relationship resolution and matching engine of the song catalog.
//!
//! ## Overview
//!
//! - [`ArtistGraph`]: immutable snapshot of artists, group memberships and
//!   line-ups, built once and shared read-only.
//! - [`MembershipExpander`]: flattens group and line-up references into the
//!   artists behind them.
//! - [`ArtistIdExpander`]: widens searched artists for the coarse candidate
//!   fetch.
//! - [`GroupMatchEvaluator`]: exact per-song acceptance test.
//! - [`FuzzyNameMatcher`]: tolerant patterns for free-text name search.
//! - [`QueryCombiner`]: AND/OR over sub-search results.
//!
//! Nothing here performs I/O. Storage hands in rows, the engine decides.

pub mod combine;
pub mod error;
pub mod expand;
pub mod fuzzy;
pub mod graph;
pub mod matcher;
pub mod membership;
pub mod models;

pub use combine::{CanonicalValue, CombinationLogic, QueryCombiner};
pub use error::{ArtistError, Result};
pub use expand::ArtistIdExpander;
pub use fuzzy::{FuzzyNameMatcher, FuzzyOptions, FuzzyPattern};
pub use graph::{Artist, ArtistGraph, ArtistGraphBuilder, ArtistHandle, DanglingReference, LineUp};
pub use matcher::{accepts, GroupMatchEvaluator, MatchPolicy};
pub use membership::{FlattenMode, MembershipExpander};
pub use models::{
    ArtistId, ArtistRef, CreditType, CreditTypes, GroupMembership, LineUpRef, SongCredits,
};
