//! # Search Service
//!
//! Runs catalog searches over a loaded artist snapshot.
//!
//! Artist searches are two-phase: the expanded artist ids drive a coarse
//! fetch from the song repository, then every candidate goes through the
//! exact [`GroupMatchEvaluator`]. Text searches are a single candidate
//! fetch with fuzzy patterns applied by the repository.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = CoreConfig::from_env()?;
//! let service = SearchService::bootstrap(&config).await?;
//!
//! let results = service
//!     .search_by_artist(&ArtistSearch::by_name("kana hanazawa", true))
//!     .await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use core_artists::{
    ArtistError, ArtistGraph, ArtistId, ArtistIdExpander, FuzzyNameMatcher, FuzzyOptions,
    FuzzyPattern, GroupMatchEvaluator, QueryCombiner,
};
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{
    suppress_duplicates, ArtistRepository, CatalogEntry, SongFilter, SongRepository,
    SqliteArtistRepository, SqliteSongRepository,
};
use core_runtime::config::{CoreConfig, DEFAULT_ARTIST_LOOKUP_LIMIT};
use core_runtime::logging::strip_path;
use tracing::{debug, info};

use crate::error::Result;
use crate::params::{AnnIdSearch, ArtistSearch, ArtistTarget, GlobalSearch, TextSearch};
use crate::results::SearchResults;

/// Limits applied by [`SearchService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Row cap for anime, song-name, song-artist and ANN id searches.
    pub max_results_per_search: Option<usize>,
    /// Most artists a name query may resolve to.
    pub artist_lookup_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results_per_search: None,
            artist_lookup_limit: DEFAULT_ARTIST_LOOKUP_LIMIT,
        }
    }
}

impl From<&CoreConfig> for SearchSettings {
    fn from(config: &CoreConfig) -> Self {
        Self {
            max_results_per_search: config.max_results_per_search,
            artist_lookup_limit: config.artist_lookup_limit,
        }
    }
}

/// Catalog search façade.
///
/// Cheap to clone; clones share the snapshot and the repository.
#[derive(Clone)]
pub struct SearchService {
    graph: Arc<ArtistGraph>,
    songs: Arc<dyn SongRepository>,
    settings: SearchSettings,
}

impl SearchService {
    pub fn new(
        graph: Arc<ArtistGraph>,
        songs: Arc<dyn SongRepository>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            graph,
            songs,
            settings,
        }
    }

    /// Opens the catalog database and loads the artist snapshot once.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the database
    /// cannot be opened or migrated, or the artist tables are inconsistent.
    pub async fn bootstrap(config: &CoreConfig) -> Result<Self> {
        config.validate()?;
        let started = Instant::now();

        let pool = create_pool(DatabaseConfig::new(config.database_path.clone())).await?;
        let graph = SqliteArtistRepository::new(pool.clone()).load_graph().await?;

        let database_path = config.database_path.to_string_lossy();
        info!(
            database = strip_path(&database_path),
            artists = graph.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search service ready"
        );

        Ok(Self::new(
            Arc::new(graph),
            Arc::new(SqliteSongRepository::new(pool)),
            SearchSettings::from(config),
        ))
    }

    pub fn graph(&self) -> &ArtistGraph {
        &self.graph
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    /// Songs credited to the target artists under the search's match policy.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` (see [`crate::CoreError::is_not_found`]) when a
    /// searched id is missing from the snapshot. A name that matches no
    /// artist is not an error and yields an empty envelope.
    pub async fn search_by_artist(&self, search: &ArtistSearch) -> Result<SearchResults> {
        let started = Instant::now();
        let entries = self.artist_entries(search).await?;
        Ok(self.finish("artist", started, &entries))
    }

    /// Songs of anime whose expand, JP, EN or alternative name matches.
    pub async fn search_by_anime_name(&self, search: &TextSearch) -> Result<SearchResults> {
        let started = Instant::now();
        let entries = self.anime_name_entries(search).await?;
        Ok(self.finish("anime_name", started, &entries))
    }

    pub async fn search_by_song_name(&self, search: &TextSearch) -> Result<SearchResults> {
        let started = Instant::now();
        let entries = self.song_name_entries(search).await?;
        Ok(self.finish("song_name", started, &entries))
    }

    /// Matches the catalog's free-text song artist, not the credit graph.
    pub async fn search_by_song_artist(&self, search: &TextSearch) -> Result<SearchResults> {
        let started = Instant::now();
        let entries = self.song_artist_entries(search).await?;
        Ok(self.finish("song_artist", started, &entries))
    }

    pub async fn search_by_ann_ids(&self, search: &AnnIdSearch) -> Result<SearchResults> {
        let started = Instant::now();
        let mut filter = self.capped_filter(search.filters.to_song_filter());
        filter.ann_ids = Some(search.ann_ids.clone());
        let entries = self.songs.find_candidates(&filter).await?;
        Ok(self.finish("ann_ids", started, &entries))
    }

    /// Runs every sub-search and combines their songs.
    ///
    /// Anime and artists are rebuilt from the songs that survive the
    /// combination. No sub-searches at all gives an empty envelope.
    pub async fn search_global(&self, search: &GlobalSearch) -> Result<SearchResults> {
        let started = Instant::now();

        let mut result_sets: Vec<Vec<CatalogEntry>> = Vec::with_capacity(search.len());
        for sub in &search.anime_searches {
            result_sets.push(self.anime_name_entries(sub).await?);
        }
        for sub in &search.song_name_searches {
            result_sets.push(self.song_name_entries(sub).await?);
        }
        for sub in &search.song_artist_searches {
            result_sets.push(self.song_artist_entries(sub).await?);
        }
        for sub in &search.artist_searches {
            result_sets.push(self.artist_entries(sub).await?);
        }

        debug!(
            sub_searches = result_sets.len(),
            logic = ?search.combination_logic,
            "Combining sub-search results"
        );
        let entries = QueryCombiner::combine(&result_sets, search.combination_logic)?;
        Ok(self.finish("global", started, &entries))
    }

    async fn artist_entries(&self, search: &ArtistSearch) -> Result<Vec<CatalogEntry>> {
        let seeds = self.resolve_seeds(&search.target)?;
        if seeds.is_empty() {
            debug!("Artist target resolved to no artists");
            return Ok(Vec::new());
        }

        let policy = search.policy;
        let mut expanded: Vec<ArtistId> = ArtistIdExpander::new(&self.graph)
            .expand(
                seeds.iter().copied(),
                policy.credit_types,
                policy.group_granularity,
            )?
            .into_iter()
            .collect();
        expanded.sort_unstable();

        let song_ids = self
            .songs
            .find_song_ids_by_artists(&expanded, policy.credit_types)
            .await?;
        debug!(
            seeds = seeds.len(),
            expanded = expanded.len(),
            songs = song_ids.len(),
            "Prefiltered artist search"
        );
        if song_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Duplicates are dropped only after the exact match, otherwise an
        // accepted version could be hidden behind a rejected one.
        let mut filter = search.filters.to_song_filter();
        filter.song_ids = Some(song_ids);
        filter.ignore_duplicates = false;
        let candidates = self.songs.find_candidates(&filter).await?;

        let evaluator = GroupMatchEvaluator::new(&self.graph, &seeds, policy);
        let accepted = evaluator.retain(candidates, |entry| &entry.song.credits);

        Ok(if search.filters.ignore_duplicates {
            suppress_duplicates(accepted)
        } else {
            accepted
        })
    }

    fn resolve_seeds(&self, target: &ArtistTarget) -> Result<Vec<ArtistId>> {
        match target {
            ArtistTarget::Ids(ids) => {
                if let Some(&artist_id) = ids.iter().find(|id| !self.graph.contains(**id)) {
                    return Err(ArtistError::NotFound { artist_id }.into());
                }
                Ok(ids.clone())
            }
            ArtistTarget::Name {
                query,
                partial_match,
            } => {
                let pattern = FuzzyNameMatcher::build(
                    query,
                    FuzzyOptions {
                        partial_match: *partial_match,
                        swap_words: true,
                    },
                )?;
                Ok(self
                    .graph
                    .find_by_name(&pattern, self.settings.artist_lookup_limit))
            }
        }
    }

    async fn anime_name_entries(&self, search: &TextSearch) -> Result<Vec<CatalogEntry>> {
        let mut filter = self.capped_filter(search.filters.to_song_filter());
        filter.anime_name = Some(Self::pattern(search, false)?);
        Ok(self.songs.find_candidates(&filter).await?)
    }

    async fn song_name_entries(&self, search: &TextSearch) -> Result<Vec<CatalogEntry>> {
        let mut filter = self.capped_filter(search.filters.to_song_filter());
        filter.song_name = Some(Self::pattern(search, false)?);
        Ok(self.songs.find_candidates(&filter).await?)
    }

    async fn song_artist_entries(&self, search: &TextSearch) -> Result<Vec<CatalogEntry>> {
        let mut filter = self.capped_filter(search.filters.to_song_filter());
        filter.song_artist = Some(Self::pattern(search, true)?);
        Ok(self.songs.find_candidates(&filter).await?)
    }

    fn pattern(search: &TextSearch, swap_words: bool) -> Result<FuzzyPattern> {
        Ok(FuzzyNameMatcher::build(
            &search.query,
            FuzzyOptions {
                partial_match: search.partial_match,
                swap_words,
            },
        )?)
    }

    fn capped_filter(&self, mut filter: SongFilter) -> SongFilter {
        filter.limit = self.settings.max_results_per_search;
        filter
    }

    fn finish(
        &self,
        kind: &'static str,
        started: Instant,
        entries: &[CatalogEntry],
    ) -> SearchResults {
        let results = SearchResults::from_entries(&self.graph, entries);
        info!(
            kind,
            songs = results.songs.len(),
            anime = results.anime.len(),
            artists = results.artists.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search completed"
        );
        results
    }
}
