//! Runs one artist search against the catalog named by `DATABASE_PATH`.
//!
//! ```text
//! DATABASE_PATH=catalog.db cargo run --example search_demo -- "kana hanazawa"
//! ```

use anisong_search::{init_logging, ArtistSearch, CoreConfig, MatchPolicy, SearchService};
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CoreConfig::from_env().context("reading configuration")?;
    init_logging(config.logging.clone()).context("initializing logging")?;

    let query = std::env::args()
        .nth(1)
        .context("usage: search_demo <artist name>")?;

    let service = SearchService::bootstrap(&config).await?;
    let search = ArtistSearch::by_name(query, true).with_policy(MatchPolicy {
        group_granularity: 1,
        max_other_artists: 2,
        ..MatchPolicy::default()
    });
    let results = service.search_by_artist(&search).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
