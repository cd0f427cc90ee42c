pub mod models;
pub mod scrapers;
pub mod utils;

pub use models::*;
pub use scrapers::*;
pub use utils::*;

use anyhow::{Context, Result};
use scrapers::fbref::FbrefClient;
use std::path::Path;
use tracing::warn;
use utils::aggregate::aggregate_players;
use utils::columns::resolve_rows;
use utils::data::{load_rows_from_cache, save_rows_to_cache};

/// Cache file for resolved player-season rows.
pub const ROWS_CACHE_FILE: &str = "cache/fbref_cache.json";

/// Fetch every covered season, resolve columns, and aggregate per player.
///
/// The combined Big-5 table is the primary source; if any season of it
/// fails, the per-league pages are scraped instead. The returned records
/// are qualified (over 450 minutes, positive xAG) and aggregated across
/// seasons per (league, team, player).
pub async fn fetch_player_stats(use_cache: bool) -> Result<Vec<PlayerRecord>> {
    let rows = if use_cache && Path::new(ROWS_CACHE_FILE).exists() {
        load_rows_from_cache(ROWS_CACHE_FILE)?
    } else {
        let rows = fetch_all_rows().await?;
        save_rows_to_cache(&rows, ROWS_CACHE_FILE)?;
        rows
    };

    if rows.is_empty() {
        return Err(PipelineError::EmptySource.into());
    }
    Ok(aggregate_players(&rows))
}

async fn fetch_all_rows() -> Result<Vec<ResolvedRow>> {
    let client = FbrefClient::new();

    match fetch_combined(&client).await {
        Ok(rows) if !rows.is_empty() => return Ok(rows),
        Ok(_) => warn!("combined source returned no rows, falling back to league pages"),
        Err(e) => warn!(error = %e, "combined source failed, falling back to league pages"),
    }

    fetch_per_league(&client).await
}

async fn fetch_combined(client: &FbrefClient) -> Result<Vec<ResolvedRow>> {
    let mut rows = Vec::new();
    for season in SEASONS {
        let table = client.fetch_big5_season(season).await.with_context(|| {
            format!("Failed to fetch combined stats for {}", season_label(season))
        })?;
        rows.extend(resolve_rows(&table)?);
    }
    Ok(rows)
}

async fn fetch_per_league(client: &FbrefClient) -> Result<Vec<ResolvedRow>> {
    let mut rows = Vec::new();
    for league in League::ALL {
        for season in SEASONS {
            let table = client
                .fetch_league_season(league, season)
                .await
                .with_context(|| {
                    format!(
                        "Failed to fetch {} stats for {}",
                        league.name(),
                        season_label(season)
                    )
                })?;
            rows.extend(resolve_rows(&table)?);
        }
    }
    Ok(rows)
}
