use anyhow::{Context, Result};
use clap::Parser;
use fbref_xag::data::save_records_to_csv;
use fbref_xag::fetch_player_stats;
use std::path::PathBuf;

/// Scrape every covered season and write a snapshot CSV for the dashboard.
#[derive(Parser)]
struct Args {
    /// Snapshot file to write
    #[arg(long, default_value = "fbref_data.csv")]
    out: PathBuf,

    /// Reuse the local scrape cache instead of hitting the source
    #[arg(long)]
    use_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let use_cache = args.use_cache || std::env::var("USE_CACHE").unwrap_or_default() == "1";

    println!("Prefetching player stats for all covered seasons...\n");
    let records = fetch_player_stats(use_cache)
        .await
        .context("Failed to build player stats")?;

    save_records_to_csv(&records, &args.out)?;

    let size_kb = std::fs::metadata(&args.out)
        .with_context(|| format!("Failed to stat {}", args.out.display()))?
        .len() as f64
        / 1024.0;
    println!(
        "Saved {} players to {} ({:.1} KB)",
        records.len(),
        args.out.display(),
        size_kb
    );

    Ok(())
}
