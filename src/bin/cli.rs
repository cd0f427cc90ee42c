use anyhow::{Context, Result};
use clap::Parser;
use fbref_xag::charts::{save_diff_bars_png, save_scatter_png};
use fbref_xag::data::save_records_to_csv;
use fbref_xag::excel::export_workbook;
use fbref_xag::fetch_player_stats;
use fbref_xag::models::PlayerRecord;
use fbref_xag::rankings::{top_overperformers, top_per90, top_subperformers, TOP_N};
use std::path::PathBuf;

/// Rank Big-5 league players by assists against expected assisted goals.
#[derive(Parser)]
struct Args {
    /// Directory for CSV, Excel, and chart output
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Reuse the local scrape cache instead of hitting the source
    #[arg(long)]
    use_cache: bool,
}

fn print_preview(title: &str, records: &[PlayerRecord]) {
    println!("\n{}\n", title);
    if records.is_empty() {
        println!("No qualifying players found.");
        return;
    }
    for (i, record) in records.iter().take(5).enumerate() {
        println!("{}. {}", i + 1, record.format());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("Big-5 Assists vs xAG Analysis\n");
    println!("Fetching player stats for all covered seasons...\n");

    let args = Args::parse();
    let use_cache = args.use_cache || std::env::var("USE_CACHE").unwrap_or_default() == "1";

    let records = fetch_player_stats(use_cache)
        .await
        .context("Failed to build player stats")?;
    println!("Aggregated {} qualified players", records.len());

    let subperformers = top_subperformers(&records, TOP_N);
    let overperformers = top_overperformers(&records, TOP_N);
    let per90 = top_per90(&records, TOP_N);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    save_records_to_csv(&subperformers, &args.out_dir.join("top100_subperformers.csv"))?;
    save_records_to_csv(&overperformers, &args.out_dir.join("top100_overperformers.csv"))?;
    save_records_to_csv(&per90, &args.out_dir.join("top100_per90.csv"))?;
    println!("Saved ranked CSVs to {}", args.out_dir.display());

    export_workbook(
        &subperformers,
        &overperformers,
        &per90,
        &args.out_dir.join("top100_assists_analysis.xlsx"),
    )?;
    println!("Saved workbook to top100_assists_analysis.xlsx");

    save_scatter_png(&records, &args.out_dir.join("scatter_xag_vs_assists.png"))?;
    save_diff_bars_png(
        &overperformers,
        "Top 20 Overperformers (Assists - xAG)",
        &args.out_dir.join("bar_top20_overperformers.png"),
    )?;
    save_diff_bars_png(
        &subperformers,
        "Top 20 Subperformers (Assists - xAG)",
        &args.out_dir.join("bar_top20_subperformers.png"),
    )?;
    println!("Saved charts to {}", args.out_dir.display());

    print_preview("TOP SUBPERFORMERS (assists furthest below xAG)", &subperformers);
    print_preview("TOP OVERPERFORMERS (assists furthest above xAG)", &overperformers);
    print_preview("TOP PER-90 OVERPERFORMERS (min 5 xAG)", &per90);

    Ok(())
}
