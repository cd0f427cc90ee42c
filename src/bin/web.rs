use anyhow::{Context, Result};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use fbref_xag::charts::{diff_bars_svg, league_boxes_svg, per90_bars_svg, scatter_svg};
use fbref_xag::data::{load_records_from_csv, records_to_csv_string};
use fbref_xag::fetch_player_stats;
use fbref_xag::models::{League, PlayerRecord};
use fbref_xag::rankings::{
    top_overperformers, top_per90, top_subperformers, StatFilters, TOP_N,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;

/// Serve the interactive assists-vs-xAG dashboard.
#[derive(Parser)]
struct Args {
    /// Serve a prefetched snapshot CSV instead of scraping
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// Reuse the local scrape cache instead of hitting the source
    #[arg(long)]
    use_cache: bool,
}

// Custom filters for formatting
mod filters {
    pub fn round2(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:.2}", value))
    }

    pub fn signed2(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:+.2}", value))
    }

    pub fn signed3(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:+.3}", value))
    }
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    active_page: String,
    leagues: Vec<String>,
    teams: Vec<String>,
    filters: StatFilters,
    query_string: String,
    player_count: usize,
    team_count: usize,
    league_count: usize,
    last_updated: String,
    best_overperformers: Vec<PlayerRecord>,
    worst_subperformers: Vec<PlayerRecord>,
}

#[derive(Template)]
#[template(path = "rankings.html")]
struct RankingsTemplate {
    active_page: String,
    leagues: Vec<String>,
    teams: Vec<String>,
    filters: StatFilters,
    query_string: String,
    title: String,
    download: String,
    records: Vec<PlayerRecord>,
}

#[derive(Template)]
#[template(path = "charts.html")]
struct ChartsTemplate {
    active_page: String,
    leagues: Vec<String>,
    teams: Vec<String>,
    filters: StatFilters,
    query_string: String,
    scatter: String,
    over_bars: String,
    sub_bars: String,
    per90_bars: String,
    league_boxes: String,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    active_page: String,
    leagues: Vec<String>,
    teams: Vec<String>,
    filters: StatFilters,
    query_string: String,
    message: String,
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Scraped data goes stale after this many seconds; snapshot mode never refreshes.
const REFRESH_AFTER_SECS: i64 = 3600;

struct CachedStats {
    records: Vec<PlayerRecord>,
    fetched_at: DateTime<Utc>,
}

type SharedData = Arc<RwLock<Option<CachedStats>>>;

#[derive(Clone)]
struct AppState {
    data: SharedData,
    snapshot: bool,
    use_cache: bool,
}

fn fresh(cached: &CachedStats, snapshot: bool) -> bool {
    snapshot || (Utc::now() - cached.fetched_at).num_seconds() < REFRESH_AFTER_SECS
}

/// Return the cached records, refreshing them first when they are stale.
/// A failed refresh keeps serving the stale copy.
async fn current_records(state: &AppState) -> Option<Vec<PlayerRecord>> {
    {
        let guard = state.data.read().await;
        if let Some(cached) = guard.as_ref() {
            if fresh(cached, state.snapshot) {
                return Some(cached.records.clone());
            }
        }
    }

    let mut guard = state.data.write().await;
    // Another request may have refreshed while we waited for the lock.
    if let Some(cached) = guard.as_ref() {
        if fresh(cached, state.snapshot) {
            return Some(cached.records.clone());
        }
    }

    match fetch_player_stats(state.use_cache).await {
        Ok(records) => {
            let out = records.clone();
            *guard = Some(CachedStats {
                records,
                fetched_at: Utc::now(),
            });
            Some(out)
        }
        Err(e) => {
            tracing::error!(error = %e, "data refresh failed");
            guard.as_ref().map(|cached| cached.records.clone())
        }
    }
}

/// Render the error banner inside the normal page chrome so the nav and
/// filter form stay usable while the data source is down.
fn error_page(active_page: &str, message: &str) -> Response {
    let template = ErrorTemplate {
        active_page: active_page.to_string(),
        leagues: league_names(),
        teams: Vec::new(),
        filters: StatFilters::default(),
        query_string: String::new(),
        message: message.to_string(),
    };
    match template.render() {
        Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render template: {}", err),
        )
            .into_response(),
    }
}

async fn load(state: &AppState, active_page: &str) -> Result<Vec<PlayerRecord>, Response> {
    match current_records(state).await {
        Some(records) => Ok(records),
        None => Err(error_page(
            active_page,
            "No player data is loaded yet. The source could not be reached \
             on startup and no cached copy exists.",
        )),
    }
}

fn league_names() -> Vec<String> {
    League::ALL.iter().map(|l| l.name().to_string()).collect()
}

fn team_names(records: &[PlayerRecord]) -> Vec<String> {
    let mut teams: Vec<String> = records.iter().map(|r| r.team.clone()).collect();
    teams.sort();
    teams.dedup();
    teams
}

async fn home(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let records = match load(&state, "home").await {
        Ok(records) => records,
        Err(resp) => return resp,
    };

    let last_updated = {
        let guard = state.data.read().await;
        match guard.as_ref() {
            Some(cached) if state.snapshot => {
                format!("snapshot loaded {}", cached.fetched_at.format("%Y-%m-%d %H:%M UTC"))
            }
            Some(cached) => cached.fetched_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            None => String::new(),
        }
    };

    let filters = StatFilters::from_query(&pairs);
    let filtered = filters.apply(&records);

    let template = HomeTemplate {
        active_page: "home".to_string(),
        leagues: league_names(),
        teams: team_names(&records),
        query_string: filters.query_string(),
        player_count: filtered.len(),
        team_count: team_names(&filtered).len(),
        league_count: {
            let mut leagues: Vec<&str> = filtered.iter().map(|r| r.league.as_str()).collect();
            leagues.sort();
            leagues.dedup();
            leagues.len()
        },
        last_updated,
        best_overperformers: top_overperformers(&filtered, 3),
        worst_subperformers: top_subperformers(&filtered, 3),
        filters,
    };

    HtmlTemplate(template).into_response()
}

async fn ranking_page(
    state: &AppState,
    pairs: &[(String, String)],
    active_page: &str,
    title: &str,
    rank: fn(&[PlayerRecord], usize) -> Vec<PlayerRecord>,
) -> Response {
    let records = match load(state, active_page).await {
        Ok(records) => records,
        Err(resp) => return resp,
    };

    let filters = StatFilters::from_query(pairs);
    let filtered = filters.apply(&records);

    let template = RankingsTemplate {
        active_page: active_page.to_string(),
        leagues: league_names(),
        teams: team_names(&records),
        query_string: filters.query_string(),
        title: title.to_string(),
        download: format!("/download/{}.csv", active_page),
        records: rank(&filtered, TOP_N),
        filters,
    };

    HtmlTemplate(template).into_response()
}

async fn overperformers(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    ranking_page(
        &state,
        &pairs,
        "overperformers",
        "Top 100 Overperformers (Assists above xAG)",
        top_overperformers,
    )
    .await
}

async fn subperformers(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    ranking_page(
        &state,
        &pairs,
        "subperformers",
        "Top 100 Subperformers (Assists below xAG)",
        top_subperformers,
    )
    .await
}

async fn per90(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    ranking_page(
        &state,
        &pairs,
        "per90",
        "Top 100 Per-90 Overperformers (min 5 xAG)",
        top_per90,
    )
    .await
}

async fn charts(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let records = match load(&state, "charts").await {
        Ok(records) => records,
        Err(resp) => return resp,
    };

    let filters = StatFilters::from_query(&pairs);
    let filtered = filters.apply(&records);

    let rendered = scatter_svg(&filtered)
        .and_then(|scatter| {
            Ok((
                scatter,
                diff_bars_svg(
                    &top_overperformers(&filtered, TOP_N),
                    "Top 30 Overperformers",
                    30,
                )?,
                diff_bars_svg(
                    &top_subperformers(&filtered, TOP_N),
                    "Top 30 Subperformers",
                    30,
                )?,
                per90_bars_svg(
                    &top_per90(&filtered, TOP_N),
                    "Top 20 Per-90 Overperformers (min 5 xAG)",
                    20,
                )?,
                league_boxes_svg(&filtered)?,
            ))
        });
    let (scatter, over_bars, sub_bars, per90_bars, league_boxes) = match rendered {
        Ok(svgs) => svgs,
        Err(e) => {
            tracing::error!(error = %e, "chart rendering failed");
            return error_page("charts", "The charts could not be rendered for this data.");
        }
    };

    let template = ChartsTemplate {
        active_page: "charts".to_string(),
        leagues: league_names(),
        teams: team_names(&records),
        query_string: filters.query_string(),
        scatter,
        over_bars,
        sub_bars,
        per90_bars,
        league_boxes,
        filters,
    };

    HtmlTemplate(template).into_response()
}

async fn download(
    State(state): State<AppState>,
    Path(file): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let records = match load(&state, "home").await {
        Ok(records) => records,
        Err(resp) => return resp,
    };

    let filters = StatFilters::from_query(&pairs);
    let filtered = filters.apply(&records);

    let view = match file.strip_suffix(".csv") {
        Some(view) => view,
        None => return (StatusCode::NOT_FOUND, "Unknown download").into_response(),
    };
    let rows = match view {
        "overperformers" => top_overperformers(&filtered, TOP_N),
        "subperformers" => top_subperformers(&filtered, TOP_N),
        "per90" => top_per90(&filtered, TOP_N),
        "all" => filtered,
        _ => return (StatusCode::NOT_FOUND, "Unknown download").into_response(),
    };

    match records_to_csv_string(&rows) {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to build CSV: {}", e),
        )
            .into_response(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let use_cache = args.use_cache || std::env::var("USE_CACHE").unwrap_or_default() == "1";
    let csv = args
        .csv
        .or_else(|| std::env::var("DATA_CSV").ok().map(PathBuf::from));

    let (data, snapshot) = match &csv {
        Some(path) => {
            let records = load_records_from_csv(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
            println!("Loaded {} players from {}", records.len(), path.display());
            (
                Arc::new(RwLock::new(Some(CachedStats {
                    records,
                    fetched_at: Utc::now(),
                }))),
                true,
            )
        }
        None => {
            println!("Fetching player stats...");
            let data = match fetch_player_stats(use_cache).await {
                Ok(records) => {
                    println!("Loaded {} qualified players", records.len());
                    Arc::new(RwLock::new(Some(CachedStats {
                        records,
                        fetched_at: Utc::now(),
                    })))
                }
                Err(e) => {
                    eprintln!("Error fetching data: {}", e);
                    eprintln!("Server will start but pages may show errors");
                    Arc::new(RwLock::new(None))
                }
            };
            (data, false)
        }
    };

    let state = AppState {
        data,
        snapshot,
        use_cache,
    };

    println!("\nStarting web server at http://{}", args.bind);
    println!("Press Ctrl+C to stop\n");

    let app = Router::new()
        // This will serve files from the "static" directory at the "/static" URL path
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(home))
        .route("/overperformers", get(overperformers))
        .route("/subperformers", get(subperformers))
        .route("/per90", get(per90))
        .route("/charts", get(charts))
        .route("/download/:file", get(download))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_page_keeps_chrome_and_reports_500() {
        let resp = error_page("home", "source unreachable");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let template = ErrorTemplate {
            active_page: "home".to_string(),
            leagues: league_names(),
            teams: Vec::new(),
            filters: StatFilters::default(),
            query_string: String::new(),
            message: "source unreachable".to_string(),
        };
        let html = template.render().unwrap();
        assert!(html.contains("source unreachable"));
        assert!(html.contains("banner error"));
        // The nav and filter form survive so the page stays usable.
        assert!(html.contains("<nav>"));
        assert!(html.contains("Apply filters"));
    }

    #[test]
    fn test_charts_template_embeds_all_five_charts() {
        let template = ChartsTemplate {
            active_page: "charts".to_string(),
            leagues: league_names(),
            teams: Vec::new(),
            filters: StatFilters::default(),
            query_string: String::new(),
            scatter: "<svg id=\"scatter\"/>".to_string(),
            over_bars: "<svg id=\"over\"/>".to_string(),
            sub_bars: "<svg id=\"sub\"/>".to_string(),
            per90_bars: "<svg id=\"per90\"/>".to_string(),
            league_boxes: "<svg id=\"boxes\"/>".to_string(),
        };
        let html = template.render().unwrap();
        for id in ["scatter", "over", "sub", "per90", "boxes"] {
            assert!(html.contains(&format!("<svg id=\"{}\"/>", id)));
        }
    }
}
