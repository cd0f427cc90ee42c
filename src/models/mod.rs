use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The five leagues covered by the per-league fallback source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum League {
    PremierLeague,
    LaLiga,
    Ligue1,
    Bundesliga,
    SerieA,
}

impl League {
    pub const ALL: [League; 5] = [
        League::PremierLeague,
        League::LaLiga,
        League::Ligue1,
        League::Bundesliga,
        League::SerieA,
    ];

    /// Display name, matching the source library's league codes.
    pub fn name(&self) -> &'static str {
        match self {
            League::PremierLeague => "ENG-Premier League",
            League::LaLiga => "ESP-La Liga",
            League::Ligue1 => "FRA-Ligue 1",
            League::Bundesliga => "GER-Bundesliga",
            League::SerieA => "ITA-Serie A",
        }
    }

    /// FBref competition id used in stats page URLs.
    pub fn comp_id(&self) -> u32 {
        match self {
            League::PremierLeague => 9,
            League::LaLiga => 12,
            League::Ligue1 => 13,
            League::Bundesliga => 20,
            League::SerieA => 11,
        }
    }

    /// URL slug for the per-league stats page.
    pub fn slug(&self) -> &'static str {
        match self {
            League::PremierLeague => "Premier-League",
            League::LaLiga => "La-Liga",
            League::Ligue1 => "Ligue-1",
            League::Bundesliga => "Bundesliga",
            League::SerieA => "Serie-A",
        }
    }

    /// Map a combined-table competition cell ("eng Premier League") to a league.
    pub fn from_comp_cell(cell: &str) -> Option<League> {
        let lower = cell.trim().to_lowercase();
        if lower.contains("premier league") {
            Some(League::PremierLeague)
        } else if lower.contains("la liga") {
            Some(League::LaLiga)
        } else if lower.contains("ligue 1") {
            Some(League::Ligue1)
        } else if lower.contains("bundesliga") {
            Some(League::Bundesliga)
        } else if lower.contains("serie a") {
            Some(League::SerieA)
        } else {
            None
        }
    }
}

/// Seasons covered by the analysis, in the source's short code form.
pub const SEASONS: [&str; 8] = [
    "1718", "1819", "1920", "2021", "2122", "2223", "2324", "2425",
];

/// Expand a short season code ("1718") to the URL form ("2017-2018").
pub fn season_label(code: &str) -> String {
    if code.len() == 4 {
        let start: u32 = code[..2].parse().unwrap_or(0);
        let end: u32 = code[2..].parse().unwrap_or(0);
        format!("20{:02}-20{:02}", start, end)
    } else {
        code.to_string()
    }
}

/// One scraped stats table: ordered column labels plus player rows.
///
/// Column names are not contractually stable across source versions, so the
/// labels are kept verbatim for the column resolver to interpret.
#[derive(Debug, Clone)]
pub struct RawStatTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawStatRow>,
}

/// One raw row: the index fields plus every stat cell in column order.
#[derive(Debug, Clone)]
pub struct RawStatRow {
    pub league: String,
    pub season: String,
    pub team: String,
    pub player: String,
    pub values: Vec<String>,
}

/// A raw row narrowed to the five fields the analysis needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRow {
    pub league: String,
    pub season: String,
    pub team: String,
    pub player: String,
    pub position: String,
    pub matches: u32,
    pub minutes: u32,
    pub assists: u32,
    pub xag: f64,
}

/// A player aggregated across seasons, keyed by (league, team, player).
///
/// A player who appears for multiple teams keeps one record per team;
/// cross-team totals are never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub league: String,
    pub team: String,
    pub player: String,
    pub matches: u32,
    pub assists: u32,
    #[serde(rename = "xAG")]
    pub xag: f64,
    pub minutes: u32,
    pub position: String,
    pub assists_minus_xag: f64,
    pub assists_minus_xag_90: f64,
}

impl PlayerRecord {
    /// Format a record as a readable summary line.
    pub fn format(&self) -> String {
        format!(
            "{} ({}, {}) | MP: {} | Assists: {} | xAG: {:.2} | Diff: {:+.2} | Diff/90: {:+.3}",
            self.player,
            self.team,
            self.league,
            self.matches,
            self.assists,
            self.xag,
            self.assists_minus_xag,
            self.assists_minus_xag_90,
        )
    }
}

/// Failures the pipeline can report beyond plain I/O errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no player rows returned by any source")]
    EmptySource,
    #[error("stat table has {found} columns, positional fallback needs at least {needed}")]
    TooFewColumns { found: usize, needed: usize },
}
