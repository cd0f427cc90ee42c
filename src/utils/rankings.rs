use crate::models::PlayerRecord;

/// Ranked views are capped at this many entries.
pub const TOP_N: usize = 100;

/// xAG floor for the per-90 leaderboard; small samples make the rate noisy.
pub const PER90_MIN_XAG: f64 = 5.0;

fn sorted_by_diff(records: &[PlayerRecord], descending: bool) -> Vec<PlayerRecord> {
    let mut out: Vec<PlayerRecord> = records.to_vec();
    // Stable sort; non-finite values compare equal like the rest of the
    // analysis code.
    out.sort_by(|a, b| {
        let ord = a
            .assists_minus_xag
            .partial_cmp(&b.assists_minus_xag)
            .unwrap_or(std::cmp::Ordering::Equal);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    out
}

/// Players whose assists fall furthest short of xAG, worst first.
pub fn top_subperformers(records: &[PlayerRecord], limit: usize) -> Vec<PlayerRecord> {
    sorted_by_diff(records, false).into_iter().take(limit).collect()
}

/// Players whose assists exceed xAG the most, best first.
pub fn top_overperformers(records: &[PlayerRecord], limit: usize) -> Vec<PlayerRecord> {
    sorted_by_diff(records, true).into_iter().take(limit).collect()
}

/// Best per-90 overperformance among players with at least 5 xAG.
pub fn top_per90(records: &[PlayerRecord], limit: usize) -> Vec<PlayerRecord> {
    let mut out: Vec<PlayerRecord> = records
        .iter()
        .filter(|r| r.xag >= PER90_MIN_XAG)
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        b.assists_minus_xag_90
            .partial_cmp(&a.assists_minus_xag_90)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out.into_iter().take(limit).collect()
}

/// User-adjustable dashboard filters, applied before re-ranking.
#[derive(Debug, Clone, Default)]
pub struct StatFilters {
    pub leagues: Vec<String>,
    pub teams: Vec<String>,
    pub player_query: String,
    pub min_matches: u32,
    pub min_xag: f64,
}

impl StatFilters {
    /// Build filters from raw query pairs; repeated `league`/`team` keys
    /// accumulate, unknown keys are ignored.
    pub fn from_query(pairs: &[(String, String)]) -> Self {
        let mut filters = StatFilters::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "league" => filters.leagues.push(value.to_string()),
                "team" => filters.teams.push(value.to_string()),
                "q" => filters.player_query = value.to_string(),
                "min_matches" => {
                    filters.min_matches = value.parse().unwrap_or(0);
                }
                "min_xag" => {
                    filters.min_xag = value.parse().unwrap_or(0.0);
                }
                _ => {}
            }
        }
        filters
    }

    pub fn matches(&self, record: &PlayerRecord) -> bool {
        if !self.leagues.is_empty() && !self.leagues.contains(&record.league) {
            return false;
        }
        if !self.teams.is_empty() && !self.teams.contains(&record.team) {
            return false;
        }
        if !self.player_query.is_empty()
            && !record
                .player
                .to_lowercase()
                .contains(&self.player_query.to_lowercase())
        {
            return false;
        }
        record.matches >= self.min_matches && record.xag >= self.min_xag
    }

    pub fn apply(&self, records: &[PlayerRecord]) -> Vec<PlayerRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    /// Re-encode as a query string so links between tabs keep the filters.
    pub fn query_string(&self) -> String {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for league in &self.leagues {
            pairs.push(("league".to_string(), league.clone()));
        }
        for team in &self.teams {
            pairs.push(("team".to_string(), team.clone()));
        }
        if !self.player_query.is_empty() {
            pairs.push(("q".to_string(), self.player_query.clone()));
        }
        if self.min_matches > 0 {
            pairs.push(("min_matches".to_string(), self.min_matches.to_string()));
        }
        if self.min_xag > 0.0 {
            pairs.push(("min_xag".to_string(), self.min_xag.to_string()));
        }
        serde_urlencoded::to_string(&pairs).unwrap_or_default()
    }
}
