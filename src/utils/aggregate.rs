use crate::models::{PlayerRecord, ResolvedRow};
use std::collections::HashMap;

/// Minutes a player must exceed to qualify (five full matches).
pub const MIN_MINUTES: u32 = 450;

/// Group resolved rows by (league, team, player) and sum the stats.
///
/// The first contributing row's position is kept. Derived metrics are
/// computed for every record; qualification is a separate step so the
/// arithmetic can be inspected before filtering.
pub fn aggregate_rows(rows: &[ResolvedRow]) -> Vec<PlayerRecord> {
    struct Acc {
        matches: u32,
        assists: u32,
        xag: f64,
        minutes: u32,
        position: String,
    }

    let mut groups: HashMap<(String, String, String), Acc> = HashMap::new();
    for row in rows {
        let key = (row.league.clone(), row.team.clone(), row.player.clone());
        let acc = groups.entry(key).or_insert_with(|| Acc {
            matches: 0,
            assists: 0,
            xag: 0.0,
            minutes: 0,
            position: row.position.clone(),
        });
        acc.matches += row.matches;
        acc.assists += row.assists;
        acc.xag += row.xag;
        acc.minutes += row.minutes;
    }

    let mut records: Vec<PlayerRecord> = groups
        .into_iter()
        .map(|((league, team, player), acc)| {
            let diff = acc.assists as f64 - acc.xag;
            // Guard the zero-minutes case rather than rely on the downstream
            // minutes filter to hide a non-finite rate.
            let diff_per_90 = if acc.minutes > 0 {
                diff / acc.minutes as f64 * 90.0
            } else {
                0.0
            };
            PlayerRecord {
                league,
                team,
                player,
                matches: acc.matches,
                assists: acc.assists,
                xag: acc.xag,
                minutes: acc.minutes,
                position: acc.position,
                assists_minus_xag: diff,
                assists_minus_xag_90: diff_per_90,
            }
        })
        .collect();

    // Deterministic output order so exports are reproducible.
    records.sort_by(|a, b| {
        (&a.league, &a.team, &a.player).cmp(&(&b.league, &b.team, &b.player))
    });
    records
}

/// Keep only records with enough minutes and actual xAG data.
pub fn qualify(records: Vec<PlayerRecord>) -> Vec<PlayerRecord> {
    records
        .into_iter()
        .filter(|r| r.minutes > MIN_MINUTES && r.xag > 0.0)
        .collect()
}

/// Aggregate and qualify in one step: the shape every entry point consumes.
pub fn aggregate_players(rows: &[ResolvedRow]) -> Vec<PlayerRecord> {
    qualify(aggregate_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        league: &str,
        season: &str,
        team: &str,
        player: &str,
        position: &str,
        matches: u32,
        minutes: u32,
        assists: u32,
        xag: f64,
    ) -> ResolvedRow {
        ResolvedRow {
            league: league.to_string(),
            season: season.to_string(),
            team: team.to_string(),
            player: player.to_string(),
            position: position.to_string(),
            matches,
            minutes,
            assists,
            xag,
        }
    }

    #[test]
    fn test_sums_across_seasons() {
        let rows = vec![
            row("ENG-Premier League", "1718", "Arsenal", "A", "MF", 30, 2500, 7, 5.5),
            row("ENG-Premier League", "1819", "Arsenal", "A", "FW", 28, 2300, 5, 6.0),
        ];
        let records = aggregate_rows(&rows);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.matches, 58);
        assert_eq!(rec.assists, 12);
        assert_eq!(rec.minutes, 4800);
        assert!((rec.xag - 11.5).abs() < 1e-9);
        // First contributing row's position wins.
        assert_eq!(rec.position, "MF");
        assert!((rec.assists_minus_xag - 0.5).abs() < 1e-9);
        assert!((rec.assists_minus_xag_90 - 0.5 / 4800.0 * 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_team_records_stay_separate() {
        let rows = vec![
            row("ENG-Premier League", "1718", "Arsenal", "A", "MF", 20, 1800, 4, 3.0),
            row("ENG-Premier League", "1819", "Chelsea", "A", "MF", 20, 1800, 6, 3.0),
        ];
        let records = aggregate_rows(&rows);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_zero_minutes_rate_is_finite() {
        let rows = vec![row("L", "1718", "T", "P", "MF", 0, 0, 0, 0.0)];
        let records = aggregate_rows(&rows);
        assert_eq!(records[0].assists_minus_xag_90, 0.0);
    }

    #[test]
    fn test_qualification_thresholds() {
        let rows = vec![
            row("L", "1718", "T", "enough", "MF", 10, 900, 3, 2.0),
            row("L", "1718", "T", "short minutes", "MF", 5, 450, 3, 2.0),
            row("L", "1718", "T", "no xag", "MF", 10, 900, 3, 0.0),
        ];
        let records = aggregate_players(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].player, "enough");
    }

    #[test]
    fn test_output_order_is_deterministic() {
        let rows = vec![
            row("L", "1718", "T", "Zed", "MF", 10, 900, 1, 1.0),
            row("L", "1718", "T", "Abe", "MF", 10, 900, 1, 1.0),
        ];
        let records = aggregate_rows(&rows);
        assert_eq!(records[0].player, "Abe");
        assert_eq!(records[1].player, "Zed");
    }
}
