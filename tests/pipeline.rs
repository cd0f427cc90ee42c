use fbref_xag::aggregate::{aggregate_players, aggregate_rows};
use fbref_xag::columns::resolve_rows;
use fbref_xag::models::{RawStatRow, RawStatTable, ResolvedRow};
use fbref_xag::rankings::{top_overperformers, top_per90, top_subperformers, StatFilters, TOP_N};
use fbref_xag::scrapers::fbref::parse_standard_table;

fn season_row(
    league: &str,
    season: &str,
    team: &str,
    player: &str,
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
        position: "MF".to_string(),
        matches,
        minutes,
        assists,
        xag,
    }
}

#[test]
fn scraped_table_flows_through_resolution_and_aggregation() {
    let page = r#"
        <table id="stats_standard">
          <thead>
            <tr>
              <th></th><th></th><th></th>
              <th colspan="2">Playing Time</th>
              <th>Performance</th>
              <th>Expected</th>
            </tr>
            <tr>
              <th data-stat="ranker">Rk</th>
              <th data-stat="player">Player</th>
              <th data-stat="position">Pos</th>
              <th data-stat="games">MP</th>
              <th data-stat="minutes">Min</th>
              <th data-stat="assists">Ast</th>
              <th data-stat="xg_assist">xAG</th>
            </tr>
          </thead>
          <tbody>
            <tr>
              <th data-stat="ranker">1</th>
              <td data-stat="player">Thomas Müller</td>
              <td data-stat="position">FW</td>
              <td data-stat="games">30</td>
              <td data-stat="minutes">2,400</td>
              <td data-stat="assists">14</td>
              <td data-stat="xg_assist">9.5</td>
            </tr>
          </tbody>
        </table>"#;

    let table = parse_standard_table(page, Some("GER-Bundesliga"), "1920").expect("table parses");
    let rows = resolve_rows(&table).expect("columns resolve");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].minutes, 2400);

    let records = aggregate_players(&rows);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].player, "Thomas Müller");
    assert!((records[0].assists_minus_xag - 4.5).abs() < 1e-9);
}

#[test]
fn multi_season_totals_feed_the_rankings() {
    // Two seasons each for two players at different clubs.
    let rows = vec![
        season_row("ENG-Premier League", "2223", "Arsenal", "A", 20, 1800, 4, 7.0),
        season_row("ENG-Premier League", "2324", "Arsenal", "A", 20, 1800, 5, 8.0),
        season_row("ESP-La Liga", "2223", "Real Madrid", "B", 25, 2250, 9, 5.0),
        season_row("ESP-La Liga", "2324", "Real Madrid", "B", 25, 2250, 10, 6.0),
    ];

    let records = aggregate_players(&rows);
    assert_eq!(records.len(), 2);

    // A: 9 assists vs 15 xAG over 3600 minutes.
    let a = records.iter().find(|r| r.player == "A").unwrap();
    assert_eq!(a.matches, 40);
    assert!((a.assists_minus_xag - (-6.0)).abs() < 1e-9);
    assert!((a.assists_minus_xag_90 - (-6.0 / 3600.0 * 90.0)).abs() < 1e-9);

    // B: 19 assists vs 11 xAG.
    let b = records.iter().find(|r| r.player == "B").unwrap();
    assert!((b.assists_minus_xag - 8.0).abs() < 1e-9);

    let over = top_overperformers(&records, TOP_N);
    assert_eq!(over[0].player, "B");
    let sub = top_subperformers(&records, TOP_N);
    assert_eq!(sub[0].player, "A");

    // Both clear the 5 xAG floor, so per-90 keeps both, B first.
    let per90 = top_per90(&records, TOP_N);
    assert_eq!(per90.len(), 2);
    assert_eq!(per90[0].player, "B");
}

#[test]
fn qualification_drops_small_samples_and_zero_xag() {
    let rows = vec![
        season_row("ITA-Serie A", "2425", "Inter", "regular", 30, 2700, 6, 5.5),
        season_row("ITA-Serie A", "2425", "Inter", "cameo", 8, 300, 1, 0.8),
        season_row("ITA-Serie A", "2425", "Inter", "keeper", 38, 3420, 0, 0.0),
    ];

    let records = aggregate_players(&rows);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].player, "regular");
}

#[test]
fn transfers_keep_one_record_per_team() {
    let rows = vec![
        season_row("ENG-Premier League", "2223", "Chelsea", "mover", 15, 1200, 3, 2.0),
        season_row("ENG-Premier League", "2324", "Arsenal", "mover", 20, 1700, 6, 4.0),
    ];

    let records = aggregate_rows(&rows);
    assert_eq!(records.len(), 2);
    let teams: Vec<&str> = records.iter().map(|r| r.team.as_str()).collect();
    assert!(teams.contains(&"Chelsea"));
    assert!(teams.contains(&"Arsenal"));
}

#[test]
fn dashboard_filters_compose_before_ranking() {
    let rows = vec![
        season_row("ENG-Premier League", "2324", "Arsenal", "Bukayo Saka", 35, 3000, 11, 8.0),
        season_row("ENG-Premier League", "2324", "Spurs", "Son Heung-min", 34, 2900, 10, 9.5),
        season_row("ESP-La Liga", "2324", "Girona", "Aleix García", 33, 2800, 5, 6.0),
    ];
    let records = aggregate_players(&rows);

    let filters = StatFilters::from_query(&[
        ("league".to_string(), "ENG-Premier League".to_string()),
        ("min_matches".to_string(), "35".to_string()),
    ]);
    let filtered = filters.apply(&records);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].player, "Bukayo Saka");

    let over = top_overperformers(&filtered, TOP_N);
    assert_eq!(over.len(), 1);
    assert_eq!(over[0].player, "Bukayo Saka");
}

#[test]
fn fallback_indices_handle_unlabelled_tables() {
    // A table whose header gives the heuristic nothing to match; the data
    // still sits at the long-standing column positions.
    let mut columns: Vec<String> = (0..19).map(|i| format!("c{}", i)).collect();
    columns[0] = "Jugador".to_string();

    let mut values = vec![String::new(); 19];
    values[1] = "MF".to_string(); // position
    values[4] = "20".to_string(); // matches
    values[6] = "1800".to_string(); // minutes
    values[9] = "7".to_string(); // assists
    values[18] = "4.2".to_string(); // xAG

    let table = RawStatTable {
        columns,
        rows: vec![RawStatRow {
            league: "FRA-Ligue 1".to_string(),
            season: "2122".to_string(),
            team: "Lyon".to_string(),
            player: "Someone".to_string(),
            values,
        }],
    };

    let rows = resolve_rows(&table).expect("fallback resolves");
    assert_eq!(rows[0].position, "MF");
    assert_eq!(rows[0].matches, 20);
    assert_eq!(rows[0].minutes, 1800);
    assert_eq!(rows[0].assists, 7);
    assert!((rows[0].xag - 4.2).abs() < 1e-9);
}
