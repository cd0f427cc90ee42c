use crate::models::{season_label, League, RawStatRow, RawStatTable};
use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tracing::info;

/// FBref rate-limits aggressively; pause between page fetches.
const REQUEST_DELAY: Duration = Duration::from_secs(3);

/// Client for FBref player standard-stats pages.
pub struct FbrefClient {
    client: reqwest::Client,
}

impl FbrefClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
                .build()
                .unwrap(),
        }
    }

    /// Fetch one season of the Big-5 combined player table.
    pub async fn fetch_big5_season(&self, season: &str) -> Result<RawStatTable> {
        let label = season_label(season);
        let url = format!(
            "https://fbref.com/en/comps/Big5/{label}/stats/players/{label}-Big-5-European-Leagues-Stats"
        );
        info!(season = %label, "fetching combined Big-5 stats");
        let html = self.fetch_page(&url).await?;
        parse_standard_table(&html, None, season)
    }

    /// Fetch one season of a single league's player table.
    pub async fn fetch_league_season(&self, league: League, season: &str) -> Result<RawStatTable> {
        let label = season_label(season);
        let url = format!(
            "https://fbref.com/en/comps/{}/{label}/stats/{label}-{}-Stats",
            league.comp_id(),
            league.slug()
        );
        info!(league = league.name(), season = %label, "fetching league stats");
        let html = self.fetch_page(&url).await?;
        parse_standard_table(&html, Some(league.name()), season)
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let html = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?
            .error_for_status()
            .with_context(|| format!("Bad status from {url}"))?
            .text()
            .await?;
        tokio::time::sleep(REQUEST_DELAY).await;
        Ok(html)
    }
}

impl Default for FbrefClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the `stats_standard` table out of a page.
///
/// FBref serves most stat tables inside HTML comments to defeat naive
/// scrapers, so when the table is not in the live DOM the comment nodes are
/// scanned and re-parsed. `league` is the page's league for single-league
/// pages; the combined page carries a competition column per row instead.
pub fn parse_standard_table(
    html: &str,
    league: Option<&str>,
    season: &str,
) -> Result<RawStatTable> {
    let selector = Selector::parse("table#stats_standard")
        .ok()
        .context("Invalid table selector")?;

    let document = Html::parse_document(html);
    if let Some(table) = document.select(&selector).next() {
        return build_table(table, league, season);
    }

    for node in document.tree.nodes() {
        if let Node::Comment(comment) = node.value() {
            if !comment.contains("stats_standard") {
                continue;
            }
            let fragment = Html::parse_fragment(comment);
            if let Some(table) = fragment.select(&selector).next() {
                return build_table(table, league, season);
            }
        }
    }

    Err(anyhow!("no stats_standard table found in page"))
}

fn build_table(table: ElementRef, league: Option<&str>, season: &str) -> Result<RawStatTable> {
    let header_row_sel = Selector::parse("thead tr").ok().context("Invalid selector")?;
    let cell_sel = Selector::parse("th, td").ok().context("Invalid selector")?;
    let body_row_sel = Selector::parse("tbody tr").ok().context("Invalid selector")?;

    let header_rows: Vec<ElementRef> = table.select(&header_row_sel).collect();
    let leaf_row = *header_rows.last().context("table has no header rows")?;

    // The over-header row groups columns ("Playing Time", "Per 90 Minutes");
    // expand its labels by colspan so they can be joined onto the leaves.
    let mut groups: Vec<String> = Vec::new();
    if header_rows.len() > 1 {
        for cell in header_rows[0].select(&cell_sel) {
            let span: usize = cell
                .value()
                .attr("colspan")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            let label = cell_text(&cell);
            for _ in 0..span {
                groups.push(label.clone());
            }
        }
    }

    let mut columns = Vec::new();
    let mut data_stats = Vec::new();
    for (idx, cell) in leaf_row.select(&cell_sel).enumerate() {
        let leaf = cell_text(&cell);
        let label = match groups.get(idx) {
            Some(group) if !group.is_empty() => format!("{group} {leaf}"),
            _ => leaf,
        };
        columns.push(label);
        data_stats.push(
            cell.value()
                .attr("data-stat")
                .unwrap_or_default()
                .to_string(),
        );
    }

    let find_stat = |row_cells: &[String], stat: &str| -> String {
        data_stats
            .iter()
            .position(|s| s == stat)
            .and_then(|i| row_cells.get(i))
            .cloned()
            .unwrap_or_default()
    };

    let mut rows = Vec::new();
    for row in table.select(&body_row_sel) {
        // Repeated header rows are interleaved with the data.
        if row.value().attr("class").unwrap_or_default().contains("thead") {
            continue;
        }
        let values: Vec<String> = row.select(&cell_sel).map(|c| cell_text(&c)).collect();
        let player = find_stat(&values, "player");
        if player.is_empty() || player == "Player" {
            continue;
        }
        let team = {
            let team = find_stat(&values, "team");
            if team.is_empty() {
                find_stat(&values, "squad")
            } else {
                team
            }
        };
        let row_league = match league {
            Some(name) => Some(name.to_string()),
            None => League::from_comp_cell(&find_stat(&values, "comp")).map(|l| l.name().to_string()),
        };
        let Some(row_league) = row_league else {
            // Combined-table row from a competition outside the big five.
            continue;
        };
        rows.push(RawStatRow {
            league: row_league,
            season: season.to_string(),
            team,
            player,
            values,
        });
    }

    Ok(RawStatTable { columns, rows })
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEAGUE_PAGE: &str = r#"
        <html><body>
        <table id="stats_standard">
          <thead>
            <tr>
              <th></th><th></th><th></th>
              <th colspan="2">Playing Time</th>
              <th colspan="2">Performance</th>
              <th>Expected</th>
            </tr>
            <tr>
              <th data-stat="ranker">Rk</th>
              <th data-stat="player">Player</th>
              <th data-stat="position">Pos</th>
              <th data-stat="games">MP</th>
              <th data-stat="minutes">Min</th>
              <th data-stat="goals">Gls</th>
              <th data-stat="assists">Ast</th>
              <th data-stat="xg_assist">xAG</th>
            </tr>
          </thead>
          <tbody>
            <tr>
              <th data-stat="ranker">1</th>
              <td data-stat="player">Kevin De Bruyne</td>
              <td data-stat="position">MF</td>
              <td data-stat="games">30</td>
              <td data-stat="minutes">2,500</td>
              <td data-stat="goals">8</td>
              <td data-stat="assists">16</td>
              <td data-stat="xg_assist">12.3</td>
            </tr>
            <tr class="thead"><td colspan="8">spacer</td></tr>
            <tr>
              <th data-stat="ranker"></th>
              <td data-stat="player">Player</td>
              <td data-stat="position"></td>
              <td data-stat="games"></td>
              <td data-stat="minutes"></td>
              <td data-stat="goals"></td>
              <td data-stat="assists"></td>
              <td data-stat="xg_assist"></td>
            </tr>
          </tbody>
        </table>
        </body></html>"#;

    #[test]
    fn test_parse_league_page() {
        let table =
            parse_standard_table(LEAGUE_PAGE, Some("ENG-Premier League"), "1718").unwrap();
        assert_eq!(table.columns[3], "Playing Time MP");
        assert_eq!(table.columns[4], "Playing Time Min");
        assert_eq!(table.columns[7], "Expected xAG");

        // The spacer and repeated-header rows are dropped.
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.player, "Kevin De Bruyne");
        assert_eq!(row.league, "ENG-Premier League");
        assert_eq!(row.season, "1718");
        assert_eq!(row.values[4], "2,500");
    }

    #[test]
    fn test_parse_comment_wrapped_table() {
        let page = format!(
            "<html><body><div id=\"all_stats_standard\"><!--{}--></div></body></html>",
            LEAGUE_PAGE
        );
        let table = parse_standard_table(&page, Some("ENG-Premier League"), "1718").unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_combined_page_maps_competition() {
        let page = r#"
            <table id="stats_standard">
              <thead><tr>
                <th data-stat="ranker">Rk</th>
                <th data-stat="player">Player</th>
                <th data-stat="team">Squad</th>
                <th data-stat="comp">Comp</th>
                <th data-stat="assists">Ast</th>
              </tr></thead>
              <tbody>
                <tr>
                  <th data-stat="ranker">1</th>
                  <td data-stat="player">Lionel Messi</td>
                  <td data-stat="team">Barcelona</td>
                  <td data-stat="comp">es La Liga</td>
                  <td data-stat="assists">12</td>
                </tr>
                <tr>
                  <th data-stat="ranker">2</th>
                  <td data-stat="player">Someone Else</td>
                  <td data-stat="team">Porto</td>
                  <td data-stat="comp">pt Primeira Liga</td>
                  <td data-stat="assists">4</td>
                </tr>
              </tbody>
            </table>"#;
        let table = parse_standard_table(page, None, "1819").unwrap();
        // The non-big-five row is dropped.
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].league, "ESP-La Liga");
        assert_eq!(table.rows[0].team, "Barcelona");
    }

    #[test]
    fn test_missing_table_is_an_error() {
        assert!(parse_standard_table("<html><body></body></html>", None, "1718").is_err());
    }
}
