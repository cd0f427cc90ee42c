use crate::models::PipelineError;
use anyhow::Result;
use tracing::warn;

/// Positional fallback when heuristic matching resolves fewer than five
/// fields: position, matches, minutes, assists, xAG. The source has shipped
/// this column order for years, but it is not a contract.
pub const FALLBACK_INDICES: [usize; 5] = [1, 4, 6, 9, 18];

/// Positions of the five canonical fields inside a raw stat row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub position: usize,
    pub matches: usize,
    pub minutes: usize,
    pub assists: usize,
    pub xag: usize,
}

/// Resolve the five needed columns from an ordered list of labels.
///
/// Labels vary by source version (sometimes plain, sometimes joined
/// multi-level headers like "Playing Time Min"), so matching is by
/// lower-cased substring with explicit exclusions, first match wins.
/// If fewer than five fields resolve the fixed index list takes over,
/// with a warning naming what the heuristic missed.
pub fn resolve_columns(labels: &[String]) -> Result<ColumnMap> {
    let mut position = None;
    let mut matches = None;
    let mut minutes = None;
    let mut assists = None;
    let mut xag = None;

    for (idx, label) in labels.iter().enumerate() {
        let lower = label.to_lowercase();
        // Multi-level headers join group and leaf; equality checks look at
        // the leaf so "Playing Time MP" still reads as "MP".
        let leaf = lower.rsplit(' ').next().unwrap_or(&lower);

        if position.is_none()
            && lower.contains("pos")
            && !lower.contains("composed")
            && !lower.contains("deposit")
        {
            position = Some(idx);
        } else if matches.is_none() && (leaf == "mp" || lower.contains("matches")) {
            matches = Some(idx);
        } else if minutes.is_none()
            && lower.contains("min")
            && !lower.contains("per")
            && !lower.contains("90")
        {
            minutes = Some(idx);
        } else if assists.is_none()
            && (leaf == "ast" || lower.contains("assist"))
            && !lower.contains("xag")
        {
            assists = Some(idx);
        } else if xag.is_none() && lower.contains("xag") {
            xag = Some(idx);
        }
    }

    if let (Some(position), Some(matches), Some(minutes), Some(assists), Some(xag)) =
        (position, matches, minutes, assists, xag)
    {
        return Ok(ColumnMap {
            position,
            matches,
            minutes,
            assists,
            xag,
        });
    }

    let mut missing = Vec::new();
    if position.is_none() {
        missing.push("position");
    }
    if matches.is_none() {
        missing.push("matches");
    }
    if minutes.is_none() {
        missing.push("minutes");
    }
    if assists.is_none() {
        missing.push("assists");
    }
    if xag.is_none() {
        missing.push("xAG");
    }
    warn!(
        missing = missing.join(", "),
        "column heuristic incomplete, using fixed indices {:?}", FALLBACK_INDICES
    );

    let needed = FALLBACK_INDICES[4] + 1;
    if labels.len() < needed {
        return Err(PipelineError::TooFewColumns {
            found: labels.len(),
            needed,
        }
        .into());
    }

    Ok(ColumnMap {
        position: FALLBACK_INDICES[0],
        matches: FALLBACK_INDICES[1],
        minutes: FALLBACK_INDICES[2],
        assists: FALLBACK_INDICES[3],
        xag: FALLBACK_INDICES[4],
    })
}

/// Narrow a raw table to resolved rows using one column resolution pass.
///
/// Cell parsing is tolerant: empty, dash, or malformed cells read as zero,
/// matching how the source renders players with no recorded value.
pub fn resolve_rows(table: &crate::models::RawStatTable) -> Result<Vec<crate::models::ResolvedRow>> {
    let map = resolve_columns(&table.columns)?;
    let cell = |row: &crate::models::RawStatRow, idx: usize| -> String {
        row.values.get(idx).cloned().unwrap_or_default()
    };

    Ok(table
        .rows
        .iter()
        .map(|row| crate::models::ResolvedRow {
            league: row.league.clone(),
            season: row.season.clone(),
            team: row.team.clone(),
            player: row.player.clone(),
            position: cell(row, map.position),
            matches: parse_count(&cell(row, map.matches)),
            minutes: parse_count(&cell(row, map.minutes)),
            assists: parse_count(&cell(row, map.assists)),
            xag: parse_float(&cell(row, map.xag)),
        })
        .collect())
}

fn parse_count(raw: &str) -> u32 {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return 0;
    }
    cleaned.parse().unwrap_or(0)
}

fn parse_float(raw: &str) -> f64 {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }
    cleaned.parse().unwrap_or(0.0)
}
