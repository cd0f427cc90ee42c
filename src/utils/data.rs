use crate::models::{PlayerRecord, ResolvedRow};
use anyhow::{Context, Result};
use std::path::Path;

/// Save resolved rows to a JSON cache file
pub fn save_rows_to_cache(rows: &[ResolvedRow], cache_file: &str) -> Result<()> {
    if let Some(parent) = Path::new(cache_file).parent() {
        std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
    }
    let json = serde_json::to_string_pretty(rows).context("Failed to serialize resolved rows")?;
    std::fs::write(cache_file, json).context("Failed to write cache file")?;
    Ok(())
}

/// Load resolved rows from a JSON cache file
pub fn load_rows_from_cache(cache_file: &str) -> Result<Vec<ResolvedRow>> {
    let json = std::fs::read_to_string(cache_file).context("Failed to read cache file")?;
    let rows: Vec<ResolvedRow> =
        serde_json::from_str(&json).context("Failed to deserialize resolved rows")?;
    Ok(rows)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Copy of a record with float fields rounded for export.
fn rounded(record: &PlayerRecord) -> PlayerRecord {
    let mut out = record.clone();
    out.xag = round2(out.xag);
    out.assists_minus_xag = round2(out.assists_minus_xag);
    out.assists_minus_xag_90 = round2(out.assists_minus_xag_90);
    out
}

/// Save player records to CSV with two-decimal rounding
pub fn save_records_to_csv(records: &[PlayerRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(rounded(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Load player records from a snapshot CSV (the CSV-dashboard data source)
pub fn load_records_from_csv(path: &Path) -> Result<Vec<PlayerRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: PlayerRecord = row.context("Failed to parse snapshot row")?;
        records.push(record);
    }
    Ok(records)
}

/// Render records as an in-memory CSV string (dashboard downloads)
pub fn records_to_csv_string(records: &[PlayerRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(rounded(record))?;
    }
    let bytes = writer.into_inner().context("Failed to finish CSV buffer")?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PlayerRecord {
        PlayerRecord {
            league: "ENG-Premier League".to_string(),
            team: "Man City".to_string(),
            player: "Kevin De Bruyne".to_string(),
            matches: 37,
            assists: 16,
            xag: 12.3456,
            minutes: 3085,
            position: "MF".to_string(),
            assists_minus_xag: 3.6544,
            assists_minus_xag_90: 0.1066,
        }
    }

    #[test]
    fn test_csv_header_and_rounding() {
        let csv = records_to_csv_string(&[record()]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "league,team,player,matches,assists,xAG,minutes,position,assists_minus_xag,assists_minus_xag_90"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("12.35"));
        assert!(row.contains("3.65"));
        assert!(row.contains("0.11"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = std::env::temp_dir().join("fbref_xag_test_snapshot");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fbref_data.csv");

        save_records_to_csv(&[record()], &path).unwrap();
        let loaded = load_records_from_csv(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].player, "Kevin De Bruyne");
        assert_eq!(loaded[0].assists, 16);
        assert!((loaded[0].xag - 12.35).abs() < 1e-9);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_rows_cache_round_trip() {
        let dir = std::env::temp_dir().join("fbref_xag_test_cache");
        let file = dir.join("fbref_cache.json");
        let rows = vec![ResolvedRow {
            league: "ITA-Serie A".to_string(),
            season: "2223".to_string(),
            team: "Napoli".to_string(),
            player: "Khvicha Kvaratskhelia".to_string(),
            position: "FW".to_string(),
            matches: 34,
            minutes: 2700,
            assists: 10,
            xag: 8.4,
        }];

        save_rows_to_cache(&rows, file.to_str().unwrap()).unwrap();
        let loaded = load_rows_from_cache(file.to_str().unwrap()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].team, "Napoli");

        std::fs::remove_file(&file).ok();
    }
}
