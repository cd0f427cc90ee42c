use crate::models::PlayerRecord;
use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::Path;

const HEADER: [&str; 10] = [
    "league",
    "team",
    "player",
    "matches",
    "assists",
    "xAG",
    "minutes",
    "position",
    "assists_minus_xag",
    "assists_minus_xag_90",
];

/// Write the three ranked views into one workbook, one sheet per view.
pub fn export_workbook(
    subperformers: &[PlayerRecord],
    overperformers: &[PlayerRecord],
    per90: &[PlayerRecord],
    path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Subperformers")?;
        write_records(sheet, subperformers)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Overperformers")?;
        write_records(sheet, overperformers)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Per 90 Minutes")?;
        write_records(sheet, per90)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_records(worksheet: &mut Worksheet, records: &[PlayerRecord]) -> Result<()> {
    for (col, title) in HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }
    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        worksheet.write_string(row, 0, &record.league)?;
        worksheet.write_string(row, 1, &record.team)?;
        worksheet.write_string(row, 2, &record.player)?;
        worksheet.write_number(row, 3, record.matches as f64)?;
        worksheet.write_number(row, 4, record.assists as f64)?;
        worksheet.write_number(row, 5, round2(record.xag))?;
        worksheet.write_number(row, 6, record.minutes as f64)?;
        worksheet.write_string(row, 7, &record.position)?;
        worksheet.write_number(row, 8, round2(record.assists_minus_xag))?;
        worksheet.write_number(row, 9, round2(record.assists_minus_xag_90))?;
    }
    Ok(())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
