use crate::models::PlayerRecord;
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const PNG_SIZE: (u32, u32) = (1200, 800);
const SVG_SIZE: (u32, u32) = (900, 560);

/// How many players the static bar-chart exports show.
pub const BAR_TOP_N: usize = 20;

fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max <= 0.0 {
        1.0
    } else {
        max * 1.1
    }
}

fn diff_color(diff: f64) -> RGBColor {
    if diff >= 0.0 {
        RGBColor(46, 160, 67)
    } else {
        RGBColor(218, 54, 51)
    }
}

fn draw_scatter<DB>(root: &DrawingArea<DB, Shift>, records: &[PlayerRecord]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let x_max = axis_max(records.iter().map(|r| r.xag));
    let y_max = axis_max(records.iter().map(|r| r.assists as f64));
    let lim = x_max.max(y_max);

    let mut chart = ChartBuilder::on(root)
        .caption("Assists vs Expected Assisted Goals", ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0.0..lim, 0.0..lim)?;
    chart
        .configure_mesh()
        .x_desc("xAG")
        .y_desc("Assists")
        .draw()?;

    // The y = x line splits overperformers from subperformers.
    chart
        .draw_series(LineSeries::new([(0.0, 0.0), (lim, lim)], RED.stroke_width(2)))?
        .label("assists = xAG")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .draw_series(
            records
                .iter()
                .map(|r| Circle::new((r.xag, r.assists as f64), 3, BLUE.mix(0.5).filled())),
        )?
        .label("players")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, BLUE.filled()));

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

fn bar_data(
    records: &[PlayerRecord],
    count: usize,
    value: fn(&PlayerRecord) -> f64,
) -> (Vec<String>, Vec<f64>) {
    let shown = records.iter().take(count);
    let names = shown.clone().map(|r| r.player.clone()).collect();
    let values = shown.map(value).collect();
    (names, values)
}

fn draw_value_bars<DB>(
    root: &DrawingArea<DB, Shift>,
    records: &[PlayerRecord],
    title: &str,
    count: usize,
    value: fn(&PlayerRecord) -> f64,
    x_desc: &str,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (names, values) = bar_data(records, count, value);
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let pad = ((max - min).abs() * 0.1).max(0.5);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(170)
        .build_cartesian_2d(min - pad..max + pad, 0..names.len() as i32)?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(x_desc)
        .y_label_formatter(&|y| {
            // Bars are drawn top-down, so the label index is mirrored.
            let idx = names.len() as i32 - 1 - *y;
            usize::try_from(idx)
                .ok()
                .and_then(|i| names.get(i).cloned())
                .unwrap_or_default()
        })
        .y_labels(names.len())
        .draw()?;

    // Rank 1 at the top of the chart.
    chart.draw_series(values.iter().enumerate().map(|(idx, v)| {
        let y = (values.len() - 1 - idx) as i32;
        Rectangle::new([(0.0, y), (*v, y + 1)], diff_color(*v).filled())
    }))?;
    Ok(())
}

fn league_groups(records: &[PlayerRecord]) -> Vec<(String, Vec<f64>)> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for record in records {
        match groups.iter_mut().find(|(name, _)| *name == record.league) {
            Some((_, values)) => values.push(record.assists_minus_xag),
            None => groups.push((record.league.clone(), vec![record.assists_minus_xag])),
        }
    }
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups
}

fn draw_league_boxes<DB>(root: &DrawingArea<DB, Shift>, records: &[PlayerRecord]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let groups = league_groups(records);
    let min = records
        .iter()
        .map(|r| r.assists_minus_xag)
        .fold(0.0_f64, f64::min);
    let max = records
        .iter()
        .map(|r| r.assists_minus_xag)
        .fold(0.0_f64, f64::max);
    let pad = ((max - min).abs() * 0.1).max(0.5);
    let names: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();

    let mut chart = ChartBuilder::on(root)
        .caption("Assists - xAG by League", ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(55)
        .y_label_area_size(55)
        .build_cartesian_2d(
            (0..groups.len()).into_segmented(),
            (min - pad) as f32..(max + pad) as f32,
        )?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Assists - xAG")
        .x_label_formatter(&|x| match x {
            SegmentValue::CenterOf(i) => names.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(groups.iter().enumerate().map(|(idx, (_, values))| {
        Boxplot::new_vertical(SegmentValue::CenterOf(idx), &Quartiles::new(values))
            .width(28)
            .style(BLUE)
    }))?;
    Ok(())
}

/// Save the scatter of assists against xAG for every qualified player.
pub fn save_scatter_png(records: &[PlayerRecord], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, PNG_SIZE).into_drawing_area();
    draw_scatter(&root, records)?;
    root.present()
        .with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}

/// Save a horizontal bar chart of the leading entries in a ranked view.
pub fn save_diff_bars_png(records: &[PlayerRecord], title: &str, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, PNG_SIZE).into_drawing_area();
    draw_value_bars(
        &root,
        records,
        title,
        BAR_TOP_N,
        |r| r.assists_minus_xag,
        "Assists - xAG",
    )?;
    root.present()
        .with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}

/// Scatter chart as an inline SVG document for the dashboard.
pub fn scatter_svg(records: &[PlayerRecord]) -> Result<String> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, SVG_SIZE).into_drawing_area();
        draw_scatter(&root, records)?;
        root.present()?;
    }
    Ok(buf)
}

/// Ranked-view bar chart over assists minus xAG as an inline SVG document.
pub fn diff_bars_svg(records: &[PlayerRecord], title: &str, count: usize) -> Result<String> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, SVG_SIZE).into_drawing_area();
        draw_value_bars(
            &root,
            records,
            title,
            count,
            |r| r.assists_minus_xag,
            "Assists - xAG",
        )?;
        root.present()?;
    }
    Ok(buf)
}

/// Per-90 rate bar chart as an inline SVG document.
pub fn per90_bars_svg(records: &[PlayerRecord], title: &str, count: usize) -> Result<String> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, SVG_SIZE).into_drawing_area();
        draw_value_bars(
            &root,
            records,
            title,
            count,
            |r| r.assists_minus_xag_90,
            "Assists - xAG per 90",
        )?;
        root.present()?;
    }
    Ok(buf)
}

/// Per-league box plot of assists minus xAG as an inline SVG document.
pub fn league_boxes_svg(records: &[PlayerRecord]) -> Result<String> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, SVG_SIZE).into_drawing_area();
        draw_league_boxes(&root, records)?;
        root.present()?;
    }
    Ok(buf)
}
