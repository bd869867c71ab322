//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - series lines: `*` for the first series, `+` for the second, `#` after that
//! - selected dates: `|` guide columns
//! - resolved points: `A`, `B`, ... (one letter per series, in load order)

use chrono::{Datelike, NaiveDate};

use crate::app::pipeline::View;
use crate::store::SeriesStore;

const SERIES_GLYPHS: [char; 3] = ['*', '+', '#'];

/// Render both series with the selection guides and point markers.
pub fn render_ascii_plot(store: &SeriesStore, view: &View, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x_min, x_max)) = date_range(store) else {
        return "Plot: no data\n".to_string();
    };
    let (y_min, y_max) = rate_range(store).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first, so guides only fill the gaps and markers can overlay.
    for (slot, series) in store.series().enumerate() {
        let glyph = SERIES_GLYPHS[slot.min(SERIES_GLYPHS.len() - 1)];
        let points: Vec<(f64, f64)> = series
            .points()
            .iter()
            .map(|p| (day_number(p.date), p.rate))
            .collect();
        draw_curve(&mut grid, &points, (x_min, x_max), (y_min, y_max), glyph);
    }

    for &date in &view.selection.accepted {
        let x = day_number(date);
        if x < x_min || x > x_max {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        for row in grid.iter_mut() {
            if row[col] == ' ' {
                row[col] = '|';
            }
        }
    }

    let ids: Vec<_> = store.ids().collect();
    for m in &view.markers {
        let Some(slot) = ids.iter().position(|id| **id == m.series) else {
            continue;
        };
        let x = map_x(day_number(m.date), x_min, x_max, width);
        let y = map_y(m.rate, y_min, y_max, height);
        grid[y][x] = marker_char(slot);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: dates=[{}, {}] | rate=[{y_min:.2}, {y_max:.2}]%\n",
        from_day_number(x_min),
        from_day_number(x_max),
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let mut legend = String::from("Legend:");
    for (slot, id) in ids.iter().enumerate() {
        let glyph = SERIES_GLYPHS[slot.min(SERIES_GLYPHS.len() - 1)];
        legend.push_str(&format!(" {glyph} {id} ({})", marker_char(slot)));
    }
    legend.push_str(" | selected\n");
    out.push_str(&legend);

    out
}

fn marker_char(slot: usize) -> char {
    (b'A' + (slot % 26) as u8) as char
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn from_day_number(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn date_range(store: &SeriesStore) -> Option<(f64, f64)> {
    let first = store.series().filter_map(|s| s.first_date()).min()?;
    let last = store.series().filter_map(|s| s.last_date()).max()?;
    let (x0, x1) = (day_number(first), day_number(last));
    if x1 > x0 { Some((x0, x1)) } else { Some((x0 - 1.0, x1 + 1.0)) }
}

fn rate_range(store: &SeriesStore) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (lo, hi) in store.series().filter_map(|s| s.rate_range()) {
        min_y = min_y.min(lo);
        max_y = max_y.max(hi);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        Some((min_y - 0.5, min_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], points: &[(f64, f64)], x: (f64, f64), y: (f64, f64), ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, v) in points {
        let col = map_x(t, x.0, x.1, width);
        let row = map_y(v, y.0, y.1, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch),
            None => draw_line(grid, col, row, col, row, ch),
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish). Only fills empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::Session;
    use crate::domain::SeriesId;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let mut store = SeriesStore::new();
        store
            .load(SeriesId::new("FED"), vec![(d(2024, 1, 1), 5.0), (d(2024, 1, 10), 5.0)])
            .unwrap();
        store
            .load(SeriesId::new("ECB"), vec![(d(2024, 1, 1), 4.0), (d(2024, 1, 10), 4.0)])
            .unwrap();
        let session = Session::from_store(store);
        let view = session.interact(&[d(2024, 1, 5), d(2024, 1, 10)]);

        let txt = render_ascii_plot(session.store(), &view, 10, 5);
        let expected = concat!(
            "Plot: dates=[2024-01-01, 2024-01-10] | rate=[3.95, 5.05]%\n",
            "*********A\n",
            "    |    |\n",
            "    |    |\n",
            "    |    |\n",
            "+++++++++B\n",
            "Legend: * FED (A) + ECB (B) | selected\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_store_renders_placeholder() {
        let session = Session::from_store(SeriesStore::new());
        let view = session.interact(&[]);
        assert_eq!(render_ascii_plot(session.store(), &view, 20, 5), "Plot: no data\n");
    }
}
