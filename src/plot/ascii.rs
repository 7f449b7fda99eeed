//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, deterministic output. Two charts:
//!
//! - `averages`: close `.`, short EMA `s`, long EMA `l`
//! - `signals`: close `-`, buy `B`, sell `S`

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;

use crate::domain::{SignalFrame, SignalKind};

/// Which chart to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartKind {
    /// Close price with the short and long moving averages.
    Averages,
    /// Close price with buy/sell markers.
    Signals,
}

/// Render a chart of the frame into a `width` x `height` grid (plus header lines).
pub fn render_ascii_chart(frame: &SignalFrame, kind: ChartKind, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (Some(first), Some(last)) = (frame.first_date(), frame.last_date()) else {
        return "Plot: no data\n".to_string();
    };

    let x_min = day_number(first);
    let mut x_max = day_number(last);
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }

    let close: Vec<(f64, f64)> = frame.records().iter().map(|r| (day_number(r.date), r.close)).collect();

    let mut grid = vec![vec![' '; width]; height];

    let (y_min, y_max, legend) = match kind {
        ChartKind::Averages => {
            let short: Vec<(f64, f64)> = frame
                .iter()
                .map(|(rec, row)| (day_number(rec.date), row.ema_short))
                .collect();
            let long: Vec<(f64, f64)> = frame
                .iter()
                .map(|(rec, row)| (day_number(rec.date), row.ema_long))
                .collect();

            let (y_min, y_max) = pad_range(y_range(&[close.as_slice(), short.as_slice(), long.as_slice()]), 0.05);
            let bounds = Bounds { x_min, x_max, y_min, y_max };

            // Earlier series win shared cells.
            draw_series(&mut grid, &close, bounds, '.');
            draw_series(&mut grid, &short, bounds, 's');
            draw_series(&mut grid, &long, bounds, 'l');
            let legend = format!(
                "Legend: . close | s {}-day EMA | l {}-day EMA\n",
                frame.short_span(),
                frame.long_span()
            );
            (y_min, y_max, legend)
        }
        ChartKind::Signals => {
            let (y_min, y_max) = pad_range(y_range(&[close.as_slice()]), 0.05);
            let bounds = Bounds { x_min, x_max, y_min, y_max };

            draw_series(&mut grid, &close, bounds, '-');
            for ev in frame.events() {
                let x = map_x(day_number(ev.date), x_min, x_max, width);
                let y = map_y(ev.close, y_min, y_max, height);
                grid[y][x] = match ev.kind {
                    SignalKind::Buy => 'B',
                    SignalKind::Sell => 'S',
                };
            }
            (y_min, y_max, "Legend: - close | B buy | S sell\n".to_string())
        }
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: dates=[{first}, {last}] | price=[{y_min:.2}, {y_max:.2}]\n"
    ));
    out.push_str(&legend);
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Dates as a continuous axis value (days from the common era).
pub fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Inverse of `day_number`, rounding to the nearest day.
pub fn date_from_day_number(v: f64) -> Option<NaiveDate> {
    if !v.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

fn y_range(series: &[&[(f64, f64)]]) -> (f64, f64) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for s in series {
        for &(_, y) in *s {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        (min_y, max_y)
    } else if min_y.is_finite() {
        (min_y - 1.0, min_y + 1.0)
    } else {
        (0.0, 1.0)
    }
}

fn pad_range((min, max): (f64, f64), frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y max is the top row
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_series(grid: &mut [Vec<char>], series: &[(f64, f64)], b: Bounds, ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in series {
        let x = map_x(t, b.x_min, b.x_max, width);
        let yy = map_y(y, b.y_min, b.y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, ch),
            None if grid[yy][x] == ' ' => grid[yy][x] = ch,
            None => {}
        }
        prev = Some((x, yy));
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
