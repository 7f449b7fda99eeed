//! Ratatui-based terminal dashboard.
//!
//! Three tabs over one `SignalFrame`:
//!
//! 1. close price with the short and long EMAs
//! 2. the signal table (ema_short, ema_long, Bullish, Crossover)
//! 3. close price with buy/sell markers

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs},
};
use tracing::debug;

use crate::app::pipeline::RunOutput;
use crate::config::PipelineConfig;
use crate::domain::{SignalFrame, SignalKind};
use crate::error::AppError;
use crate::plot::{date_from_day_number, day_number};
use crate::report::fmt_crossover;

mod plotters_chart;

use plotters_chart::{LineSpec, MarkerSpec, PriceChart};

const CLOSE_COLOR: RGBColor = RGBColor(0, 255, 255);
const SHORT_COLOR: RGBColor = RGBColor(255, 165, 0);
const LONG_COLOR: RGBColor = RGBColor(0, 200, 0);
const BUY_COLOR: RGBColor = RGBColor(0, 255, 0);
const SELL_COLOR: RGBColor = RGBColor(255, 0, 0);

/// Start the dashboard.
pub fn run(config: PipelineConfig) -> Result<(), AppError> {
    config.validate()?;

    // Fetch before touching the terminal so load errors print normally.
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Averages,
    Table,
    Signals,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Averages, Tab::Table, Tab::Signals];

    fn title(self) -> &'static str {
        match self {
            Tab::Averages => "1 Close Price and Moving Averages",
            Tab::Table => "2 Trading Signals",
            Tab::Signals => "3 Buy and Sell Signals",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

struct App {
    config: PipelineConfig,
    tab: Tab,
    /// First visible row of the signal table.
    table_offset: usize,
    /// Rows visible in the table at the last draw (for paging).
    table_page: usize,
    status: String,
    run: RunOutput,
}

impl App {
    fn new(config: PipelineConfig) -> Result<Self, AppError> {
        let run = crate::app::pipeline::run(&config)?;
        let status = format!("Loaded {} records.", run.stats.n_records);
        Ok(Self {
            config,
            tab: Tab::Averages,
            table_offset: 0,
            table_page: 20,
            status,
            run,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the dashboard should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let last_row = self.run.frame.len().saturating_sub(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('1') => self.tab = Tab::Averages,
            KeyCode::Char('2') => self.tab = Tab::Table,
            KeyCode::Char('3') => self.tab = Tab::Signals,
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::BackTab => self.tab = self.tab.prev(),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Up if self.tab == Tab::Table => {
                self.table_offset = self.table_offset.saturating_sub(1);
            }
            KeyCode::Down if self.tab == Tab::Table => {
                self.table_offset = (self.table_offset + 1).min(last_row);
            }
            KeyCode::PageUp if self.tab == Tab::Table => {
                self.table_offset = self.table_offset.saturating_sub(self.table_page);
            }
            KeyCode::PageDown if self.tab == Tab::Table => {
                self.table_offset = (self.table_offset + self.table_page).min(last_row);
            }
            KeyCode::Home if self.tab == Tab::Table => self.table_offset = 0,
            KeyCode::End if self.tab == Tab::Table => {
                self.table_offset = self.run.frame.len().saturating_sub(self.table_page);
            }
            _ => {}
        }
        false
    }

    fn refresh(&mut self) {
        match crate::app::pipeline::run(&self.config) {
            Ok(run) => {
                self.status = format!("Reloaded {} records.", run.stats.n_records);
                self.table_offset = self.table_offset.min(run.frame.len().saturating_sub(1));
                self.run = run;
            }
            Err(err) => {
                debug!(error = %err, "refresh failed");
                self.status = format!("Refresh failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        match self.tab {
            Tab::Averages => self.draw_averages(frame, chunks[2]),
            Tab::Table => self.draw_table(frame, chunks[2]),
            Tab::Signals => self.draw_signals(frame, chunks[2]),
        }
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let stats = &self.run.stats;
        let mut lines = vec![Line::from(vec![
            Span::styled("S&P 500 Stock Analysis", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" — {}", self.run.source)),
        ])];

        let mut info = format!(
            "n={} | {} → {} | EMA {}/{}",
            stats.n_records,
            stats.first_date,
            stats.last_date,
            self.run.frame.short_span(),
            self.run.frame.long_span(),
        );
        if let Some(state) = self.run.frame.latest_state() {
            let trend = if state.bullish { "Bullish" } else { "Bearish" };
            info.push_str(&format!(" | latest {} {:.2} {trend}", state.date, state.close));
            if let Some(ev) = state.last_event {
                info.push_str(&format!(" | last {} {}", ev.kind.display_name(), ev.date));
            }
        }
        lines.push(Line::from(Span::styled(info, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .select(self.tab.index());
        frame.render_widget(tabs, area);
    }

    fn draw_averages(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let data = ChartData::averages(&self.run.frame);
        let legend = Line::from(vec![
            legend_span("close", CLOSE_COLOR),
            Span::raw("  "),
            legend_span(&format!("{}-day EMA", self.run.frame.short_span()), SHORT_COLOR),
            Span::raw("  "),
            legend_span(&format!("{}-day EMA", self.run.frame.long_span()), LONG_COLOR),
        ]);
        let chart = PriceChart {
            lines: vec![
                LineSpec { points: &data.close, color: CLOSE_COLOR },
                LineSpec { points: &data.short, color: SHORT_COLOR },
                LineSpec { points: &data.long, color: LONG_COLOR },
            ],
            markers: Vec::new(),
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: "Date",
            y_label: "Price",
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_price,
        };
        draw_chart_panel(frame, area, "Close Price and Moving Averages", legend, chart, &data);
    }

    fn draw_signals(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let data = ChartData::signals(&self.run.frame);
        let legend = Line::from(vec![
            legend_span("close", CLOSE_COLOR),
            Span::raw("  "),
            legend_span(&format!("Buy Signal ({})", data.buys.len()), BUY_COLOR),
            Span::raw("  "),
            legend_span(&format!("Sell Signal ({})", data.sells.len()), SELL_COLOR),
        ]);
        let chart = PriceChart {
            lines: vec![LineSpec { points: &data.close, color: CLOSE_COLOR }],
            markers: vec![
                MarkerSpec { points: &data.buys, color: BUY_COLOR },
                MarkerSpec { points: &data.sells, color: SELL_COLOR },
            ],
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: "Date",
            y_label: "Price",
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_price,
        };
        draw_chart_panel(frame, area, "Buy and Sell Signals", legend, chart, &data);
    }

    fn draw_table(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Trading Signals").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // One line for the header row.
        let visible = (inner.height as usize).saturating_sub(1).max(1);
        self.table_page = visible;

        let rows = table_rows(&self.run.frame, self.table_offset, visible);
        let header = Row::new(["Date", "ema_short", "ema_long", "Bullish", "Crossover"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(10),
            ],
        )
        .header(header);
        frame.render_widget(table, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "1/2/3 or Tab switch  ↑/↓ PgUp/PgDn Home/End scroll table  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Visible window of the signal table.
fn table_rows(frame: &SignalFrame, offset: usize, count: usize) -> Vec<Row<'static>> {
    frame
        .iter()
        .skip(offset)
        .take(count)
        .map(|(rec, row)| {
            let cross_style = match SignalKind::from_crossover(row.crossover) {
                Some(SignalKind::Buy) => Style::default().fg(Color::Green),
                Some(SignalKind::Sell) => Style::default().fg(Color::Red),
                None => Style::default(),
            };
            Row::new(vec![
                Cell::from(rec.date.to_string()),
                Cell::from(format!("{:.4}", row.ema_short)),
                Cell::from(format!("{:.4}", row.ema_long)),
                Cell::from(format!("{:.1}", row.bullish)),
                Cell::from(fmt_crossover(row.crossover)).style(cross_style),
            ])
        })
        .collect()
}

/// Series and bounds for one chart tab.
#[derive(Debug, Default)]
struct ChartData {
    close: Vec<(f64, f64)>,
    short: Vec<(f64, f64)>,
    long: Vec<(f64, f64)>,
    buys: Vec<(f64, f64)>,
    sells: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl ChartData {
    fn averages(frame: &SignalFrame) -> Self {
        let close = close_series(frame);
        let short: Vec<_> = frame.iter().map(|(r, row)| (day_number(r.date), row.ema_short)).collect();
        let long: Vec<_> = frame.iter().map(|(r, row)| (day_number(r.date), row.ema_long)).collect();
        let (x_bounds, y_bounds) = fit_bounds(&[close.as_slice(), short.as_slice(), long.as_slice()]);
        Self {
            close,
            short,
            long,
            x_bounds,
            y_bounds,
            ..Self::default()
        }
    }

    fn signals(frame: &SignalFrame) -> Self {
        let to_points = |events: Vec<crate::domain::SignalEvent>| {
            events
                .into_iter()
                .map(|e| (day_number(e.date), e.close))
                .collect::<Vec<_>>()
        };
        let close = close_series(frame);
        let (x_bounds, y_bounds) = fit_bounds(&[close.as_slice()]);
        Self {
            close,
            buys: to_points(frame.buy_signals()),
            sells: to_points(frame.sell_signals()),
            x_bounds,
            y_bounds,
            ..Self::default()
        }
    }
}

/// X/Y bounds over all series, padded 5% vertically; degenerate ranges widen to 1.
fn fit_bounds(series: &[&[(f64, f64)]]) -> ([f64; 2], [f64; 2]) {
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for s in series {
        for &(x, y) in s.iter() {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }

    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        x_min = if x_min.is_finite() { x_min } else { 0.0 };
        x_max = x_min + 1.0;
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        let mid = if y_min.is_finite() { y_min } else { 0.0 };
        y_min = mid - 1.0;
        y_max = mid + 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    ([x_min, x_max], [y_min - pad, y_max + pad])
}

fn close_series(frame: &SignalFrame) -> Vec<(f64, f64)> {
    frame.records().iter().map(|r| (day_number(r.date), r.close)).collect()
}

fn draw_chart_panel(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    legend: Line<'_>,
    chart: PriceChart<'_>,
    data: &ChartData,
) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    if data.close.is_empty() {
        let msg = Paragraph::new("No data.").style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, inner);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    frame.render_widget(Paragraph::new(legend), chunks[0]);

    let (chart_rect, insets) = chart_layout(chunks[1]);
    frame.render_widget(chart, chart_rect);
    if let Some(insets) = insets {
        draw_axis_ticks(frame, chunks[1], chart_rect, insets, data.x_bounds, data.y_bounds);
    }
}

fn legend_span(label: &str, color: RGBColor) -> Span<'static> {
    let RGBColor(r, g, b) = color;
    Span::styled(format!("━ {label}"), Style::default().fg(Color::Rgb(r, g, b)))
}

fn fmt_axis_date(v: f64) -> String {
    date_from_day_number(v)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn fmt_axis_price(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 4,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_axis_date(x_bounds[0] + u * (x_bounds[1] - x_bounds[0]));
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label_len = label.len() as u16;
        let start = x
            .saturating_sub(label_len / 2)
            .min((inner.x + inner.width).saturating_sub(label_len));
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_axis_price(y_bounds[0] + u * (y_bounds[1] - y_bounds[0]));
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceRecord;
    use crate::signals::build_frame;
    use chrono::{Days, NaiveDate};

    fn frame_from_closes(closes: &[f64]) -> SignalFrame {
        let start = NaiveDate::from_ymd_opt(2010, 6, 1).unwrap();
        let records = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceRecord {
                date: start.checked_add_days(Days::new(i as u64)).unwrap(),
                open: close,
                close,
                ret: String::new(),
            })
            .collect();
        build_frame(records, 2, 4).unwrap()
    }

    #[test]
    fn tabs_cycle_in_both_directions() {
        assert_eq!(Tab::Averages.next(), Tab::Table);
        assert_eq!(Tab::Signals.next(), Tab::Averages);
        assert_eq!(Tab::Averages.prev(), Tab::Signals);
        assert_eq!(Tab::Table.index(), 1);
    }

    #[test]
    fn signal_chart_data_places_markers_on_close() {
        let frame = frame_from_closes(&[0.0, 0.0, 8.0, 8.0, 0.0, 0.0]);
        let data = ChartData::signals(&frame);
        assert_eq!(data.buys, vec![(day_number(frame.records()[2].date), 8.0)]);
        assert_eq!(data.sells, vec![(day_number(frame.records()[4].date), 0.0)]);
        assert_eq!(data.x_bounds[0], day_number(frame.records()[0].date));
        assert!(data.y_bounds[0] < 0.0 && data.y_bounds[1] > 8.0);
    }

    #[test]
    fn averages_bounds_cover_all_series() {
        let frame = frame_from_closes(&[5.0, 7.0, 6.0]);
        let data = ChartData::averages(&frame);
        assert_eq!(data.close.len(), 3);
        assert_eq!(data.short.len(), 3);
        assert_eq!(data.long.len(), 3);
        assert!(data.y_bounds[0] < 5.0 && data.y_bounds[1] > 7.0);
    }

    #[test]
    fn single_record_gets_non_degenerate_bounds() {
        let frame = frame_from_closes(&[100.0]);
        let data = ChartData::averages(&frame);
        assert!(data.x_bounds[1] > data.x_bounds[0]);
        assert!(data.y_bounds[1] > data.y_bounds[0]);
    }

    #[test]
    fn table_window_respects_offset() {
        let frame = frame_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(table_rows(&frame, 3, 10).len(), 2);
        assert_eq!(table_rows(&frame, 0, 2).len(), 2);
    }

    #[test]
    fn axis_date_labels() {
        let d = NaiveDate::from_ymd_opt(2008, 9, 15).unwrap();
        assert_eq!(fmt_axis_date(day_number(d)), "2008-09");
        assert_eq!(fmt_axis_price(1455.4), "1455");
    }
}
