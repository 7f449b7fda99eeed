//! Formatted terminal output.
//!
//! Formatting stays in one place so the signal code remains free of layout
//! concerns and output changes are localized.

use crate::app::pipeline::RunOutput;
use crate::domain::SignalFrame;

/// Header + dataset stats + latest trend state.
pub fn format_run_summary(run: &RunOutput) -> String {
    let frame = &run.frame;
    let mut out = String::new();

    out.push_str("=== spx - S&P 500 Stock Analysis ===\n");
    out.push_str(&format!("Source: {}\n", run.source));
    out.push_str(&format!(
        "Records: n={} | dates=[{}, {}] | close=[{:.2}, {:.2}]\n",
        run.stats.n_records,
        run.stats.first_date,
        run.stats.last_date,
        run.stats.close_min,
        run.stats.close_max,
    ));
    out.push_str(&format!(
        "EMA spans: short={} long={} (first {} rows are long-EMA warm-up)\n",
        frame.short_span(),
        frame.long_span(),
        frame.warmup_rows(),
    ));
    out.push_str(&format!(
        "Signals: buy={} sell={}\n",
        frame.buy_signals().len(),
        frame.sell_signals().len(),
    ));

    if let Some(state) = frame.latest_state() {
        let trend = if state.bullish { "Bullish" } else { "Bearish" };
        out.push_str(&format!("Latest: {} close={:.2} -> {trend}\n", state.date, state.close));
        if let Some(ev) = state.last_event {
            out.push_str(&format!(
                "Last signal: {} on {} at {:.2}\n",
                ev.kind.display_name(),
                ev.date,
                ev.close
            ));
        }
    }

    out
}

/// The signal table indexed by date, optionally limited to the last `tail` rows.
pub fn format_signal_table(frame: &SignalFrame, tail: Option<usize>) -> String {
    let skip = tail.map_or(0, |n| frame.len().saturating_sub(n));

    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:>12} {:>12} {:>8} {:>10}\n",
        "Date", "ema_short", "ema_long", "Bullish", "Crossover"
    ));
    for (rec, row) in frame.iter().skip(skip) {
        out.push_str(&format!(
            "{:<12} {:>12.4} {:>12.4} {:>8.1} {:>10}\n",
            rec.date.to_string(),
            row.ema_short,
            row.ema_long,
            row.bullish,
            fmt_crossover(row.crossover),
        ));
    }
    out
}

/// Every buy/sell date in order.
pub fn format_events(frame: &SignalFrame) -> String {
    let events = frame.events();
    if events.is_empty() {
        return "No crossover signals.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{:<12} {:<6} {:>12}\n", "Date", "Signal", "Close"));
    for ev in events {
        out.push_str(&format!(
            "{:<12} {:<6} {:>12.2}\n",
            ev.date.to_string(),
            ev.kind.display_name(),
            ev.close
        ));
    }
    out
}

/// Crossover as shown in tables: `NaN` on the first row, one decimal otherwise.
pub fn fmt_crossover(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.1}")
    }
}
