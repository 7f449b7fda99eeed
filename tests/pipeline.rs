use spx_signals::app::pipeline;
use spx_signals::config::PipelineConfig;
use spx_signals::domain::SignalKind;
use spx_signals::plot::{ChartKind, render_ascii_chart};
use spx_signals::report::format_signal_table;

/// Builds a CSV in the source's layout: US dates, quoted thousands separators,
/// newest rows first.
fn sp500_like_csv(closes: &[f64]) -> String {
    let start = chrono::NaiveDate::from_ymd_opt(1999, 1, 4).unwrap();
    let mut rows: Vec<String> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let date = start + chrono::Days::new(i as u64);
            let price = fmt_price(c);
            format!("{},\"{price}\",\"{price}\",0.10%", date.format("%m/%d/%Y"))
        })
        .collect();
    rows.reverse();
    format!("Date,Open,Close,Return Close day vs Close previous day\n{}\n", rows.join("\n"))
}

fn fmt_price(c: f64) -> String {
    let whole = c.trunc() as u64;
    let cents = ((c - c.trunc()) * 100.0).round() as u64;
    if whole >= 1000 {
        format!("{},{:03}.{cents:02}", whole / 1000, whole % 1000)
    } else {
        format!("{whole}.{cents:02}")
    }
}

#[test]
fn end_to_end_from_text() {
    // A zero plateau keeps both averages exactly equal until the jump to 2,000.
    let mut closes = vec![0.0; 300];
    closes.extend(std::iter::repeat_n(2000.0, 60));
    let csv = sp500_like_csv(&closes);

    let run = pipeline::run_with_text(&PipelineConfig::default(), "memory", &csv).unwrap();
    let frame = &run.frame;

    assert_eq!(frame.len(), 360);
    assert_eq!(run.stats.close_min, 0.0);
    assert_eq!(run.stats.close_max, 2000.0);
    assert!(frame.records().windows(2).all(|w| w[0].date < w[1].date));
    assert_eq!(frame.records()[0].ret, "0.10%");

    let rows = frame.rows();
    assert_eq!(rows[0].ema_short, 0.0);
    assert_eq!(rows[0].ema_long, 0.0);
    assert!(rows[0].crossover.is_nan());
    assert!(rows[1..].iter().all(|r| [-1.0, 0.0, 1.0].contains(&r.crossover)));

    let events = frame.events();
    assert_eq!(events.len(), 1);
    let last = &events[0];
    assert_eq!(last.kind, SignalKind::Buy);
    assert_eq!(last.close, 2000.0);
    assert_eq!(last.date, frame.records()[300].date);
    assert!(frame.latest_state().unwrap().bullish);

    let table = format_signal_table(frame, Some(3));
    assert_eq!(table.lines().count(), 4);

    let plot = render_ascii_chart(frame, ChartKind::Signals, 60, 12);
    assert!(plot.contains('B'));
}

#[test]
fn end_to_end_from_local_file() {
    let csv = sp500_like_csv(&[1455.0, 1399.0, 1402.0, 1403.0]);
    let path = std::env::temp_dir().join(format!("spx-signals-{}.csv", std::process::id()));
    std::fs::write(&path, csv).unwrap();

    let config = PipelineConfig::with_source(path.display().to_string());
    let run = pipeline::run(&config);
    std::fs::remove_file(&path).ok();

    let run = run.unwrap();
    assert_eq!(run.frame.len(), 4);
    assert_eq!(run.frame.records()[0].close, 1455.0);
    assert_eq!(run.source, path.display().to_string());
}

#[test]
fn malformed_price_propagates() {
    let csv = "Date,Open,Close,Return Close day vs Close previous day\n01/04/1999,\"1,2a\",1,0\n";
    let err = pipeline::run_with_text(&PipelineConfig::default(), "memory", csv).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}
