//! Trend state and crossover detection.
//!
//! `bullish[i]` is `1.0` when the short average is strictly above the long
//! one. `crossover` is its first difference, so `1.0` marks a buy (bearish ->
//! bullish) and `-1.0` a sell. The first date has no predecessor and gets NaN.

use tracing::debug;

use crate::domain::{PriceRecord, SignalFrame, SignalRow};
use crate::error::AppError;
use crate::indicators::ema_series;

/// `1.0` where `short > long`, `0.0` otherwise (ties and NaN included).
pub fn bullish_flags(short: &[f64], long: &[f64]) -> Vec<f64> {
    short
        .iter()
        .zip(long)
        .map(|(s, l)| if s > l { 1.0 } else { 0.0 })
        .collect()
}

/// First difference of the bullish flags, NaN at index 0.
pub fn crossovers(bullish: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bullish.len());
    if bullish.is_empty() {
        return out;
    }
    out.push(f64::NAN);
    out.extend(bullish.windows(2).map(|w| w[1] - w[0]));
    out
}

/// Compute every derived column for date-ascending records.
pub fn build_frame(
    records: Vec<PriceRecord>,
    short_span: usize,
    long_span: usize,
) -> Result<SignalFrame, AppError> {
    if let Some(w) = records.windows(2).find(|w| w[0].date >= w[1].date) {
        return Err(AppError::data(format!(
            "Records must be strictly ascending by date ({} is followed by {}).",
            w[0].date, w[1].date
        )));
    }

    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    let ema_short = ema_series(&closes, short_span);
    let ema_long = ema_series(&closes, long_span);
    let bullish = bullish_flags(&ema_short, &ema_long);
    let crossover = crossovers(&bullish);

    let rows: Vec<SignalRow> = (0..records.len())
        .map(|i| SignalRow {
            ema_short: ema_short[i],
            ema_long: ema_long[i],
            bullish: bullish[i],
            crossover: crossover[i],
        })
        .collect();

    debug!(rows = rows.len(), short_span, long_span, "derived signal columns");

    Ok(SignalFrame::from_parts(records, rows, short_span, long_span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignalKind;
    use chrono::{Days, NaiveDate};

    fn records_from_closes(closes: &[f64]) -> Vec<PriceRecord> {
        let start = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceRecord {
                date: start.checked_add_days(Days::new(i as u64)).unwrap(),
                open: close,
                close,
                ret: String::new(),
            })
            .collect()
    }

    #[test]
    fn ties_are_not_bullish() {
        assert_eq!(bullish_flags(&[1.0, 2.0, 3.0], &[1.0, 1.0, 4.0]), vec![0.0, 1.0, 0.0]);
        assert_eq!(bullish_flags(&[f64::NAN], &[1.0]), vec![0.0]);
    }

    #[test]
    fn crossover_is_first_difference_with_leading_nan() {
        let c = crossovers(&[0.0, 1.0, 1.0, 0.0, 0.0]);
        assert!(c[0].is_nan());
        assert_eq!(&c[1..], &[1.0, 0.0, -1.0, 0.0]);
        assert!(crossovers(&[]).is_empty());
    }

    #[test]
    fn flat_then_jump_produces_buy_at_first_bullish_date() {
        // A zero plateau keeps both averages exactly equal (no bullish state) until the jump.
        let mut closes = vec![0.0; 300];
        closes.extend(std::iter::repeat_n(20.0, 50));
        let frame = build_frame(records_from_closes(&closes), 50, 200).unwrap();

        let first_bullish = frame
            .rows()
            .iter()
            .position(|r| r.ema_short > r.ema_long)
            .unwrap();
        assert_eq!(first_bullish, 300);
        assert_eq!(frame.rows()[first_bullish].crossover, 1.0);

        let buys = frame.buy_signals();
        assert_eq!(buys.len(), 1);
        assert_eq!(buys[0].date, frame.records()[300].date);
        assert_eq!(buys[0].close, 20.0);
        assert!(frame.sell_signals().is_empty());
    }

    #[test]
    fn crossover_values_are_consistent_with_bullish() {
        let closes: Vec<f64> = (0..600)
            .map(|i| 100.0 + 30.0 * ((i as f64) / 40.0).sin())
            .collect();
        let frame = build_frame(records_from_closes(&closes), 5, 20).unwrap();
        let rows = frame.rows();

        assert_eq!(rows[0].ema_short, closes[0]);
        assert_eq!(rows[0].ema_long, closes[0]);
        assert!(rows[0].crossover.is_nan());

        for i in 1..rows.len() {
            let c = rows[i].crossover;
            assert!(!c.is_nan());
            assert!(c == -1.0 || c == 0.0 || c == 1.0);
            match SignalKind::from_crossover(c) {
                Some(SignalKind::Buy) => {
                    assert_eq!(rows[i].bullish, 1.0);
                    assert_eq!(rows[i - 1].bullish, 0.0);
                }
                Some(SignalKind::Sell) => {
                    assert_eq!(rows[i].bullish, 0.0);
                    assert_eq!(rows[i - 1].bullish, 1.0);
                }
                None => assert_eq!(rows[i].bullish, rows[i - 1].bullish),
            }
        }
        assert!(!frame.buy_signals().is_empty());
        assert!(!frame.sell_signals().is_empty());
    }

    #[test]
    fn latest_state_reports_last_event() {
        let mut closes = vec![10.0; 30];
        closes.extend(std::iter::repeat_n(20.0, 30));
        closes.extend(std::iter::repeat_n(5.0, 30));
        let frame = build_frame(records_from_closes(&closes), 3, 10).unwrap();

        let state = frame.latest_state().unwrap();
        assert!(!state.bullish);
        assert_eq!(state.close, 5.0);
        assert_eq!(state.last_event.unwrap().kind, SignalKind::Sell);
    }

    #[test]
    fn rejects_unsorted_records() {
        let mut records = records_from_closes(&[1.0, 2.0, 3.0]);
        records.swap(0, 2);
        let err = build_frame(records, 2, 3).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn empty_records_give_empty_frame() {
        let frame = build_frame(Vec::new(), 50, 200).unwrap();
        assert!(frame.is_empty());
        assert!(frame.latest_state().is_none());
        assert!(frame.events().is_empty());
    }
}
