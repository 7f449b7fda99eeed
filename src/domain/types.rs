//! Shared domain types.
//!
//! Prices are loaded once into `PriceRecord`s, the derived columns live in
//! index-aligned `SignalRow`s, and both are wrapped in a read-only
//! `SignalFrame` that the presentation layer consumes.

use chrono::NaiveDate;
use serde::Serialize;

/// One trading day of the source dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    /// Precomputed daily return, carried through as the raw source text.
    #[serde(rename = "Return")]
    pub ret: String,
}

/// Derived columns for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalRow {
    pub ema_short: f64,
    pub ema_long: f64,
    /// `1.0` when `ema_short > ema_long`, else `0.0`.
    pub bullish: f64,
    /// First difference of `bullish`; NaN on the first date.
    pub crossover: f64,
}

/// Direction of a crossover event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SignalKind {
    /// Short average crossed above the long one (bearish -> bullish).
    Buy,
    /// Short average crossed below the long one (bullish -> bearish).
    Sell,
}

impl SignalKind {
    /// Classify a crossover value. Only exact `1.0` / `-1.0` are events.
    pub fn from_crossover(crossover: f64) -> Option<Self> {
        if crossover == 1.0 {
            Some(Self::Buy)
        } else if crossover == -1.0 {
            Some(Self::Sell)
        } else {
            None
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

/// A buy or sell signal at a specific date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub close: f64,
    pub kind: SignalKind,
}

/// Most recent trend state of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestState {
    pub date: NaiveDate,
    pub close: f64,
    pub bullish: bool,
    pub last_event: Option<SignalEvent>,
}

/// The loaded dataset plus its derived columns.
///
/// Construction goes through `signals::build_frame`, which guarantees
/// `records` are date-ascending and `rows` is index-aligned with them.
#[derive(Debug, Clone)]
pub struct SignalFrame {
    records: Vec<PriceRecord>,
    rows: Vec<SignalRow>,
    short_span: usize,
    long_span: usize,
}

impl SignalFrame {
    pub(crate) fn from_parts(
        records: Vec<PriceRecord>,
        rows: Vec<SignalRow>,
        short_span: usize,
        long_span: usize,
    ) -> Self {
        debug_assert_eq!(records.len(), rows.len());
        Self {
            records,
            rows,
            short_span,
            long_span,
        }
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn rows(&self) -> &[SignalRow] {
        &self.rows
    }

    pub fn short_span(&self) -> usize {
        self.short_span
    }

    pub fn long_span(&self) -> usize {
        self.long_span
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(record, row)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (&PriceRecord, &SignalRow)> {
        self.records.iter().zip(self.rows.iter())
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// All buy and sell events in date order.
    pub fn events(&self) -> Vec<SignalEvent> {
        self.iter()
            .filter_map(|(rec, row)| {
                SignalKind::from_crossover(row.crossover).map(|kind| SignalEvent {
                    date: rec.date,
                    close: rec.close,
                    kind,
                })
            })
            .collect()
    }

    pub fn buy_signals(&self) -> Vec<SignalEvent> {
        self.events_of(SignalKind::Buy)
    }

    pub fn sell_signals(&self) -> Vec<SignalEvent> {
        self.events_of(SignalKind::Sell)
    }

    fn events_of(&self, kind: SignalKind) -> Vec<SignalEvent> {
        self.events().into_iter().filter(|e| e.kind == kind).collect()
    }

    pub fn latest_state(&self) -> Option<LatestState> {
        let (rec, row) = self.iter().last()?;
        Some(LatestState {
            date: rec.date,
            close: rec.close,
            bullish: row.bullish == 1.0,
            last_event: self.events().pop(),
        })
    }

    /// Number of leading rows before the long average has seen a full span.
    pub fn warmup_rows(&self) -> usize {
        self.long_span.saturating_sub(1).min(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossover_classification_is_exact() {
        assert_eq!(SignalKind::from_crossover(1.0), Some(SignalKind::Buy));
        assert_eq!(SignalKind::from_crossover(-1.0), Some(SignalKind::Sell));
        assert_eq!(SignalKind::from_crossover(0.0), None);
        assert_eq!(SignalKind::from_crossover(f64::NAN), None);
        assert_eq!(SignalKind::from_crossover(0.5), None);
    }
}
