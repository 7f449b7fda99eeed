//! CSV ingest and normalization.
//!
//! Turns the raw S&P 500 CSV into date-ascending `PriceRecord`s:
//!
//! - **Strict schema**: `Date`, `Open`, `Close` and the return column must exist
//! - **Fail fast**: the first malformed row aborts the load (no skipping, no defaults)
//! - **Deterministic order**: rows are sorted by date; duplicated dates are rejected

use std::collections::HashMap;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info};

use crate::config::RETURN_COLUMN;
use crate::domain::PriceRecord;
use crate::error::AppError;

/// Summary stats about the loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_records: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub close_min: f64,
    pub close_max: f64,
}

/// Ingest output: sorted records + stats.
#[derive(Debug, Clone)]
pub struct IngestedPrices {
    pub records: Vec<PriceRecord>,
    pub stats: DatasetStats,
}

/// Resolved column positions.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    open: usize,
    close: usize,
    ret: usize,
}

/// Parse the CSV text into sorted price records.
pub fn parse_prices(text: &str) -> Result<IngestedPrices, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = resolve_columns(&build_header_map(&headers))?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, and CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::data(format!("CSV parse error on line {line}: {e}")))?;
        let row = parse_row(&record, columns).map_err(|msg| AppError::data(format!("Line {line}: {msg}")))?;
        records.push(row);
    }

    records.sort_by_key(|r| r.date);
    if let Some(w) = records.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(AppError::data(format!("Duplicate date in price data: {}", w[0].date)));
    }

    let stats = compute_stats(&records)
        .ok_or_else(|| AppError::data("Price CSV contains no data rows."))?;

    info!(
        records = stats.n_records,
        first = %stats.first_date,
        last = %stats.last_date,
        "loaded price records"
    );

    Ok(IngestedPrices { records, stats })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<Columns, AppError> {
    let required = |name: &str| {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| AppError::input(format!("Missing required column: `{name}`")))
    };

    let ret = header_map
        .get(&normalize_header_name(RETURN_COLUMN))
        .or_else(|| header_map.get("return"))
        .copied()
        .ok_or_else(|| AppError::input(format!("Missing required column: `{RETURN_COLUMN}`")))?;

    Ok(Columns {
        date: required("date")?,
        open: required("open")?,
        close: required("close")?,
        ret,
    })
}

fn parse_row(record: &StringRecord, columns: Columns) -> Result<PriceRecord, String> {
    let date = parse_date(field(record, columns.date, "Date")?)?;
    let open = parse_price(field(record, columns.open, "Open")?).map_err(|e| format!("`Open`: {e}"))?;
    let close = parse_price(field(record, columns.close, "Close")?).map_err(|e| format!("`Close`: {e}"))?;
    let ret = record.get(columns.ret).unwrap_or("").to_string();

    Ok(PriceRecord { date, open, close, ret })
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing value for `{name}`"))
}

/// Parse a date in one of the formats seen in market-data exports.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Day-first slash dates are deliberately absent: they collide with `%m/%d/%Y`.
    const FMTS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%Y/%m/%d", "%d-%b-%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, MM/DD/YYYY, Mon DD, YYYY, YYYY/MM/DD, DD-Mon-YYYY."
    ))
}

/// Parse a price with thousands separators, e.g. `"1,455.22"`.
pub fn parse_price(s: &str) -> Result<f64, String> {
    let cleaned: String = s.trim().chars().filter(|&c| c != ',').collect();
    let v = cleaned
        .parse::<f64>()
        .map_err(|_| format!("not a number: '{s}'"))?;
    if !v.is_finite() {
        return Err(format!("non-finite value: '{s}'"));
    }
    Ok(v)
}

fn compute_stats(records: &[PriceRecord]) -> Option<DatasetStats> {
    let first = records.first()?;
    let last = records.last()?;

    let (close_min, close_max) = records
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.close), hi.max(r.close))
        });

    debug!(close_min, close_max, "close range");

    Some(DatasetStats {
        n_records: records.len(),
        first_date: first.date,
        last_date: last.date,
        close_min,
        close_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Date,Open,Close,Return Close day vs Close previous day\n";

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(parse_price("1,455.22").unwrap(), 1455.22);
        assert_eq!(parse_price(" 4,796.56 ").unwrap(), 4796.56);
        assert_eq!(parse_price("98.5").unwrap(), 98.5);
        assert_eq!(parse_price("1,000,000").unwrap(), 1_000_000.0);
    }

    #[test]
    fn rejects_non_numeric_prices() {
        assert!(parse_price("n/a").is_err());
        assert!(parse_price("").is_err());
        assert!(parse_price("inf").is_err());
        assert!(parse_price("1.2.3").is_err());
    }

    #[test]
    fn accepts_common_date_formats() {
        let want = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
        for s in ["2000-01-03", "01/03/2000", "Jan 03, 2000", "2000/01/03", "03-Jan-2000"] {
            assert_eq!(parse_date(s).unwrap(), want, "format {s}");
        }
        assert!(parse_date("2000-13-01").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn parses_and_sorts_rows() {
        let csv = format!(
            "{HEADER}\
             01/04/2000,\"1,455.22\",\"1,399.42\",-3.83%\n\
             01/03/2000,\"1,469.25\",\"1,455.22\",-0.95%\n"
        );
        let out = parse_prices(&csv).unwrap();
        assert_eq!(out.records.len(), 2);

        let first = &out.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2000, 1, 3).unwrap());
        assert_eq!(first.open, 1469.25);
        assert_eq!(first.close, 1455.22);
        assert_eq!(first.ret, "-0.95%");

        assert_eq!(out.stats.n_records, 2);
        assert_eq!(out.stats.close_min, 1399.42);
        assert_eq!(out.stats.close_max, 1455.22);
        assert_eq!(out.stats.last_date, NaiveDate::from_ymd_opt(2000, 1, 4).unwrap());
    }

    #[test]
    fn accepts_renamed_return_column_and_bom() {
        let csv = "\u{feff}Date,Open,Close,Return\n2000-01-03,1469.25,1455.22,\n";
        let out = parse_prices(csv).unwrap();
        assert_eq!(out.records[0].close, 1455.22);
        assert_eq!(out.records[0].ret, "");
    }

    #[test]
    fn malformed_date_fails_the_load() {
        let csv = format!("{HEADER}2000-01-03,1,2,0\nnot-a-date,1,2,0\n");
        let err = parse_prices(&csv).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("Line 3"), "{err}");
    }

    #[test]
    fn malformed_price_fails_the_load() {
        let csv = format!("{HEADER}2000-01-03,1,\"1,2x\",0\n");
        let err = parse_prices(&csv).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("`Close`"), "{err}");
    }

    #[test]
    fn missing_column_is_an_input_error() {
        let err = parse_prices("Date,Open,Return\n2000-01-03,1,0\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("`close`"), "{err}");
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let csv = format!("{HEADER}2000-01-03,1,2,0\n01/03/2000,1,2,0\n");
        let err = parse_prices(&csv).unwrap_err();
        assert!(err.message().contains("Duplicate date"));
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = parse_prices(HEADER).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
