//! Hard-coded pipeline parameters.

use crate::error::AppError;

/// Historical S&P 500 daily prices (Date, Open, Close, daily return).
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/rajinipreethajohn/SP500/main/SP500.csv";

/// Span of the short ("50-day") exponential moving average.
pub const SHORT_SPAN: usize = 50;

/// Span of the long ("200-day") exponential moving average.
pub const LONG_SPAN: usize = 200;

/// Source header of the precomputed return column (renamed to `Return` internally).
pub const RETURN_COLUMN: &str = "Return Close day vs Close previous day";

/// Inputs of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// URL (`http://`/`https://`) or local path of the price CSV.
    pub source: String,
    pub short_span: usize,
    pub long_span: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_URL.to_string(),
            short_span: SHORT_SPAN,
            long_span: LONG_SPAN,
        }
    }
}

impl PipelineConfig {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.source.trim().is_empty() {
            return Err(AppError::input("Price source must not be empty."));
        }
        if self.short_span == 0 || self.long_span == 0 {
            return Err(AppError::input("EMA spans must be at least 1."));
        }
        if self.short_span >= self.long_span {
            return Err(AppError::input(format!(
                "Short EMA span ({}) must be smaller than the long span ({}).",
                self.short_span, self.long_span
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.short_span, 50);
        assert_eq!(cfg.long_span, 200);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_spans() {
        let cfg = PipelineConfig {
            short_span: 200,
            long_span: 50,
            ..PipelineConfig::default()
        };
        assert_eq!(cfg.validate().unwrap_err().exit_code(), 2);
    }

    #[test]
    fn rejects_zero_span() {
        let cfg = PipelineConfig {
            short_span: 0,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
