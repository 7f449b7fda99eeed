//! Shared signal pipeline used by both the CLI and TUI front-ends.
//!
//! fetch -> ingest (parse + sort) -> EMA(short), EMA(long) -> bullish -> crossover
//!
//! The front-ends only read the resulting `SignalFrame`.

use tracing::info;

use crate::config::PipelineConfig;
use crate::data::{PriceSource, fetch_csv};
use crate::domain::SignalFrame;
use crate::error::AppError;
use crate::io::ingest::{DatasetStats, parse_prices};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub source: String,
    pub stats: DatasetStats,
    pub frame: SignalFrame,
}

/// Fetch the configured source and run the full pipeline.
pub fn run(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    config.validate()?;
    let source = PriceSource::parse(&config.source);
    let text = fetch_csv(&source)?;
    run_with_text(config, source.label(), &text)
}

/// Run the pipeline on CSV text that has already been fetched.
pub fn run_with_text(
    config: &PipelineConfig,
    source: impl Into<String>,
    text: &str,
) -> Result<RunOutput, AppError> {
    config.validate()?;
    let ingest = parse_prices(text)?;
    let frame = crate::signals::build_frame(ingest.records, config.short_span, config.long_span)?;

    info!(
        buys = frame.buy_signals().len(),
        sells = frame.sell_signals().len(),
        "computed crossover signals"
    );

    Ok(RunOutput {
        source: source.into(),
        stats: ingest.stats,
        frame,
    })
}
