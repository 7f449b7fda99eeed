//! Command-line parsing for the S&P 500 crossover tool.
//!
//! Argument parsing and command dispatch stay separate from the signal math.

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_SOURCE_URL, PipelineConfig};
use crate::plot::ChartKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "spx", version, about = "S&P 500 EMA(50/200) crossover signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (price chart, signal table, buy/sell chart).
    Tui(SourceArgs),
    /// Print the signal table (ema_short, ema_long, Bullish, Crossover).
    Table(TableArgs),
    /// Print the latest trend state and every buy/sell date.
    Signals(SourceArgs),
    /// Render a chart as ASCII in the terminal.
    Plot(PlotArgs),
}

/// Where to read prices from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Price CSV URL or local path.
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    pub source: String,
}

impl SourceArgs {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::with_source(self.source.clone())
    }
}

#[derive(Debug, Args, Clone)]
pub struct TableArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only print the last N rows.
    #[arg(long)]
    pub tail: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Which chart to draw.
    #[arg(long, value_enum, default_value_t = ChartKind::Averages)]
    pub chart: ChartKind,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
