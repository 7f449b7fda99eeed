//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - runs the signal pipeline
//! - prints tables/plots or hands off to the dashboard

use clap::Parser;

use crate::cli::{Command, PlotArgs, SourceArgs, TableArgs};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `spx` binary.
pub fn run() -> Result<(), AppError> {
    crate::logging::init();

    // `spx` and `spx --source X` behave like `spx tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Table(args) => handle_table(args),
        Command::Signals(args) => handle_signals(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_tui(args: SourceArgs) -> Result<(), AppError> {
    crate::tui::run(args.pipeline_config())
}

fn handle_table(args: TableArgs) -> Result<(), AppError> {
    let run = pipeline::run(&args.source.pipeline_config())?;
    print!("{}", crate::report::format_signal_table(&run.frame, args.tail));
    Ok(())
}

fn handle_signals(args: SourceArgs) -> Result<(), AppError> {
    let run = pipeline::run(&args.pipeline_config())?;
    println!("{}", crate::report::format_run_summary(&run));
    print!("{}", crate::report::format_events(&run.frame));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let run = pipeline::run(&args.source.pipeline_config())?;
    let plot = crate::plot::render_ascii_chart(&run.frame, args.chart, args.width, args.height);
    print!("{plot}");
    Ok(())
}

/// Rewrite argv so `spx` defaults to `spx tui`.
///
/// Rules:
/// - `spx`                      -> `spx tui`
/// - `spx --source X ...`       -> `spx tui --source X ...`
/// - `spx --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "table" | "signals" | "plot");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
