//! `spx-signals` library crate.
//!
//! The binary (`spx`) is a thin wrapper around this library so that:
//!
//! - the signal pipeline is testable without spawning processes
//! - the dashboard and the plain-text commands share one code path

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod signals;
pub mod tui;
