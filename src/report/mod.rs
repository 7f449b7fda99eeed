//! Text reporting: run summary, signal table, and buy/sell event list.

pub mod format;

pub use format::*;
