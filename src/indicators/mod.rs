//! Technical indicators computed over the close series.

pub mod ema;

pub use ema::{Ema, ema_series};
