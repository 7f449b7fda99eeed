//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - loaded price observations (`PriceRecord`)
//! - derived per-date signal columns (`SignalRow`)
//! - the immutable dataset handed to every front-end (`SignalFrame`)
//! - buy/sell events (`SignalKind`, `SignalEvent`)

pub mod types;

pub use types::*;
