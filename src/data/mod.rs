//! Data acquisition.
//!
//! - `source`: fetch the raw price CSV over HTTP or from a local file

pub mod source;

pub use source::{PriceSource, fetch_csv};
