//! Retrieval of the raw price CSV.
//!
//! A single blocking request, no retry and no timeout policy: any failure is
//! surfaced to the caller as an `AppError`.

use std::path::PathBuf;

use reqwest::blocking::Client;
use tracing::info;

use crate::error::AppError;

/// Where the price CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSource {
    Url(String),
    File(PathBuf),
}

impl PriceSource {
    /// `http://` / `https://` prefixes select a URL, anything else is a path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Fetch the CSV body as text.
pub fn fetch_csv(source: &PriceSource) -> Result<String, AppError> {
    let body = match source {
        PriceSource::Url(url) => fetch_url(url)?,
        PriceSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
            AppError::input(format!("Failed to read price CSV '{}': {e}", path.display()))
        })?,
    };

    info!(source = %source.label(), bytes = body.len(), "fetched price csv");
    Ok(body)
}

fn fetch_url(url: &str) -> Result<String, AppError> {
    let resp = Client::new()
        .get(url)
        .send()
        .map_err(|e| AppError::runtime(format!("Price request failed: {e}")))?;

    if !resp.status().is_success() {
        return Err(AppError::runtime(format!(
            "Price request failed with status {}.",
            resp.status()
        )));
    }

    resp.text()
        .map_err(|e| AppError::runtime(format!("Failed to read price response body: {e}")))
}
