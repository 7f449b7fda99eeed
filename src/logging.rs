//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for tables and plots. The default
//! level is `warn`, which keeps the terminal dashboard undisturbed; set
//! `RUST_LOG` (environment or `.env`) to see pipeline progress.

use tracing_subscriber::EnvFilter;

pub fn init() {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // `try_init` so repeated calls (tests, embedding) don't panic.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
