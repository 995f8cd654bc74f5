// Logging setup for the CLI

use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Level for a `-v` count: warn, info, debug, then trace
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the verbosity flag. Output goes to stderr so that
/// rendered documents on stdout stay clean.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("docsmith={}", level_for(verbosity))));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))
}
