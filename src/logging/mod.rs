//! Process-wide diagnostic logging.
//!
//! Installs a `tracing` subscriber writing to stderr, so it never mixes with
//! the chat transcript on stdout. `RUST_LOG` overrides the configured filter.

use crate::config::model::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Returns `false` if one was already set,
/// which happens when several tests initialise logging.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
