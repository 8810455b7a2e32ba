//! Logging initialisation
//!
//! Logs go to stderr; stdout carries the call/response channel.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global subscriber. Fails if one is already set.
pub fn init(level: Level) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
