//! Tracing subscriber for the binary.
//!
//! With the log reporter, gate messages are `tracing` events too, so the
//! binary defaults to `info`. The Actions reporter writes to stdout itself
//! and leaves stderr for diagnostics only.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// Reads `RUST_LOG`, falling back to `default_filter`.
///
/// ```bash
/// RUST_LOG=mutation_gate=debug mutation-gate run
/// ```
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A second install (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
