//! Diagnostics go to stderr; stdout is reserved for the result log.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `log` records from the engine are
/// bridged in by the subscriber's `tracing-log` integration.
///
/// `RUST_LOG` wins when set, except under `--quiet`, which pins `warn`.
pub fn init(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
