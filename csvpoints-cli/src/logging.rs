//! Log output for the CLI.
//!
//! Library crates log through the `log` facade. A `tracing-subscriber` fmt
//! subscriber picks those records up through its `tracing-log` bridge and
//! writes them to stderr, keeping stdout free for the run document.

use tracing_subscriber::{EnvFilter, fmt};

/// Filter applied when `RUST_LOG` is unset or invalid.
pub(crate) const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. Later calls are no-ops.
pub(crate) fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(err) = installed {
        log::debug!("log subscriber already installed: {err}");
    }
}
