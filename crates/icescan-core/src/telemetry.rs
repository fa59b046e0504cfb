//! Tracing initialisation for icescan binaries.
//!
//! Call [`init_tracing`] once at program start. Respects `RUST_LOG` for
//! fine-grained filtering; falls back to the supplied level otherwise.
//! Safe to call more than once — only the first call takes effect.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// * `json` — emit newline-delimited JSON log lines.
/// * `level` — default verbosity when `RUST_LOG` is not set.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if json {
        builder.json().try_init().ok();
    } else {
        builder.try_init().ok();
    }
}
