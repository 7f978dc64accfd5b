//! Common logger configuration for embeddings of this core (mirrors the
//! teacher's `logger` crate, swapped to `EnvFilter` since the workspace
//! pulls in `tracing-subscriber`'s `env-filter` feature rather than
//! `Targets`).

use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Initialize a global `tracing` logger.
///
/// + Prints enabled `tracing` events and spans to stdout.
/// + The default log level includes INFO, WARN, and ERROR events.
/// + Override with `RUST_LOG`; see
///   <https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html>.
///
/// Panics if a logger is already installed.
pub fn init() {
    try_init().expect("failed to set up logger");
}

/// Initialize the global logger in tests. Skips setup entirely when
/// `RUST_LOG` isn't set, and tolerates another test thread having already
/// installed one.
pub fn init_for_testing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let _ = try_init();
}

/// Try to initialize a global logger. Returns `Err` if one is already set.
pub fn try_init() -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_log = tracing_subscriber::fmt::layer()
        .compact()
        .with_level(true)
        .with_target(true)
        .with_ansi(true)
        .with_filter(filter);

    tracing_subscriber::registry().with(stdout_log).try_init()
}
