//! logging.rs
//! tracing bootstrap for hosts that do not install their own subscriber.
//!
//! Every contained failure in the pipeline is reported through `tracing`
//! (targets `river::<component>`). Hosts that already run a subscriber should
//! skip this and just set the filter they want.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the default filter.
pub const LOG_ENV: &str = "RIVER_LOG";

/// Install a fmt subscriber. Idempotent: a second call (or an existing global
/// subscriber) is left alone and `false` is returned.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Same as `init_logging`, but writes through the libtest capture.
pub fn init_test_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("river=debug"))
        .with_test_writer()
        .try_init()
        .is_ok()
}
