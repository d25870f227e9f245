//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set (e.g. `RUST_LOG=u_convoy=debug`); otherwise
/// `default_level` applies.
///
/// ```no_run
/// u_convoy::logging::init("info");
/// ```
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(false)
        .init();
}

/// Debug-level subscriber writing through the test harness. Safe to call
/// from several tests.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
