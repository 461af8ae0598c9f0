//! Tracing bootstrap for host runtimes.
//!
//! ## Usage
//!
//! Call [`init_tracing`] once when the host starts. `RUST_LOG` overrides the
//! default filter. Repeated calls are ignored.

use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,range_selector=info,range_selector_host=info";

fn env_filter() -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match EnvFilter::try_new(DEFAULT_FILTER) {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("warn"),
        },
    }
}

/// Installs a global `fmt` subscriber.
pub fn init_tracing() {
    let filter = env_filter();
    let directives = filter.to_string();
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
    {
        debug!("Tracing initialized with `{directives}`");
    }
}

/// Installs a subscriber whose output is captured by the test harness.
#[cfg(any(test, feature = "testing"))]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}
