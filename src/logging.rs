//! Log setup shared by the binaries.
//!
//! Logs go to stderr so report output on stdout stays clean. `RUST_LOG`
//! overrides the default `info` level.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
