use tracing_subscriber::{EnvFilter, fmt};

/// Install the process-wide subscriber, filtered by `RUST_LOG`.
/// Call once at startup, before any store or arena work.
pub fn init() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
}
