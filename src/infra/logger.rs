// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

/// Filter precedence: `RUST_LOG`, then `CHRONOS_LOG`, then `default_level`.
fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("CHRONOS_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Logs go to stderr so they never mix with
/// REPL output on stdout.
pub fn init_logging(default_level: &str) {
    fmt()
        .with_env_filter(build_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
