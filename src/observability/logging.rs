//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Configure log level from config, overridable via `RUST_LOG`
//!
//! Library code only emits `tracing` events; nothing here is required to use
//! the registry or dialer from another program.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a configured level.
pub fn default_filter(level: &str) -> String {
    format!("rproxy={0},tower_http={0}", level)
}

/// Install the global subscriber. Call once at startup.
pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("debug"), "rproxy=debug,tower_http=debug");
        assert!(EnvFilter::try_new(default_filter("warn")).is_ok());
    }
}
