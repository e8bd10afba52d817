//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses (bind, metrics, upstream targets)
//! - Validate value ranges (timeouts > 0, sane backoff)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::registry::strip_scheme;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("host entry {index} has an empty host")]
    EmptyHost { index: usize },

    #[error("host '{host}' has no upstreams")]
    NoUpstreams { host: String },

    #[error("upstream '{upstream}' for host '{host}' is not host:port")]
    InvalidUpstream { host: String, upstream: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("prober initial_delay_ms ({initial}) exceeds max_delay_ms ({max})")]
    DelayRange { initial: u64, max: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    for (index, host) in config.hosts.iter().enumerate() {
        if host.host.trim().is_empty() {
            errors.push(ValidationError::EmptyHost { index });
        }
        if host.upstreams.is_empty() {
            errors.push(ValidationError::NoUpstreams { host: host.host.clone() });
        }
        for upstream in &host.upstreams {
            if !is_dial_target(upstream) {
                errors.push(ValidationError::InvalidUpstream {
                    host: host.host.clone(),
                    upstream: upstream.clone(),
                });
            }
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.prober.initial_delay_ms == 0 {
        errors.push(ValidationError::Zero { field: "prober.initial_delay_ms" });
    }
    if config.prober.multiplier == 0 {
        errors.push(ValidationError::Zero { field: "prober.multiplier" });
    }
    if config.prober.initial_delay_ms > config.prober.max_delay_ms {
        errors.push(ValidationError::DelayRange {
            initial: config.prober.initial_delay_ms,
            max: config.prober.max_delay_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An upstream is dialable if, scheme stripped, it is exactly `host:port`.
fn is_dial_target(upstream: &str) -> bool {
    let target = strip_scheme(upstream);
    if target.contains('/') || target.contains('@') {
        return false;
    }
    match Url::parse(&format!("tcp://{}", target)) {
        Ok(url) => url.host_str().is_some_and(|h| !h.is_empty()) && url.port().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::HostConfig;

    fn host(name: &str, upstreams: &[&str]) -> HostConfig {
        HostConfig {
            host: name.to_string(),
            upstreams: upstreams.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_upstream_targets() {
        assert!(is_dial_target("localhost:7777"));
        assert!(is_dial_target("http://127.0.0.1:7777"));
        assert!(is_dial_target("https://[::1]:443"));
        assert!(!is_dial_target("localhost"));
        assert!(!is_dial_target("http://localhost:7777/path"));
        assert!(!is_dial_target(":7777"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.hosts.push(host("", &["localhost:1"]));
        config.hosts.push(host("a.test", &[]));
        config.hosts.push(host("b.test", &["b.test"]));
        config.timeouts.connect_secs = 0;
        config.prober.initial_delay_ms = 50_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidAddress {
                    field: "listener.bind_address",
                    value: "not-an-address".to_string(),
                },
                ValidationError::EmptyHost { index: 0 },
                ValidationError::NoUpstreams { host: "a.test".to_string() },
                ValidationError::InvalidUpstream {
                    host: "b.test".to_string(),
                    upstream: "b.test".to_string(),
                },
                ValidationError::Zero { field: "timeouts.connect_secs" },
                ValidationError::DelayRange { initial: 50_000, max: 40_000 },
            ]
        );
    }
}
