//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, timeouts and probe URLs
//! - Detect duplicate probe names and half-configured TLS
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SupervisorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::Uri;
use thiserror::Error;

use crate::config::schema::SupervisorConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("status.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("status.tls needs both cert_path and key_path (missing {0})")]
    IncompleteTls(&'static str),

    #[error("shutdown.timeout_secs must be greater than zero")]
    ZeroShutdownTimeout,

    #[error("health probe #{0} has an empty name")]
    EmptyProbeName(usize),

    #[error("health probe '{0}' is defined more than once")]
    DuplicateProbe(String),

    #[error("health probe '{name}' has invalid url '{url}': must be an absolute http:// URL")]
    ProbeUrl { name: String, url: String },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    LogLevel(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &SupervisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.status.enabled && config.status.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.status.bind_address.clone()));
    }

    if let Some(tls) = &config.status.tls {
        let has_cert = !tls.cert_path.trim().is_empty();
        let has_key = !tls.key_path.trim().is_empty();
        match (has_cert, has_key) {
            (true, false) => errors.push(ValidationError::IncompleteTls("key_path")),
            (false, true) => errors.push(ValidationError::IncompleteTls("cert_path")),
            _ => {}
        }
    }

    if config.shutdown.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }

    let mut seen = HashSet::new();
    for (i, probe) in config.health.probes.iter().enumerate() {
        if probe.name.trim().is_empty() {
            errors.push(ValidationError::EmptyProbeName(i));
            continue;
        }
        if !seen.insert(probe.name.as_str()) {
            errors.push(ValidationError::DuplicateProbe(probe.name.clone()));
        }

        let valid_url = probe
            .url
            .parse::<Uri>()
            .map(|uri| uri.scheme_str() == Some("http") && uri.authority().is_some())
            .unwrap_or(false);
        if !valid_url {
            errors.push(ValidationError::ProbeUrl {
                name: probe.name.clone(),
                url: probe.url.clone(),
            });
        }
    }

    let level = config.observability.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ProbeConfig, TlsConfig};

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&SupervisorConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = SupervisorConfig::default();
        config.status.bind_address = "not-an-address".into();
        config.status.tls = Some(TlsConfig {
            cert_path: "bundle.crt".into(),
            key_path: String::new(),
        });
        config.shutdown.timeout_secs = Some(0);
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".into()),
                ValidationError::IncompleteTls("key_path"),
                ValidationError::ZeroShutdownTimeout,
                ValidationError::LogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn disabled_status_skips_address_check() {
        let mut config = SupervisorConfig::default();
        config.status.enabled = false;
        config.status.bind_address = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn probe_rules() {
        let probe = |name: &str, url: &str| ProbeConfig {
            name: name.into(),
            url: url.into(),
            description: None,
        };

        let mut config = SupervisorConfig::default();
        config.health.probes = vec![
            probe("api", "http://127.0.0.1:8080/health"),
            probe("api", "http://127.0.0.1:8081/health"),
            probe("", "http://127.0.0.1:8082/health"),
            probe("secure", "https://example.com/health"),
            probe("relative", "/health"),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateProbe("api".into())));
        assert!(errors.contains(&ValidationError::EmptyProbeName(2)));
        assert!(errors.contains(&ValidationError::ProbeUrl {
            name: "secure".into(),
            url: "https://example.com/health".into(),
        }));
        assert!(errors.contains(&ValidationError::ProbeUrl {
            name: "relative".into(),
            url: "/health".into(),
        }));
        assert_eq!(errors.len(), 4);
    }
}
