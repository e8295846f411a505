//! Configuration loading from disk and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{Mode, SupervisorConfig, TlsConfig};
use crate::config::validation::{validate_config, ValidationError};

pub const MODE_ENV: &str = "SUPERVISOR_MODE";
pub const PORT_ENV: &str = "SUPERVISOR_PORT";
pub const TLS_BUNDLE_CRT_ENV: &str = "SUPERVISOR_TLS_BUNDLE_CRT";
pub const TLS_KEY_ENV: &str = "SUPERVISOR_TLS_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("TLS error: {0}")]
    Tls(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file plus process environment.
pub fn load_config(path: Option<&Path>) -> Result<SupervisorConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading overrides through `env`.
pub fn load_config_with_env<F>(path: Option<&Path>, env: F) -> Result<SupervisorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => SupervisorConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `SUPERVISOR_*` environment overrides on top of `config`.
pub fn apply_env_overrides<F>(config: &mut SupervisorConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| {
        env(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(mode) = lookup(MODE_ENV) {
        config.mode = match mode.parse::<Mode>() {
            Ok(mode) => mode,
            Err(message) => {
                tracing::warn!(value = %mode, "{}, falling back to LOCAL", message);
                Mode::Local
            }
        };
        tracing::debug!(mode = %config.mode, "Mode set from environment");
    }

    if let Some(port) = lookup(PORT_ENV) {
        let port: u16 = port.parse().map_err(|e| ConfigError::Env {
            var: PORT_ENV,
            message: format!("'{}' is not a port: {}", port, e),
        })?;
        config.status.bind_address = with_port(&config.status.bind_address, port);
    }

    let crt = lookup(TLS_BUNDLE_CRT_ENV);
    let key = lookup(TLS_KEY_ENV);
    if crt.is_some() || key.is_some() {
        let tls = config.status.tls.get_or_insert_with(TlsConfig::default);
        if let Some(crt) = crt {
            tls.cert_path = crt;
        }
        if let Some(key) = key {
            tls.key_path = key;
        }
    }

    Ok(())
}

fn with_port(bind_address: &str, port: u16) -> String {
    match bind_address.parse::<SocketAddr>() {
        Ok(mut addr) => {
            addr.set_port(port);
            addr.to_string()
        }
        Err(_) => format!("0.0.0.0:{}", port),
    }
}
