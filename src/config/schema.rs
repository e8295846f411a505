//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the supervisor.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lifecycle::signals::TerminationSignal;

/// Root configuration for the supervisor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Deployment mode (local, dev, stage, prod).
    pub mode: Mode,

    /// Built-in status listener (health and metrics).
    pub status: StatusConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,

    /// Health aggregation settings and probes.
    pub health: HealthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Where the process is running; drives log format and debug endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Running locally.
    #[default]
    Local,
    /// Running in a remote development environment.
    Dev,
    /// Running in staging.
    Stage,
    /// Running in production.
    Prod,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Local => "LOCAL",
            Mode::Dev => "DEV",
            Mode::Stage => "STAGE",
            Mode::Prod => "PROD",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOCAL" => Ok(Mode::Local),
            "DEV" => Ok(Mode::Dev),
            "STAGE" => Ok(Mode::Stage),
            "PROD" => Ok(Mode::Prod),
            _ => Err(format!("unknown mode: {}", s)),
        }
    }
}

/// Status listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Serve /health and /metrics.
    pub enabled: bool,

    /// Bind address (e.g., "0.0.0.0:10010").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:10010".to_string(),
            tls: None,
            request_timeout_secs: 30,
        }
    }
}

/// TLS configuration for a listener.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate bundle (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

impl TlsConfig {
    /// Neither path set.
    pub fn is_empty(&self) -> bool {
        self.cert_path.trim().is_empty() && self.key_path.trim().is_empty()
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Deadline for server shutdown in seconds; unset waits indefinitely.
    pub timeout_secs: Option<u64>,

    /// Termination signals that start a graceful shutdown.
    pub signals: Vec<TerminationSignal>,
}

impl ShutdownConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Some(30),
            signals: TerminationSignal::defaults(),
        }
    }
}

/// Health aggregation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Per-probe timeout in milliseconds; 0 disables it.
    pub probe_timeout_ms: u64,

    /// HTTP dependencies probed on every health request.
    pub probes: Vec<ProbeConfig>,
}

impl HealthConfig {
    pub fn probe_timeout(&self) -> Option<Duration> {
        (self.probe_timeout_ms > 0).then(|| Duration::from_millis(self.probe_timeout_ms))
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 2_000,
            probes: Vec::new(),
        }
    }
}

/// An HTTP health probe.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Unique check name.
    pub name: String,

    /// URL to GET (http only).
    pub url: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Serve Prometheus metrics on the status listener.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
