//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Collaborators register probes (mod.rs):
//!     name → Arc<dyn HealthCheck>, kept sorted by name
//!
//! Aggregation (aggregator.rs):
//!     On demand (e.g. GET /health)
//!     → Run every probe in turn, each bounded by the probe timeout
//!     → Count OK / Degraded / Error
//!     → Canonical status = worst status observed
//!
//! Snapshot (result.rs):
//!     Immutable HealthCheckResult → JSON for the status endpoint
//! ```
//!
//! # Design Decisions
//! - Severity order is OK < Degraded < Error; an empty registry is OK
//! - A probe that times out counts as Error
//! - Only one aggregation runs at a time
//! - Registry order is by name so serialized output is reproducible

pub mod aggregator;
pub mod checks;
pub mod result;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use aggregator::HealthAggregator;
pub use checks::{FnCheck, HttpProbe};
pub use result::HealthCheckResult;

/// Tri-state probe outcome, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    #[default]
    #[serde(rename = "OK")]
    Ok,
    Degraded,
    Error,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Ok => "OK",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Error => "Error",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named probe of one dependency or subsystem.
///
/// `check` must not have side effects beyond the probe itself.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn check(&self) -> HealthStatus;
}

/// Registry of health checks keyed by unique name.
#[derive(Clone, Default)]
pub struct HealthChecks {
    checks: BTreeMap<String, Arc<dyn HealthCheck>>,
}

impl HealthChecks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `check` under `name`, replacing any check with that name.
    pub fn add_check(&mut self, name: impl Into<String>, check: Arc<dyn HealthCheck>) {
        let name = name.into();
        if self.checks.insert(name.clone(), check).is_some() {
            tracing::warn!(check = %name, "Replaced existing health check");
        }
    }

    /// Builder form of [`add_check`](Self::add_check).
    pub fn with_check(mut self, name: impl Into<String>, check: Arc<dyn HealthCheck>) -> Self {
        self.add_check(name, check);
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Checks in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn HealthCheck>)> {
        self.checks.iter().map(|(name, check)| (name.as_str(), check))
    }
}

impl fmt::Debug for HealthChecks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.checks.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(HealthStatus::Ok < HealthStatus::Degraded);
        assert!(HealthStatus::Degraded < HealthStatus::Error);
        assert_eq!(
            [HealthStatus::Degraded, HealthStatus::Error, HealthStatus::Ok]
                .into_iter()
                .max(),
            Some(HealthStatus::Error)
        );
    }

    #[test]
    fn status_names() {
        assert_eq!(HealthStatus::Ok.to_string(), "OK");
        assert_eq!(HealthStatus::Degraded.to_string(), "Degraded");
        assert_eq!(HealthStatus::Error.to_string(), "Error");
        assert_eq!(serde_json::to_string(&HealthStatus::Ok).unwrap(), "\"OK\"");
    }

    #[test]
    fn registry_is_sorted_and_replaces_duplicates() {
        let checks = HealthChecks::new()
            .with_check("zeta", Arc::new(FnCheck::new("zeta", || HealthStatus::Ok)))
            .with_check("alpha", Arc::new(FnCheck::new("alpha", || HealthStatus::Ok)))
            .with_check("zeta", Arc::new(FnCheck::new("zeta", || HealthStatus::Error)));

        assert_eq!(checks.len(), 2);
        let names: Vec<&str> = checks.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
