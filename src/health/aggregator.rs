//! Roll-up of registered health checks into one result.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time;
use tracing::{Instrument, Span};

use crate::health::{HealthChecks, HealthCheckResult, HealthStatus};

/// Runs a [`HealthChecks`] registry on demand.
pub struct HealthAggregator {
    checks: HealthChecks,
    probe_timeout: Option<Duration>,
    span: Span,
    // Only one aggregation at a time.
    run_lock: Mutex<()>,
}

impl HealthAggregator {
    pub fn new(checks: HealthChecks) -> Self {
        Self {
            checks,
            probe_timeout: None,
            span: tracing::info_span!("health"),
            run_lock: Mutex::new(()),
        }
    }

    /// Bound every probe; a probe exceeding it counts as Error.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Span probe logging is recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn checks(&self) -> &HealthChecks {
        &self.checks
    }

    /// Run every check and summarize the results.
    pub async fn run_checks(&self) -> HealthCheckResult {
        let _guard = self.run_lock.lock().await;
        self.collect().instrument(self.span.clone()).await
    }

    async fn collect(&self) -> HealthCheckResult {
        let timestamp = Utc::now();
        let mut result = HealthCheckResult {
            timestamp,
            canonical_status: HealthStatus::Ok,
            total_ok: 0,
            total_degraded: 0,
            total_error: 0,
            total: self.checks.len() as u64,
            status_map: BTreeMap::new(),
        };

        for (name, check) in self.checks.iter() {
            let status = match self.probe_timeout {
                Some(timeout) => match time::timeout(timeout, check.check()).await {
                    Ok(status) => status,
                    Err(_) => {
                        tracing::warn!(check = %name, timeout = ?timeout, "Health check timed out");
                        HealthStatus::Error
                    }
                },
                None => check.check().await,
            };

            match status {
                HealthStatus::Ok => result.total_ok += 1,
                HealthStatus::Degraded => result.total_degraded += 1,
                HealthStatus::Error => result.total_error += 1,
            }

            if status > result.canonical_status {
                result.canonical_status = status;
            }

            if status != HealthStatus::Ok {
                tracing::debug!(check = %name, status = %status, "Health check not OK");
            }
            result.status_map.insert(name.to_string(), status);
        }

        result
    }
}
