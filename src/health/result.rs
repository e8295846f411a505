//! Health check snapshot and its wire format.
//!
//! ```text
//! {"time":"2024-05-01T12:00:00.123456789Z",
//!  "healthchecks.check.db":"OK",
//!  "healthchecks.total":1,"healthchecks.ok":1,"healthchecks.degraded":0,
//!  "healthchecks.error":0,"healthchecks.status":"OK"}
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::health::HealthStatus;

const CHECK_KEY_PREFIX: &str = "healthchecks.check.";

/// Immutable result of one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthCheckResult {
    pub timestamp: DateTime<Utc>,
    pub canonical_status: HealthStatus,

    pub total_ok: u64,
    pub total_degraded: u64,
    pub total_error: u64,

    pub total: u64,

    /// Status of every check, keyed and ordered by name.
    pub status_map: BTreeMap<String, HealthStatus>,
}

impl HealthCheckResult {
    /// HTTP status a status endpoint answers with: 503 on Error, 200 otherwise.
    pub fn http_status_code(&self) -> u16 {
        if self.canonical_status == HealthStatus::Error {
            503
        } else {
            200
        }
    }

    /// Snapshot timestamp as RFC 3339 with nanoseconds.
    pub fn time_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    pub fn to_json(&self) -> String {
        // Every key is a string and every value a string or integer.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for HealthCheckResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.status_map.len() + 6))?;
        map.serialize_entry("time", &self.time_rfc3339())?;
        for (name, status) in &self.status_map {
            map.serialize_entry(&format!("{}{}", CHECK_KEY_PREFIX, name), status.as_str())?;
        }
        map.serialize_entry("healthchecks.total", &self.total)?;
        map.serialize_entry("healthchecks.ok", &self.total_ok)?;
        map.serialize_entry("healthchecks.degraded", &self.total_degraded)?;
        map.serialize_entry("healthchecks.error", &self.total_error)?;
        map.serialize_entry("healthchecks.status", self.canonical_status.as_str())?;
        map.end()
    }
}
