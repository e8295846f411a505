//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor, servers, health endpoint produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty locally, JSON elsewhere)
//!     → GET /metrics on the status server (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The binary installs the subscriber; startup installs the recorder once
//! - Metrics are cheap and silently dropped without a recorder

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::install_recorder;
