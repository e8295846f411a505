//! Server supervisor library.
//!
//! Runs a set of long-lived servers in one process, stops all of them
//! exactly once when any exits or a termination signal arrives, and serves
//! an aggregated health snapshot.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;

pub use config::schema::SupervisorConfig;
pub use health::{HealthAggregator, HealthCheck, HealthCheckResult, HealthChecks, HealthStatus};
pub use http::HttpServer;
pub use lifecycle::{
    Service, ShutdownCause, ShutdownReport, StopCoordinator, Supervisor, TerminationSignal,
};
pub use server::{ControllableServer, ServerError, ShutdownContext};
