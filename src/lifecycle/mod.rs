//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Status server + health aggregator → Supervisor
//!
//! Orchestration (orchestrator.rs):
//!     Spawn start() per server → wait for stop broadcast → shutdown() per server
//!
//! Shutdown (shutdown.rs):
//!     Server failure / signal / request → StopCoordinator → single broadcast
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGQUIT (configurable) → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Startup and shutdown are both maximally concurrent, no sibling ordering
//! - The stop broadcast fires at most once per run and cannot be revoked
//! - Shutdown errors are reported, never escalated
//! - A shutdown deadline is advisory: stragglers are logged, not killed

pub mod orchestrator;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use orchestrator::{ServerFailure, ShutdownReport, Supervisor, SupervisorError};
pub use shutdown::{ShutdownCause, StopCoordinator, StopSignal};
pub use signals::TerminationSignal;
pub use startup::{PreparedRun, Service, StartupError};
