//! Controllable server capability.
//!
//! # Data Flow
//! ```text
//! collaborator builds server (HTTP, RPC, pub/sub, ...)
//!     → Supervisor spawns start() (blocks for the server's lifetime)
//!     → stop broadcast fires
//!     → Supervisor calls shutdown(ctx) on every server
//!     → start() returns Ok(()) once the requested stop completes
//! ```
//!
//! # Design Decisions
//! - One trait for every listener kind; concrete kinds live with their framework
//! - `start` returning `Ok(())` means "stopped because we asked it to"
//! - `shutdown` must be a harmless no-op before start and after stop
//! - A server instance belongs to exactly one supervision run

pub mod error;

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

pub use error::ServerError;

/// A long-running, blocking network listener under supervision.
#[async_trait]
pub trait ControllableServer: Send + Sync {
    /// Name used for logging and shutdown reports.
    fn name(&self) -> &str;

    /// Run the server until it stops.
    ///
    /// Returns `Ok(())` when the stop was requested through [`shutdown`],
    /// and an error for any other kind of exit.
    ///
    /// [`shutdown`]: ControllableServer::shutdown
    async fn start(&self) -> Result<(), ServerError>;

    /// Request graceful termination and wait for it to complete.
    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), ServerError>;
}

/// Deadline handed to every [`ControllableServer::shutdown`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShutdownContext {
    deadline: Option<Instant>,
}

impl ShutdownContext {
    /// A context without a deadline.
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Build from an optional timeout.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::with_timeout).unwrap_or_default()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }
}
