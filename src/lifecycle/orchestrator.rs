//! Concurrent startup and coordinated shutdown of controllable servers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{Instrument, Span};

use crate::lifecycle::shutdown::{ShutdownCause, StopCoordinator, StopSignal};
use crate::lifecycle::signals::{spawn_signal_watchers, TerminationSignal};
use crate::observability::metrics;
use crate::server::{ControllableServer, ServerError, ShutdownContext};

/// Precondition failures that stop a run before any server starts.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to install handler for {signal}: {source}")]
    SignalHandler {
        signal: TerminationSignal,
        #[source]
        source: std::io::Error,
    },
}

/// A server whose shutdown returned an error.
#[derive(Debug)]
pub struct ServerFailure {
    pub server: String,
    pub error: ServerError,
}

/// Outcome of a completed supervision run.
#[derive(Debug)]
pub struct ShutdownReport {
    /// What fired the stop broadcast.
    pub cause: ShutdownCause,
    /// Servers whose shutdown failed.
    pub failures: Vec<ServerFailure>,
    /// Servers still shutting down when the deadline passed.
    pub timed_out: Vec<String>,
}

impl ShutdownReport {
    /// True when nothing failed and every server stopped in time.
    pub fn is_clean(&self) -> bool {
        !self.cause.is_failure() && self.failures.is_empty() && self.timed_out.is_empty()
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.is_clean() {
            0
        } else {
            1
        }
    }
}

/// Supervises a set of [`ControllableServer`]s for one run.
///
/// Every server starts concurrently. The first unexpected exit, configured
/// termination signal, or explicit request fires a single stop broadcast,
/// after which every server is asked to shut down concurrently.
pub struct Supervisor {
    signals: Vec<TerminationSignal>,
    shutdown_timeout: Option<Duration>,
    span: Span,
    coordinator: StopCoordinator,
    stop_signal: StopSignal,
}

impl Supervisor {
    /// Create a supervisor with no signal handling and no shutdown deadline.
    pub fn new() -> Self {
        let (coordinator, stop_signal) = StopCoordinator::new();
        Self {
            signals: Vec::new(),
            shutdown_timeout: None,
            span: tracing::info_span!("supervisor"),
            coordinator,
            stop_signal,
        }
    }

    /// Termination signals that start a graceful shutdown.
    pub fn with_signals(mut self, signals: Vec<TerminationSignal>) -> Self {
        self.signals = signals;
        self
    }

    /// Deadline handed to every server's shutdown.
    pub fn with_shutdown_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Span all supervisor logging is recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Handle for requesting shutdown from outside the run.
    pub fn stop_handle(&self) -> StopCoordinator {
        self.coordinator.clone()
    }

    /// Run every server until shutdown completes.
    ///
    /// Returns only after every server's shutdown has returned, or after the
    /// shutdown deadline when one is configured.
    pub async fn run(
        self,
        servers: Vec<Arc<dyn ControllableServer>>,
    ) -> Result<ShutdownReport, SupervisorError> {
        let span = self.span.clone();
        self.run_inner(servers).instrument(span).await
    }

    async fn run_inner(
        self,
        servers: Vec<Arc<dyn ControllableServer>>,
    ) -> Result<ShutdownReport, SupervisorError> {
        let Supervisor {
            signals,
            shutdown_timeout,
            coordinator,
            stop_signal,
            ..
        } = self;

        // Signal handlers go in before anything can fail.
        let watchers = if signals.is_empty() {
            Vec::new()
        } else {
            tracing::info!(
                signals = ?signals.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                "Starting graceful shutdown handler"
            );
            spawn_signal_watchers(&signals, &coordinator)
                .map_err(|(signal, source)| SupervisorError::SignalHandler { signal, source })?
        };

        tracing::info!(servers = servers.len(), "Starting controllable servers");
        for server in &servers {
            spawn_start(Arc::clone(server), coordinator.clone());
        }

        let cause = stop_signal.wait().await;
        tracing::info!(cause = %cause, "Stop broadcast received, shutting down servers");

        let ctx = ShutdownContext::from_timeout(shutdown_timeout);
        let (failures, timed_out) = shutdown_all(&servers, ctx).await;

        for watcher in watchers {
            watcher.abort();
        }

        tracing::info!(
            failures = failures.len(),
            timed_out = timed_out.len(),
            "Stopped"
        );

        Ok(ShutdownReport {
            cause,
            failures,
            timed_out,
        })
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_start(server: Arc<dyn ControllableServer>, coordinator: StopCoordinator) {
    let name = server.name().to_string();
    let span = tracing::info_span!("server", server = %name);

    tokio::spawn(
        async move {
            tracing::info!("Starting controllable server {}", name);
            metrics::record_server_start(&name);

            let cause = match server.start().await {
                Ok(()) => {
                    tracing::info!("{} stopped", name);
                    ShutdownCause::ServerStopped { server: name }
                }
                Err(e) => {
                    tracing::error!(error = %e, "{} shut down unexpectedly", name);
                    metrics::record_server_failure(&name);
                    ShutdownCause::ServerFailed {
                        server: name,
                        error: e.to_string(),
                    }
                }
            };

            // No-op when this exit was itself caused by the shutdown.
            coordinator.trigger(cause);
        }
        .instrument(span),
    );
}

async fn shutdown_all(
    servers: &[Arc<dyn ControllableServer>],
    ctx: ShutdownContext,
) -> (Vec<ServerFailure>, Vec<String>) {
    let mut tasks = JoinSet::new();
    let mut pending = HashMap::with_capacity(servers.len());

    for server in servers {
        let server = Arc::clone(server);
        let name = server.name().to_string();
        let span = tracing::info_span!("server", server = %name);
        let handle = tasks.spawn(
            async move {
                tracing::info!("Gracefully stopping {}", server.name());
                let result = server.shutdown(ctx).await;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "{} error during shutdown", server.name());
                    metrics::record_shutdown_error(server.name());
                }
                result
            }
            .instrument(span),
        );
        pending.insert(handle.id(), name);
    }

    let mut failures = Vec::new();
    loop {
        let next = match ctx.deadline() {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                    Ok(next) => next,
                    Err(_) => break,
                }
            }
            None => tasks.join_next_with_id().await,
        };

        let Some(joined) = next else { break };
        let (id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(e) => {
                tracing::error!(error = %e, "Shutdown task panicked");
                (e.id(), Err(ServerError::other("shutdown panicked")))
            }
        };

        let server = pending.remove(&id).unwrap_or_default();
        if let Err(error) = result {
            failures.push(ServerFailure { server, error });
        }
    }

    let mut timed_out: Vec<String> = pending.into_values().collect();
    if !timed_out.is_empty() {
        timed_out.sort();
        for name in &timed_out {
            tracing::warn!(server = %name, "Shutdown timed out");
        }
        // Leave stragglers running; forced termination is not ours to do.
        tasks.detach_all();
    }

    (failures, timed_out)
}
