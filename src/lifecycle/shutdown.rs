//! Shutdown coordination for a supervision run.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::lifecycle::signals::TerminationSignal;

/// Why a supervision run started shutting down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A configured OS termination signal was delivered.
    Signal(TerminationSignal),
    /// A server's `start` returned an error.
    ServerFailed { server: String, error: String },
    /// A server's `start` returned cleanly without anyone asking it to stop.
    ServerStopped { server: String },
    /// Shutdown requested through a [`StopCoordinator`] handle.
    Requested,
}

impl ShutdownCause {
    /// True when the cause is an unexpected server failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, ShutdownCause::ServerFailed { .. })
    }
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownCause::Signal(signal) => write!(f, "received {}", signal),
            ShutdownCause::ServerFailed { server, error } => {
                write!(f, "{} shut down unexpectedly: {}", server, error)
            }
            ShutdownCause::ServerStopped { server } => write!(f, "{} stopped", server),
            ShutdownCause::Requested => write!(f, "shutdown requested"),
        }
    }
}

struct Inner {
    stopping: Mutex<bool>,
    tx: mpsc::Sender<ShutdownCause>,
}

/// Fires the stop broadcast at most once per run.
///
/// Cloning is cheap; every clone shares the same flag and channel.
#[derive(Clone)]
pub struct StopCoordinator {
    inner: Arc<Inner>,
}

/// Receiving end of the stop broadcast.
pub struct StopSignal {
    rx: mpsc::Receiver<ShutdownCause>,
    // Keeps the channel open so `wait` only resolves on a real trigger.
    _keepalive: StopCoordinator,
}

impl StopCoordinator {
    /// Create a coordinator and the signal it fires.
    pub fn new() -> (Self, StopSignal) {
        let (tx, rx) = mpsc::channel(1);
        let coordinator = Self {
            inner: Arc::new(Inner {
                stopping: Mutex::new(false),
                tx,
            }),
        };

        let signal = StopSignal {
            rx,
            _keepalive: coordinator.clone(),
        };

        (coordinator, signal)
    }

    /// Start shutdown unless it has already been started.
    ///
    /// Returns `true` for the one caller that fired the broadcast.
    pub fn trigger(&self, cause: ShutdownCause) -> bool {
        let mut stopping = self
            .inner
            .stopping
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if *stopping {
            if cause.is_failure() {
                tracing::info!(
                    cause = %cause,
                    "Ignored shutdown signal, graceful shutdown already initiated"
                );
            } else {
                tracing::debug!(cause = %cause, "Shutdown already initiated");
            }
            return false;
        }

        *stopping = true;
        if cause.is_failure() {
            tracing::error!(cause = %cause, "Shutting down from error");
        } else {
            tracing::info!(cause = %cause, "Shutting down");
        }

        // Capacity 1 and a single send per run: this cannot be full.
        if self.inner.tx.try_send(cause).is_err() {
            tracing::warn!("Stop broadcast had no listener");
        }
        true
    }

    /// Whether shutdown has been initiated.
    pub fn is_triggered(&self) -> bool {
        *self
            .inner
            .stopping
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl StopSignal {
    /// Wait for the stop broadcast and return its cause.
    pub async fn wait(mut self) -> ShutdownCause {
        // The keepalive sender means `recv` only yields on a trigger.
        self.rx.recv().await.unwrap_or(ShutdownCause::Requested)
    }
}
