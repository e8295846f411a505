//! Errors reported by controllable servers.

use std::time::Duration;

use thiserror::Error;

/// Error returned from [`ControllableServer::start`] or
/// [`ControllableServer::shutdown`].
///
/// [`ControllableServer::start`]: super::ControllableServer::start
/// [`ControllableServer::shutdown`]: super::ControllableServer::shutdown
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server already running")]
    AlreadyRunning,

    #[error("server has already stopped and cannot be restarted")]
    AlreadyStopped,

    #[error("server exited without a shutdown request")]
    UnexpectedExit,

    #[error("shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("{0}")]
    Other(String),
}

impl ServerError {
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}
