//! Controllable HTTP server.
//!
//! # Responsibilities
//! - Wrap any Axum Router as a [`ControllableServer`]
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind plain TCP or rustls TLS
//! - Translate graceful shutdown requests into an Axum server handle
//!
//! # Design Decisions
//! - A server runs at most once; restarting needs a new instance
//! - Shutdown before start is remembered and makes start return at once
//! - Shutdown waits for the serve loop to end, bounded by the deadline

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::watch;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::server::{ControllableServer, ServerError, ShutdownContext};

/// Open connections are forced closed this long before the shutdown deadline.
const CLOSE_MARGIN: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
    Stopped,
}

/// HTTP(S) listener serving an Axum router under supervision.
pub struct HttpServer {
    name: String,
    bind_address: SocketAddr,
    router: Router,
    tls: Option<RustlsConfig>,
    request_timeout: Duration,
    handle: Handle,
    state: Mutex<RunState>,
    shutdown_requested: AtomicBool,
    stopped: watch::Sender<bool>,
}

impl HttpServer {
    /// Create a server that will serve `router` on `bind_address`.
    pub fn new(name: impl Into<String>, bind_address: SocketAddr, router: Router) -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            name: name.into(),
            bind_address,
            router,
            tls: None,
            request_timeout: Duration::from_secs(30),
            handle: Handle::new(),
            state: Mutex::new(RunState::Idle),
            shutdown_requested: AtomicBool::new(false),
            stopped,
        }
    }

    /// Serve over TLS.
    pub fn with_tls(mut self, tls: RustlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Wait until the server is listening and return the bound address.
    ///
    /// Returns `None` if the server stopped before it started listening.
    pub async fn listening(&self) -> Option<SocketAddr> {
        self.handle.listening().await
    }

    #[allow(deprecated)]
    fn build_app(&self) -> Router {
        self.router
            .clone()
            .layer(TimeoutLayer::new(self.request_timeout))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    async fn serve(&self) -> Result<(), ServerError> {
        let listener =
            std::net::TcpListener::bind(self.bind_address).map_err(|source| ServerError::Bind {
                address: self.bind_address.to_string(),
                source,
            })?;
        listener.set_nonblocking(true)?;

        let app = self.build_app().into_make_service();

        match &self.tls {
            Some(tls) => {
                tracing::info!(address = %self.bind_address, "Starting HTTPS server {}", self.name);
                axum_server::tls_rustls::from_tcp_rustls(listener, tls.clone())
                    .handle(self.handle.clone())
                    .serve(app)
                    .await?;
            }
            None => {
                tracing::info!(address = %self.bind_address, "Starting HTTP server {}", self.name);
                axum_server::from_tcp(listener)
                    .handle(self.handle.clone())
                    .serve(app)
                    .await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ControllableServer for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), ServerError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match *state {
                RunState::Running => return Err(ServerError::AlreadyRunning),
                RunState::Stopped => return Err(ServerError::AlreadyStopped),
                RunState::Idle => {}
            }
            if self.shutdown_requested.load(Ordering::SeqCst) {
                *state = RunState::Stopped;
                self.stopped.send_replace(true);
                return Ok(());
            }
            *state = RunState::Running;
        }

        let result = self.serve().await;

        self.set_state(RunState::Stopped);
        self.stopped.send_replace(true);

        let requested = self.shutdown_requested.load(Ordering::SeqCst);
        match result {
            Ok(()) if requested => Ok(()),
            Ok(()) => Err(ServerError::UnexpectedExit),
            Err(e) => Err(e),
        }
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), ServerError> {
        self.shutdown_requested.store(true, Ordering::SeqCst);

        let state = *self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state != RunState::Running {
            return Ok(());
        }

        let budget = ctx.remaining();
        tracing::info!(address = %self.bind_address, "Gracefully stopping server {}", self.name);
        self.handle
            .graceful_shutdown(budget.map(|b| b.saturating_sub(CLOSE_MARGIN)));

        let mut stopped = self.stopped.subscribe();
        let finished = stopped.wait_for(|stopped| *stopped);
        match ctx.deadline() {
            Some(deadline) => match tokio::time::timeout_at(deadline, finished).await {
                Ok(_) => Ok(()),
                Err(_) => Err(ServerError::ShutdownTimeout(budget.unwrap_or_default())),
            },
            None => {
                let _ = finished.await;
                Ok(())
            }
        }
    }
}
