//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use server_supervisor::{ControllableServer, ServerError, ShutdownContext};

/// How a [`MockServer`]'s start behaves.
#[derive(Debug, Clone, Copy)]
enum StartBehavior {
    /// Serve until shutdown is requested.
    UntilShutdown,
    /// Return an error after a delay.
    FailAfter(Duration),
    /// Return gracefully on its own after a delay.
    ExitAfter(Duration),
}

/// Controllable server that counts its lifecycle calls.
pub struct MockServer {
    name: String,
    start_behavior: StartBehavior,
    shutdown_error: bool,
    hang_on_shutdown: bool,
    starts: AtomicUsize,
    shutdowns: AtomicUsize,
    started: Notify,
    stop: Notify,
}

impl MockServer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start_behavior: StartBehavior::UntilShutdown,
            shutdown_error: false,
            hang_on_shutdown: false,
            starts: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            started: Notify::new(),
            stop: Notify::new(),
        }
    }

    pub fn failing_after(mut self, delay: Duration) -> Self {
        self.start_behavior = StartBehavior::FailAfter(delay);
        self
    }

    pub fn exiting_after(mut self, delay: Duration) -> Self {
        self.start_behavior = StartBehavior::ExitAfter(delay);
        self
    }

    pub fn with_shutdown_error(mut self) -> Self {
        self.shutdown_error = true;
        self
    }

    pub fn hanging_on_shutdown(mut self) -> Self {
        self.hang_on_shutdown = true;
        self
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Wait until start has been entered at least once.
    pub async fn wait_started(&self) {
        if self.starts() > 0 {
            return;
        }
        self.started.notified().await;
    }
}

#[async_trait]
impl ControllableServer for MockServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), ServerError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();

        match self.start_behavior {
            StartBehavior::UntilShutdown => {
                self.stop.notified().await;
                Ok(())
            }
            StartBehavior::FailAfter(delay) => {
                tokio::time::sleep(delay).await;
                Err(ServerError::other(format!("{} crashed", self.name)))
            }
            StartBehavior::ExitAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    async fn shutdown(&self, _ctx: ShutdownContext) -> Result<(), ServerError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.stop.notify_one();

        if self.hang_on_shutdown {
            std::future::pending::<()>().await;
        }
        if self.shutdown_error {
            return Err(ServerError::other("listener close failed"));
        }
        Ok(())
    }
}

/// Wrap mocks for handing to the supervisor.
pub fn as_servers(mocks: &[Arc<MockServer>]) -> Vec<Arc<dyn ControllableServer>> {
    mocks
        .iter()
        .map(|m| Arc::clone(m) as Arc<dyn ControllableServer>)
        .collect()
}

/// Start a programmable HTTP backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that always answers with `status`.
pub async fn start_fixed_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { (status, "ok".to_string()) }).await
}
