//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor
//!     → server.rs (HttpServer: bind, TLS, graceful stop)
//!     → request.rs (request ID on every request and response)
//!     → status.rs (/health, /metrics, /debug/config)
//! ```

pub mod request;
pub mod server;
pub mod status;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
pub use status::{status_router, status_server, StatusState, STATUS_SERVER_NAME};
