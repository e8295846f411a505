//! Network foundation subsystem.
//!
//! # Data Flow
//! ```text
//! TlsConfig (cert bundle + key paths)
//!     → tls.rs (validate PEM, build rustls config)
//!     → http::server (bind_rustls instead of plain bind)
//! ```
//!
//! # Design Decisions
//! - Plain TCP when no TLS paths are configured
//! - A half-configured TLS pair is rejected rather than silently ignored

pub mod tls;

pub use tls::load_tls_config;
