//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (SUPERVISOR_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → SupervisorConfig (validated, immutable)
//!     → shared via Arc with the status server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a supervision run never reloads it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Errors are returned to the caller, never a process exit

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    HealthConfig, Mode, ObservabilityConfig, ProbeConfig, ShutdownConfig, StatusConfig,
    SupervisorConfig, TlsConfig,
};
pub use validation::ValidationError;
