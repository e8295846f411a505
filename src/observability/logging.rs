//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Pretty format when running locally, JSON everywhere else
//! - `RUST_LOG` wins over the configured level

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Mode;

/// Default filter directives for a level.
pub fn default_directives(level: &str) -> String {
    format!("server_supervisor={level},supervisor_cli={level},tower_http={level}")
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(mode: Mode, level: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives(level).into());

    let (pretty, json) = match mode {
        Mode::Local => (Some(fmt::layer()), None),
        _ => (None, Some(fmt::layer().json().with_current_span(true))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
}
