//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated config into a ready-to-run supervisor
//! - Build the health aggregator from configured probes and custom checks
//! - Install the metrics recorder and load status listener TLS
//! - Put the status server in front of the caller's servers
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned before a server starts
//! - Preparation is separate from running so callers can grab handles

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, SupervisorConfig, ValidationError};
use crate::health::{HealthAggregator, HealthCheck, HealthChecks, HttpProbe};
use crate::http::{status_server, HttpServer, StatusState};
use crate::lifecycle::orchestrator::{ShutdownReport, Supervisor, SupervisorError};
use crate::lifecycle::shutdown::StopCoordinator;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::server::ControllableServer;

/// Error type for startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),
}

/// A configured process: health checks plus the servers it supervises.
pub struct Service {
    config: SupervisorConfig,
    checks: HealthChecks,
}

impl Service {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            checks: HealthChecks::new(),
        }
    }

    /// Register an application health check next to the configured probes.
    pub fn with_health_check(mut self, name: impl Into<String>, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.add_check(name, check);
        self
    }

    pub fn health_checks(&self) -> &HealthChecks {
        &self.checks
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Wire everything up without starting anything.
    pub async fn prepare(
        self,
        servers: Vec<Arc<dyn ControllableServer>>,
    ) -> Result<PreparedRun, StartupError> {
        let Service { config, mut checks } = self;

        for probe in &config.health.probes {
            let mut check = HttpProbe::new(probe.name.clone(), probe.url.clone());
            if let Some(description) = &probe.description {
                check = check.with_description(description.clone());
            }
            checks.add_check(probe.name.clone(), Arc::new(check));
        }

        let span = tracing::info_span!("supervisor", mode = %config.mode);

        let mut aggregator = HealthAggregator::new(checks)
            .with_span(tracing::info_span!(parent: &span, "health"));
        if let Some(timeout) = config.health.probe_timeout() {
            aggregator = aggregator.with_probe_timeout(timeout);
        }
        let aggregator = Arc::new(aggregator);

        let status = if config.status.enabled {
            Some(Arc::new(build_status_server(&config, Arc::clone(&aggregator)).await?))
        } else {
            tracing::info!("Status listener disabled");
            None
        };

        let supervisor = Supervisor::new()
            .with_signals(config.shutdown.signals.clone())
            .with_shutdown_timeout(config.shutdown.timeout())
            .with_span(span);

        let mut all: Vec<Arc<dyn ControllableServer>> = Vec::with_capacity(servers.len() + 1);
        if let Some(status) = &status {
            all.push(Arc::clone(status) as Arc<dyn ControllableServer>);
        }
        all.extend(servers);

        tracing::info!(
            mode = %config.mode,
            servers = all.len(),
            health_checks = aggregator.checks().len(),
            "Startup prepared"
        );

        Ok(PreparedRun {
            supervisor,
            servers: all,
            status,
            health: aggregator,
        })
    }

    /// Prepare and run to completion.
    pub async fn run(
        self,
        servers: Vec<Arc<dyn ControllableServer>>,
    ) -> Result<ShutdownReport, StartupError> {
        self.prepare(servers).await?.run().await
    }
}

async fn build_status_server(
    config: &SupervisorConfig,
    health: Arc<HealthAggregator>,
) -> Result<HttpServer, ConfigError> {
    let bind_address: SocketAddr = config.status.bind_address.parse().map_err(|_| {
        ConfigError::Validation(vec![ValidationError::BindAddress(
            config.status.bind_address.clone(),
        )])
    })?;

    let metrics = if config.observability.metrics_enabled {
        metrics::install_recorder()
    } else {
        None
    };

    let tls = match &config.status.tls {
        Some(tls) => load_tls_config(tls).await?,
        None => None,
    };

    let state = StatusState {
        health,
        metrics,
        config: Arc::new(config.clone()),
    };

    let server = status_server(bind_address, state);
    Ok(match tls {
        Some(tls) => server.with_tls(tls),
        None => server,
    })
}

/// Everything needed to run, with handles available before the run starts.
pub struct PreparedRun {
    supervisor: Supervisor,
    servers: Vec<Arc<dyn ControllableServer>>,
    status: Option<Arc<HttpServer>>,
    health: Arc<HealthAggregator>,
}

impl PreparedRun {
    /// Request shutdown from outside the run.
    pub fn stop_handle(&self) -> StopCoordinator {
        self.supervisor.stop_handle()
    }

    /// The status listener, when enabled.
    pub fn status_server(&self) -> Option<Arc<HttpServer>> {
        self.status.clone()
    }

    pub fn health(&self) -> Arc<HealthAggregator> {
        Arc::clone(&self.health)
    }

    /// Names of the supervised servers, status listener first.
    pub fn server_names(&self) -> Vec<String> {
        self.servers.iter().map(|s| s.name().to_string()).collect()
    }

    pub async fn run(self) -> Result<ShutdownReport, StartupError> {
        Ok(self.supervisor.run(self.servers).await?)
    }
}
