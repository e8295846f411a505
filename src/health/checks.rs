//! Ready-made health checks.
//!
//! # Responsibilities
//! - Wrap in-process conditions as checks (`FnCheck`)
//! - Probe HTTP dependencies (`HttpProbe`)

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::health::{HealthCheck, HealthStatus};

/// Health check backed by a closure.
pub struct FnCheck<F> {
    name: String,
    description: String,
    probe: F,
}

impl<F> FnCheck<F>
where
    F: Fn() -> HealthStatus + Send + Sync,
{
    pub fn new(name: impl Into<String>, probe: F) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            probe,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl<F> HealthCheck for FnCheck<F>
where
    F: Fn() -> HealthStatus + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn check(&self) -> HealthStatus {
        (self.probe)()
    }
}

/// Probes an HTTP endpoint with a GET request.
///
/// 2xx is OK, 5xx or a connection failure is Error, anything else Degraded.
pub struct HttpProbe {
    name: String,
    description: String,
    url: String,
    client: Client<HttpConnector, Body>,
}

impl HttpProbe {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let url = url.into();
        Self {
            name: name.into(),
            description: format!("GET {}", url),
            url,
            client,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Map a probe response code onto a health status.
pub fn classify_status(status: StatusCode) -> HealthStatus {
    if status.is_success() {
        HealthStatus::Ok
    } else if status.is_server_error() {
        HealthStatus::Error
    } else {
        HealthStatus::Degraded
    }
}

#[async_trait]
impl HealthCheck for HttpProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn check(&self) -> HealthStatus {
        let request = match Request::builder()
            .method("GET")
            .uri(&self.url)
            .header("user-agent", "server-supervisor-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(check = %self.name, error = %e, "Failed to build health check request");
                return HealthStatus::Error;
            }
        };

        match self.client.request(request).await {
            Ok(response) => {
                let status = classify_status(response.status());
                if status != HealthStatus::Ok {
                    tracing::warn!(
                        check = %self.name,
                        url = %self.url,
                        status = %response.status(),
                        "Health probe returned non-success status"
                    );
                }
                status
            }
            Err(e) => {
                tracing::warn!(check = %self.name, url = %self.url, error = %e, "Health probe connection error");
                HealthStatus::Error
            }
        }
    }
}
