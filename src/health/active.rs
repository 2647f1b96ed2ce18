//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe backends
//! - Update backend health state based on results
//! - Feed probe round-trip times into the response-time windows

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::schema::HealthCheckConfig;
use crate::load_balancer::pool::BackendPool;
use crate::observability::metrics;

pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            pool,
            config,
            client,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn check_all(&self) {
        for backend in self.pool.backends() {
            let addr = backend.addr;
            let uri_string = format!("http://{}{}", addr, self.config.path);

            let request = match Request::builder()
                .method("GET")
                .uri(uri_string)
                .header("user-agent", "lb-proxy-health-check")
                .body(Body::empty())
            {
                Ok(req) => req,
                Err(e) => {
                    tracing::error!("Failed to build health check request: {}", e);
                    continue;
                }
            };

            let timeout = Duration::from_secs(self.config.timeout_secs);
            let probe_start = Instant::now();

            let healthy = match time::timeout(timeout, self.client.request(request)).await {
                Ok(Ok(response)) => {
                    // 5xx on the probe means unhealthy; anything else (2xx,
                    // 3xx, even 4xx) proves the backend is serving.
                    let up = !response.status().is_server_error();
                    if up {
                        backend.record_response_time(probe_start.elapsed().as_secs_f64());
                    } else {
                        tracing::warn!(addr = %addr, status = %response.status(), "Health check failed: server error status");
                    }
                    up
                }
                Ok(Err(e)) => {
                    tracing::warn!(addr = %addr, error = %e, "Health check failed: connection error");
                    false
                }
                Err(_) => {
                    tracing::warn!(addr = %addr, "Health check failed: timeout");
                    false
                }
            };

            if healthy {
                backend.mark_healthy();
            } else {
                backend.mark_unhealthy();
            }

            metrics::record_backend_health(&addr.to_string(), backend.is_healthy());
        }
    }
}
