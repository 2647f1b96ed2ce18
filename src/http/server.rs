//! HTTP server setup and request forwarding.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy catch-all and the stats endpoint
//! - Wire up middleware (tracing)
//! - Dispatch requests through the configured load balancing algorithm
//! - Forward requests to backends with a bounded timeout
//! - Demote backends on transport failure (fast failover)
//! - Record request outcomes into the aggregate stats

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::uri::{Authority, Scheme},
    http::{header, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::health::active::HealthMonitor;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{make_balancer, pool::BackendPool, LoadBalancer};
use crate::observability::metrics;
use crate::observability::stats::LoadStats;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<BackendPool>,
    pub balancer: Arc<dyn LoadBalancer>,
    pub client: Client<HttpConnector, Body>,
    pub stats: Arc<LoadStats>,
    pub forward_timeout: Duration,
}

/// HTTP server for the load balancing proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pool: Arc<BackendPool>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let pool = Arc::new(BackendPool::new(
            &config.backends,
            config.balancer.response_time_window,
        ));
        let balancer: Arc<dyn LoadBalancer> = make_balancer(&config.balancer.algorithm).into();

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            pool: pool.clone(),
            balancer,
            client,
            stats: Arc::new(LoadStats::new()),
            forward_timeout: Duration::from_secs(config.timeouts.forward_secs),
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/lb/stats", get(stats_handler))
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            algorithm = %self.config.balancer.algorithm,
            backends = self.pool.len(),
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(self.pool.clone(), self.config.health_check.clone());
        let monitor_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            monitor.run(monitor_shutdown).await;
        });

        let mut rx = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown signal received");
                    }
                    _ = rx.recv() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Diagnostic endpoint: aggregate metrics as JSON.
async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(
        state
            .stats
            .snapshot(state.pool.healthy_count(), state.pool.len()),
    )
}

/// Main proxy handler: select a backend, forward, relay.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let method_str = method.to_string();
    let path = request.uri().path().to_string();

    // 1. Select a backend. An empty healthy set is an expected outcome
    //    (total outage), answered directly without contacting anyone.
    let backend = match state.balancer.next_server(state.pool.backends()) {
        Some(b) => b,
        None => {
            tracing::warn!(method = %method, path = %path, "No servers available");
            metrics::record_request(&method_str, 503, "none", start_time);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": "No servers available"})),
            )
                .into_response();
        }
    };

    // Holds one connection slot until this handler returns, on every path.
    let guard = backend.acquire();
    let backend_addr = backend.addr.to_string();

    tracing::debug!(
        method = %method,
        path = %path,
        backend = %backend_addr,
        "Forwarding request"
    );

    // 2. Rewrite the target and forward verbatim, minus the host header
    //    which would conflict with the new destination.
    let (parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    if let Ok(authority) = Authority::from_str(&backend_addr) {
        uri_parts.authority = Some(authority);
    }
    let uri = Uri::from_parts(uri_parts).unwrap_or_else(|_| parts.uri.clone());

    let mut builder = Request::builder()
        .method(method.clone())
        .uri(uri)
        .version(parts.version);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            if name != header::HOST {
                headers.insert(name.clone(), value.clone());
            }
        }
    }
    let forwarded = match builder.body(body) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build forwarded request");
            return gateway_error(&state.stats, &method_str, &backend_addr, start_time);
        }
    };

    match tokio::time::timeout(state.forward_timeout, state.client.request(forwarded)).await {
        // 3. Backend answered. Any status received counts as a completed
        //    forward; 5xx is a metrics error but never demotes health.
        Ok(Ok(response)) => {
            let latency = start_time.elapsed();
            let status = response.status();

            guard.record_response_time(latency.as_secs_f64());
            state.stats.record(latency, status.is_server_error());
            metrics::record_request(&method_str, status.as_u16(), &backend_addr, start_time);

            tracing::debug!(
                backend = %backend_addr,
                status = %status,
                latency_secs = latency.as_secs_f64(),
                "Request completed"
            );

            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        // 4. Transport failure or timeout: identical handling. Demote the
        //    backend now rather than waiting for the next probe cycle.
        Ok(Err(e)) => {
            tracing::error!(backend = %backend_addr, error = %e, "Upstream request failed");
            fail_request(&state, &guard, &method_str, &backend_addr, start_time)
        }
        Err(_) => {
            tracing::error!(backend = %backend_addr, "Upstream request timed out");
            fail_request(&state, &guard, &method_str, &backend_addr, start_time)
        }
    }
}

fn fail_request(
    state: &AppState,
    guard: &crate::load_balancer::backend::ConnectionGuard,
    method: &str,
    backend_addr: &str,
    start_time: Instant,
) -> Response {
    guard.mark_unhealthy();
    gateway_error(&state.stats, method, backend_addr, start_time)
}

/// Terminal 502 path: every gateway error is recorded in the aggregate
/// stats and the metrics facade before answering the client.
fn gateway_error(
    stats: &LoadStats,
    method: &str,
    backend_addr: &str,
    start_time: Instant,
) -> Response {
    stats.record(start_time.elapsed(), true);
    metrics::record_request(method, 502, backend_addr, start_time);

    (
        StatusCode::BAD_GATEWAY,
        Json(json!({"error": "Upstream request failed"})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_records_outcome() {
        let stats = LoadStats::new();

        let response = gateway_error(&stats, "GET", "127.0.0.1:5001", Instant::now());
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let snap = stats.snapshot(0, 1);
        assert_eq!(snap.request_count, 1);
        assert_eq!(snap.error_count, 1);
    }
}
