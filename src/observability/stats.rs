//! Aggregate request statistics.
//!
//! # Responsibilities
//! - Accumulate per-request outcomes (latency, success/failure) into
//!   process-lifetime counters
//! - Produce the snapshot served by the `/lb/stats` diagnostic endpoint

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Process-lifetime request counters. Independent of the active algorithm.
#[derive(Debug)]
pub struct LoadStats {
    started_at: Instant,
    request_count: AtomicU64,
    error_count: AtomicU64,
    /// Cumulative response time in microseconds.
    total_response_micros: AtomicU64,
}

/// Point-in-time view of the aggregate metrics, with derived rates.
#[derive(Debug, Serialize)]
pub struct StatsSnapshot {
    pub uptime: f64,
    pub request_count: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub avg_response_time: f64,
    pub requests_per_second: f64,
    pub healthy_servers: usize,
    pub total_servers: usize,
}

impl LoadStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            total_response_micros: AtomicU64::new(0),
        }
    }

    /// Record one completed request. `error` covers both transport failures
    /// and backend 5xx responses.
    pub fn record(&self, latency: Duration, error: bool) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_response_micros
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        if error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Compute derived rates from the raw counters.
    pub fn snapshot(&self, healthy_servers: usize, total_servers: usize) -> StatsSnapshot {
        let uptime = self.started_at.elapsed().as_secs_f64();
        let requests = self.request_count.load(Ordering::Relaxed);
        let errors = self.error_count.load(Ordering::Relaxed);
        let total_micros = self.total_response_micros.load(Ordering::Relaxed);

        StatsSnapshot {
            uptime,
            request_count: requests,
            error_count: errors,
            error_rate: if requests > 0 {
                errors as f64 / requests as f64
            } else {
                0.0
            },
            avg_response_time: if requests > 0 {
                total_micros as f64 / 1_000_000.0 / requests as f64
            } else {
                0.0
            },
            requests_per_second: if uptime > 0.0 {
                requests as f64 / uptime
            } else {
                0.0
            },
            healthy_servers,
            total_servers,
        }
    }
}

impl Default for LoadStats {
    fn default() -> Self {
        Self::new()
    }
}
