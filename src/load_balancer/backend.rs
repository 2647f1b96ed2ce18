//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track active connections (for Least Connections LB)
//! - Track a bounded window of recent response times (for Least Response Time LB)
//! - Track health state (Healthy/Unhealthy)

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy = 0,
    Unhealthy = 1,
}

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// The address of the backend.
    pub addr: SocketAddr,
    /// Static weight for weighted load balancing.
    pub weight: u32,
    /// Current health state (0=Healthy, 1=Unhealthy).
    state: AtomicU8,
    /// Number of currently active connections.
    active_connections: AtomicUsize,
    /// Recent response times in seconds, most recent first.
    response_times: Mutex<VecDeque<f64>>,
    /// Maximum number of response time samples retained.
    window_size: usize,
}

impl Backend {
    /// Create a new backend. Backends start healthy so traffic can flow
    /// before the first probe cycle completes.
    pub fn new(addr: SocketAddr, weight: u32, window_size: usize) -> Self {
        Self {
            addr,
            weight,
            state: AtomicU8::new(HealthState::Healthy as u8),
            active_connections: AtomicUsize::new(0),
            response_times: Mutex::new(VecDeque::with_capacity(window_size)),
            window_size,
        }
    }

    /// Return true if the backend is eligible for selection.
    pub fn is_healthy(&self) -> bool {
        self.state.load(Ordering::Acquire) == HealthState::Healthy as u8
    }

    /// Mark the backend healthy. Idempotent: only the Unhealthy→Healthy
    /// transition has side effects. The connection counter resets to zero on
    /// healing; the response-time window is retained.
    pub fn mark_healthy(&self) {
        if self
            .state
            .compare_exchange(
                HealthState::Unhealthy as u8,
                HealthState::Healthy as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.active_connections.store(0, Ordering::Release);
            tracing::info!(addr = %self.addr, "Backend marked healthy");
        }
    }

    /// Mark the backend unhealthy. Idempotent.
    pub fn mark_unhealthy(&self) {
        if self
            .state
            .compare_exchange(
                HealthState::Healthy as u8,
                HealthState::Unhealthy as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            tracing::warn!(addr = %self.addr, "Backend marked unhealthy");
        }
    }

    /// Get the current number of active connections.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Create a guard that holds one connection slot until dropped.
    pub fn acquire(self: &Arc<Self>) -> ConnectionGuard {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            backend: self.clone(),
        }
    }

    fn release(&self) {
        // Saturating: healing resets the counter to zero, so a guard created
        // before the heal must not underflow it.
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_sub(1))
            });
    }

    /// Record an observed response time in seconds, evicting the oldest
    /// sample once the window is full.
    pub fn record_response_time(&self, seconds: f64) {
        let mut window = self.response_times.lock().unwrap();
        window.push_front(seconds);
        window.truncate(self.window_size);
    }

    /// Arithmetic mean of the response-time window, or infinity when no
    /// samples have been observed yet.
    pub fn average_response_time(&self) -> f64 {
        let window = self.response_times.lock().unwrap();
        if window.is_empty() {
            return f64::INFINITY;
        }
        window.iter().sum::<f64>() / window.len() as f64
    }
}

/// A RAII guard that manages the active connection count.
///
/// Dropping the guard releases the slot, so the count balances on every exit
/// path of a request handler, including failures.
#[derive(Debug)]
pub struct ConnectionGuard {
    backend: Arc<Backend>,
}

impl Deref for ConnectionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.backend.release();
    }
}
