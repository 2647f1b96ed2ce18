//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (full ordered backend list)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through healthy backends)
//!         - weighted_round_robin.rs (smooth weighted rotation)
//!         - least_conn.rs (fewest active connections, RR tie-break)
//!         - least_response_time.rs (lowest recent average latency)
//!     → backend.rs (acquire connection guard)
//!     → Forward request or report no backend available
//! ```
//!
//! # Design Decisions
//! - Algorithms see the full pool and filter to the healthy subset at call
//!   time, so a mid-rotation health change is picked up on the next call
//! - Returning `None` is the expected total-outage signal, not an error
//! - Per-backend state lives on `Backend` (atomics, short mutexes); the
//!   algorithms hold only their own cursor/weight state

use std::fmt::Debug;
use std::sync::Arc;

pub mod backend;
pub mod least_conn;
pub mod least_response_time;
pub mod pool;
pub mod round_robin;
pub mod weighted_round_robin;

use self::backend::Backend;

/// Common selection contract for all dispatch algorithms.
pub trait LoadBalancer: Send + Sync + Debug {
    /// Select one backend from the pool, or `None` exactly when no healthy
    /// backend exists.
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}

/// Resolve a configured algorithm name to a balancer instance.
///
/// Unknown names fall back to round robin with a logged warning.
pub fn make_balancer(algorithm: &str) -> Box<dyn LoadBalancer> {
    match algorithm {
        "round_robin" => Box::new(round_robin::RoundRobin::new()),
        "weighted_round_robin" => Box::new(weighted_round_robin::WeightedRoundRobin::new()),
        "least_connections" => Box::new(least_conn::LeastConnections::new()),
        "least_response_time" => Box::new(least_response_time::LeastResponseTime::new()),
        other => {
            tracing::warn!(algorithm = %other, "Unknown algorithm, defaulting to round_robin");
            Box::new(round_robin::RoundRobin::new())
        }
    }
}
