//! Least Connections load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, round_robin::RoundRobin, LoadBalancer};

/// Least connections selector.
///
/// Picks the healthy backend with the fewest active connections. Ties are
/// broken by a nested round-robin over exactly the tied subset, so equally
/// loaded backends share traffic fairly instead of the first one absorbing
/// every request.
#[derive(Debug, Default)]
pub struct LeastConnections {
    tie_breaker: RoundRobin,
}

impl LeastConnections {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for LeastConnections {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        // Each counter is read exactly once: concurrent acquires/releases
        // between a second read and this one could otherwise leave the
        // candidate set empty despite healthy backends existing.
        let counted: Vec<(usize, &Arc<Backend>)> = backends
            .iter()
            .filter(|b| b.is_healthy())
            .map(|b| (b.active_connections(), b))
            .collect();

        let min = counted.iter().map(|(count, _)| *count).min()?;
        let candidates: Vec<Arc<Backend>> = counted
            .into_iter()
            .filter(|(count, _)| *count == min)
            .map(|(_, b)| b.clone())
            .collect();

        if candidates.len() == 1 {
            Some(candidates[0].clone())
        } else {
            self.tie_breaker.next_server(&candidates)
        }
    }
}
