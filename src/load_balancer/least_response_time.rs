//! Least Response Time load balancing strategy.

use std::sync::Arc;

use rand::Rng;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Least response time selector.
///
/// Scores each healthy backend by the mean of its recent response-time
/// window. A backend with no samples scores infinity so it is never chosen
/// over one with real data, but when every healthy backend is unsampled the
/// selector picks uniformly at random to bootstrap data collection. Finite
/// ties are also broken uniformly at random.
#[derive(Debug, Default)]
pub struct LeastResponseTime;

impl LeastResponseTime {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for LeastResponseTime {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let healthy: Vec<&Arc<Backend>> = backends.iter().filter(|b| b.is_healthy()).collect();
        if healthy.is_empty() {
            return None;
        }

        let averages: Vec<f64> = healthy.iter().map(|b| b.average_response_time()).collect();
        let min = averages.iter().copied().fold(f64::INFINITY, f64::min);

        let mut rng = rand::thread_rng();
        if min.is_infinite() {
            // No data anywhere yet.
            let index = rng.gen_range(0..healthy.len());
            return Some(healthy[index].clone());
        }

        let candidates: Vec<&Arc<Backend>> = healthy
            .iter()
            .zip(&averages)
            .filter(|(_, avg)| **avg == min)
            .map(|(b, _)| *b)
            .collect();

        let index = rng.gen_range(0..candidates.len());
        Some(candidates[index].clone())
    }
}
