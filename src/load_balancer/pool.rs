//! Backend pool management.
//!
//! # Responsibilities
//! - Hold the full ordered set of backends built from configuration
//! - Derive the currently-healthy subset for the algorithms and diagnostics
//! - Hand the health monitor the complete list for probing

use std::sync::Arc;

use crate::config::BackendConfig;
use crate::load_balancer::backend::Backend;

/// The full ordered backend set. Order matters: round robin and the weighted
/// tie-break are deterministic by pool position.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
}

impl BackendPool {
    /// Build the pool from configuration. Addresses were validated at
    /// startup; anything that still fails to parse is skipped with a
    /// warning rather than taking the proxy down.
    pub fn new(configs: &[BackendConfig], window_size: usize) -> Self {
        let backends = configs
            .iter()
            .filter_map(|config| match config.address.parse() {
                Ok(addr) => Some(Arc::new(Backend::new(addr, config.weight, window_size))),
                Err(_) => {
                    tracing::warn!(address = %config.address, "Invalid backend address, skipping");
                    None
                }
            })
            .collect();

        Self { backends }
    }

    /// The full ordered backend list.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Number of currently healthy backends.
    pub fn healthy_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_healthy()).count()
    }
}
