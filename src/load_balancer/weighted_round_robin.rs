//! Smooth weighted round-robin load balancing strategy.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Smooth weighted round-robin selector.
///
/// Each backend carries a mutable effective weight. Per selection, every
/// healthy backend's effective weight grows by its static weight; the backend
/// with the highest effective weight is chosen and its effective weight drops
/// by the sum of healthy static weights. Over a full cycle of `sum(weights)`
/// selections each backend is chosen exactly `weight` times, without the
/// bursts a naive weighted rotation produces.
///
/// Effective weights are keyed by address and survive health transitions, so
/// a healed backend resumes its position in the rotation rather than
/// restarting it.
#[derive(Debug, Default)]
pub struct WeightedRoundRobin {
    effective: Mutex<HashMap<SocketAddr, i64>>,
}

impl WeightedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for WeightedRoundRobin {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let healthy: Vec<&Arc<Backend>> = backends.iter().filter(|b| b.is_healthy()).collect();
        if healthy.is_empty() {
            return None;
        }
        // A pool of one needs no weight bookkeeping.
        if healthy.len() == 1 {
            return Some(healthy[0].clone());
        }

        let total: i64 = healthy.iter().map(|b| i64::from(b.weight)).sum();
        let mut effective = self.effective.lock().unwrap();

        for b in &healthy {
            let current = effective.entry(b.addr).or_insert_with(|| i64::from(b.weight));
            *current += i64::from(b.weight);
        }

        // Highest effective weight wins; ties go to the earliest backend in
        // pool order.
        let mut chosen = healthy[0];
        let mut best = effective[&chosen.addr];
        for b in &healthy[1..] {
            let current = effective[&b.addr];
            if current > best {
                best = current;
                chosen = b;
            }
        }

        if let Some(current) = effective.get_mut(&chosen.addr) {
            *current -= total;
        }

        Some(chosen.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted_pool(weights: &[u32]) -> Vec<Arc<Backend>> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                Arc::new(Backend::new(
                    format!("127.0.0.1:{}", 9000 + i).parse().unwrap(),
                    *w,
                    10,
                ))
            })
            .collect()
    }

    #[test]
    fn test_weighted_converges_to_configured_ratio() {
        let lb = WeightedRoundRobin::new();
        let pool = weighted_pool(&[3, 2, 1]);

        let mut counts = [0u32; 3];
        for _ in 0..600 {
            let picked = lb.next_server(&pool).unwrap();
            let idx = pool.iter().position(|b| b.addr == picked.addr).unwrap();
            counts[idx] += 1;
        }
        assert_eq!(counts, [300, 200, 100]);
    }

    #[test]
    fn test_weighted_interleaves_rather_than_bursts() {
        let lb = WeightedRoundRobin::new();
        let pool = weighted_pool(&[2, 1]);

        // Smooth WRR never serves the heavy backend more than its weight in
        // a row: a, a, b repeating rather than long runs.
        let picks: Vec<_> = (0..6).map(|_| lb.next_server(&pool).unwrap().addr).collect();
        assert_eq!(
            picks,
            vec![pool[0].addr, pool[0].addr, pool[1].addr, pool[0].addr, pool[0].addr, pool[1].addr]
        );
    }

    #[test]
    fn test_weighted_single_healthy_short_circuits() {
        let lb = WeightedRoundRobin::new();
        let pool = weighted_pool(&[3, 2]);
        pool[0].mark_unhealthy();

        for _ in 0..5 {
            assert_eq!(lb.next_server(&pool).unwrap().addr, pool[1].addr);
        }
        // Weight state untouched by the short-circuit path.
        assert!(lb.effective.lock().unwrap().is_empty());
    }

    #[test]
    fn test_weighted_resumes_after_healing() {
        let lb = WeightedRoundRobin::new();
        let pool = weighted_pool(&[3, 1]);

        for _ in 0..2 {
            lb.next_server(&pool).unwrap();
        }
        pool[0].mark_unhealthy();
        lb.next_server(&pool).unwrap();
        pool[0].mark_healthy();

        // Ratio still holds over a long run after the transition; allow a
        // short transient while the rotation re-balances.
        let mut counts = [0u32; 2];
        for _ in 0..400 {
            let picked = lb.next_server(&pool).unwrap();
            let idx = pool.iter().position(|b| b.addr == picked.addr).unwrap();
            counts[idx] += 1;
        }
        assert_eq!(counts[0] + counts[1], 400);
        assert!((290..=310).contains(&counts[0]), "got {:?}", counts);
    }

    #[test]
    fn test_weighted_none_when_all_unhealthy() {
        let lb = WeightedRoundRobin::new();
        let pool = weighted_pool(&[1, 1]);
        pool[0].mark_unhealthy();
        pool[1].mark_unhealthy();
        assert!(lb.next_server(&pool).is_none());
    }
}
