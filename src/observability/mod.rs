//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler / health monitor produce:
//!     → stats.rs (process-lifetime aggregate counters, served at /lb/stats)
//!     → metrics.rs (Prometheus counters, gauges, histograms)
//! ```
//!
//! # Design Decisions
//! - Aggregate counters are atomics; derived rates (error rate, average
//!   latency, throughput) are computed on demand so a stored rate can never
//!   drift from its inputs
//! - Prometheus exposition is optional and lives on its own listener

pub mod metrics;
pub mod stats;
