//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer (independent of request traffic)
//!     → Probe every registered backend, healthy or not
//!     → mark_healthy / mark_unhealthy on the backend
//!     → Probe round-trip time feeds the response-time window
//!
//! Passive demotion lives in the proxy handler: a transport failure marks
//! the backend unhealthy immediately instead of waiting for the next cycle.
//! ```
//!
//! # Design Decisions
//! - Unhealthy is a steady, recoverable state; the same backend is probed
//!   again next cycle
//! - A reachable backend returning 5xx on the probe path is unhealthy; a
//!   5xx on a proxied request is not (that is an application error)

pub mod active;
