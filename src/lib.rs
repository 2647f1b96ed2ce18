//! Adaptive reverse-proxy load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │               LOAD BALANCER                   │
//!                     │                                               │
//!  Client Request     │  ┌────────┐   ┌───────────────┐   ┌────────┐ │
//!  ───────────────────┼─▶│  http  │──▶│ load_balancer │──▶│ http   │─┼──▶ Backend
//!                     │  │ server │   │ algorithm+pool│   │ client │ │    Server
//!  Client Response    │  └────────┘   └───────┬───────┘   └────────┘ │
//!  ◀──────────────────┼────────────────────────┼────────────────────┘
//!                     │                        │
//!                     │  ┌─────────────────────▼──────────────────┐
//!                     │  │          Cross-Cutting Concerns         │
//!                     │  │  config · health checks · observability │
//!                     │  │           · lifecycle                   │
//!                     │  └─────────────────────────────────────────┘
//!                     └──────────────────────────────────────────────┘
//! ```
//!
//! Dispatch algorithms: round robin, smooth weighted round robin, least
//! connections (round-robin tie-break), least response time. The health
//! monitor probes every backend on a fixed interval; the proxy handler
//! demotes a backend immediately on transport failure.

// Core subsystems
pub mod config;
pub mod http;
pub mod load_balancer;

// Traffic management
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
