//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → load balancer picks a backend
//!     → request forwarded with bounded timeout
//!     → response relayed to client (or 502/503)
//! ```

pub mod server;

pub use server::HttpServer;
