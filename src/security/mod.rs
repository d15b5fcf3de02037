//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → CORS (configured origins, credentials allowed)
//!     → body limit, timeout, concurrency limit (server.rs)
//!     → rate_limit.rs (per-IP, login and register only)
//!     → handler
//! Outgoing response:
//!     → headers.rs (nosniff, frame denial, referrer policy)
//! ```

pub mod headers;
pub mod rate_limit;
