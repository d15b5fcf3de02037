//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → extract.rs / auth extractors (body, identity, host check)
//!     → handlers/ (call application operations)
//!     → AppError → response; response.rs renders server faults
//!     → Send to client
//! ```

pub mod extract;
pub mod handlers;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
