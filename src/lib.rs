//! Reactivities: a social activities API.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server (middleware stack)
//!                 │
//!                 ├─ security (CORS, rate limit, headers)
//!                 ├─ auth (sessions, extractors, host check)
//!                 ▼
//!              http::handlers ──▶ application (validation, operations)
//!                                      │
//!                                      ▼
//!                                 persistence (SQLite, migrations, seed)
//!
//!   Cross-cutting: config, observability, lifecycle, net (TLS)
//! ```

// Core
pub mod application;
pub mod domain;
pub mod persistence;

// Edge
pub mod auth;
pub mod http;
pub mod net;
pub mod security;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
