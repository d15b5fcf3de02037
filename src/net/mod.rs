//! Network layer subsystem.
//!
//! Plain TCP listeners are bound in `main` and handed to the HTTP server.
//! When `listener.tls` is configured the same listener is wrapped with
//! rustls through `axum-server`; tls.rs loads the certificate pair.

pub mod tls;
