//! Authentication and authorization subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/login
//!     → account::authenticate (password.rs verify)
//!     → SessionStore::create → bearer token or Set-Cookie (credentials.rs)
//!
//! Protected request:
//!     → extract.rs reads token (bearer, then cookie)
//!     → SessionStore::get → user lookup → CurrentUser
//!     → host.rs for host-only activity writes
//! ```
//!
//! # Design Decisions
//! - Opaque random tokens; no signed claims to leak or forge
//! - Every endpoint needs a session unless its handler takes `MaybeUser`
//!   or no identity extractor at all

pub mod credentials;
pub mod extract;
pub mod host;
pub mod password;
pub mod session;

pub use extract::{CurrentUser, MaybeUser};
pub use session::SessionStore;
