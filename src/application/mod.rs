//! Application layer: the commands and queries behind each endpoint.
//!
//! # Data Flow
//! ```text
//! handler
//!     → (ValidatedJson already ran Validate)
//!     → activities.rs / account.rs operation
//!     → persistence via Database::call
//!     → DTO mapping
//!     → AppResult<T>
//! ```
//!
//! # Design Decisions
//! - Operations are plain async functions over `&Database`
//! - Failures are `AppError` variants, never status codes
//! - Authorization is checked by the HTTP layer before an operation runs

pub mod account;
pub mod activities;
pub mod error;
pub mod validation;

pub use error::{AppError, AppResult};
pub use validation::{Validate, ValidationErrors};
