//! Domain entities.
//!
//! Plain data shared by persistence and the application layer. Nothing here
//! talks to the database or knows about HTTP.

pub mod activity;
pub mod user;

pub use activity::{Activity, Attendee};
pub use user::{User, UserProfile};
