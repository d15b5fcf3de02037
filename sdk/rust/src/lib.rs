//! Client SDK for the Reactivities API.

mod client;
mod error;
pub mod models;

pub use client::ActivitiesClient;
pub use error::ClientError;
