//! Request handlers. Each one extracts, calls an application operation, and
//! lets `AppError` pick the response.

pub mod account;
pub mod activities;
pub mod buggy;
pub mod health;
pub mod profiles;
