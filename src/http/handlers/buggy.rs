//! Diagnostic endpoints that fail on purpose, for exercising client error
//! handling. Mounted only in Development.

use crate::application::{AppError, AppResult, ValidationErrors};

pub async fn not_found() -> AppResult<()> {
    Err(AppError::not_found("Not found"))
}

pub async fn bad_request() -> AppResult<()> {
    Err(AppError::bad_request("This is a bad request"))
}

pub async fn server_error() -> AppResult<()> {
    Err(AppError::internal("This is a server error"))
}

pub async fn unauthorised() -> AppResult<()> {
    Err(AppError::Unauthorized)
}

pub async fn validation_error() -> AppResult<()> {
    let mut errors = ValidationErrors::new();
    errors.add("problem1", "This is the first error");
    errors.add("problem2", "This is the second error");
    Err(errors.into())
}
