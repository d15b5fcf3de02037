//! Application errors and their HTTP mapping.
//!
//! Every operation returns [`AppResult`]. Handlers propagate with `?` and
//! axum turns the error into a response:
//!
//! ```text
//! NotFound      → 404, empty body
//! BadRequest    → 400, plain-text message
//! Unauthorized  → 401, empty body
//! Forbidden     → 403, empty body
//! Validation    → 400, validation problem JSON
//! Database /
//! Internal      → 500, ServerFault extension rendered by the fault middleware
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::application::validation::ValidationErrors;
use crate::persistence::DbError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("one or more validation errors has occurred")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Body of a 400 validation failure.
#[derive(Debug, Serialize)]
pub struct ValidationProblem<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub status: u16,
    pub detail: &'static str,
    pub errors: &'a ValidationErrors,
}

impl<'a> ValidationProblem<'a> {
    pub fn new(errors: &'a ValidationErrors) -> Self {
        Self {
            kind: "ValidationFailure",
            title: "Validation Error",
            status: StatusCode::BAD_REQUEST.as_u16(),
            detail: "One or more validation errors has occurred.",
            errors,
        }
    }
}

/// An unexpected failure waiting to be rendered.
///
/// Attached to 500 responses as an extension. The fault middleware decides
/// whether `details` reaches the client.
#[derive(Debug, Clone)]
pub struct ServerFault {
    pub message: String,
    pub details: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::NotFound(message) => {
                tracing::debug!(%message, "Not found");
                status.into_response()
            }
            AppError::Unauthorized | AppError::Forbidden => status.into_response(),
            AppError::BadRequest(message) => (status, message).into_response(),
            AppError::Validation(errors) => {
                (status, Json(ValidationProblem::new(&errors))).into_response()
            }
            fault @ (AppError::Database(_) | AppError::Internal(_)) => {
                let mut response = status.into_response();
                response.extensions_mut().insert(ServerFault {
                    message: fault.to_string(),
                    details: format!("{:?}", fault),
                });
                response
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Validation(ValidationErrors::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(DbError::Poisoned).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_faults_carry_extension() {
        let response = AppError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let fault = response.extensions().get::<ServerFault>().unwrap();
        assert_eq!(fault.message, "boom");
        assert!(fault.details.contains("Internal"));
    }

    #[test]
    fn test_client_errors_have_no_fault() {
        let response = AppError::bad_request("nope").into_response();
        assert!(response.extensions().get::<ServerFault>().is_none());
    }

    #[test]
    fn test_validation_problem_shape() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "Title is required");
        let json = serde_json::to_value(ValidationProblem::new(&errors)).unwrap();
        assert_eq!(json["type"], "ValidationFailure");
        assert_eq!(json["status"], 400);
        assert_eq!(json["errors"]["title"][0], "Title is required");
    }
}
