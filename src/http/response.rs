//! Rendering of server faults.
//!
//! Handlers never build 500 bodies themselves. An `AppError::Database` or
//! `AppError::Internal` (or a caught panic) leaves a [`ServerFault`] on the
//! response, and [`render_faults`] turns it into the client-facing JSON:
//!
//! ```text
//! {"statusCode":500,"message":"...","details":"..."}   Development
//! {"statusCode":500,"message":"...","details":null}    Production
//! ```

use std::any::Any;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::error::ServerFault;
use crate::config::Environment;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FaultBody {
    status_code: u16,
    message: String,
    details: Option<String>,
}

/// Middleware that renders and logs any [`ServerFault`] left on a response.
pub async fn render_faults(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let Some(fault) = response.extensions_mut().remove::<ServerFault>() else {
        return response;
    };

    tracing::error!(
        method = %method,
        path = %path,
        error = %fault.message,
        details = %fault.details,
        "Unhandled server fault"
    );
    fault_response(environment, fault)
}

fn fault_response(environment: Environment, fault: ServerFault) -> Response {
    let body = FaultBody {
        status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        message: fault.message,
        details: environment.is_development().then_some(fault.details),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Panic handler for `CatchPanicLayer`. The fault is rendered by [`render_faults`].
pub fn panic_fault(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(text) = panic.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "handler panicked".to_string()
    };

    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(ServerFault {
        details: format!("panic: {}", message),
        message,
    });
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault() -> ServerFault {
        ServerFault {
            message: "boom".into(),
            details: "Internal(\"boom\")".into(),
        }
    }

    #[tokio::test]
    async fn test_details_only_in_development() {
        let response = fault_response(Environment::Development, fault());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["message"], "boom");
        assert_eq!(json["details"], "Internal(\"boom\")");

        let response = fault_response(Environment::Production, fault());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["details"].is_null());
    }

    #[test]
    fn test_panic_payload_becomes_fault() {
        let response = panic_fault(Box::new("kaboom"));
        let fault = response.extensions().get::<ServerFault>().unwrap();
        assert_eq!(fault.message, "kaboom");
    }
}
