use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by [`crate::ActivitiesClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the body; field name → messages.
    #[error("validation failed: {}", summarize(.errors))]
    Validation { errors: BTreeMap<String, Vec<String>> },

    /// Any other non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A success response whose body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status of a server-side failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Validation { .. } => Some(400),
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::Decode(_) => None,
        }
    }

    pub(crate) fn from_body(status: u16, body: String) -> Self {
        #[derive(Deserialize)]
        struct Problem {
            errors: BTreeMap<String, Vec<String>>,
        }

        if status == 400 {
            if let Ok(problem) = serde_json::from_str::<Problem>(&body) {
                return ClientError::Validation { errors: problem.errors };
            }
        }
        ClientError::Status { status, body }
    }
}

fn summarize(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}
