//! Request extractors for the signed-in user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::application::{account, AppError};
use crate::auth::credentials::session_token;
use crate::domain::User;
use crate::http::server::AppState;

/// The authenticated caller. Rejects with 401 when there is no live session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

/// Caller identity on endpoints that allow anonymous access.
#[derive(Debug, Clone)]
pub enum MaybeUser {
    Anonymous,
    Authenticated(CurrentUser),
    /// The session is live but its account no longer exists.
    UnknownUser,
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<MaybeUser, AppError> {
    let Some(token) = session_token(&parts.headers, &state.config.auth.cookie_name) else {
        return Ok(MaybeUser::Anonymous);
    };
    let Some(session) = state.sessions.get(&token) else {
        return Ok(MaybeUser::Anonymous);
    };

    match account::find_user(&state.db, session.user_id.clone()).await? {
        Some(user) => Ok(MaybeUser::Authenticated(CurrentUser { user, token })),
        None => {
            tracing::warn!(user_id = %session.user_id, "Session refers to a missing user");
            state.sessions.revoke(&token);
            Ok(MaybeUser::UnknownUser)
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await? {
            MaybeUser::Authenticated(current) => Ok(current),
            MaybeUser::Anonymous | MaybeUser::UnknownUser => Err(AppError::Unauthorized),
        }
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await
    }
}
