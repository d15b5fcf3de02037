//! Account endpoints: register, login, user info, logout.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::account::{self, LoginDto, RegisterDto, UserInfo};
use crate::application::{AppError, AppResult};
use crate::auth::credentials::{clear_cookie, session_cookie};
use crate::auth::{CurrentUser, MaybeUser};
use crate::http::extract::{AppJson, ValidatedJson};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Query flags on `POST /api/login`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginQuery {
    pub use_cookies: bool,
    pub use_session_cookies: bool,
}

/// Token issued to bearer clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub token_type: &'static str,
    pub access_token: String,
    pub expires_in: i64,
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterDto>,
) -> AppResult<StatusCode> {
    account::register(&state.db, &state.config.auth.password, dto).await?;
    Ok(StatusCode::OK)
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    AppJson(dto): AppJson<LoginDto>,
) -> AppResult<Response> {
    let user = match account::authenticate(&state.db, dto).await {
        Ok(user) => user,
        Err(AppError::Unauthorized) => {
            metrics::record_login("failure");
            tracing::info!("Login rejected");
            return Err(AppError::Unauthorized);
        }
        Err(e) => return Err(e),
    };

    let token = state.sessions.create(&user.id);
    metrics::record_login("success");
    tracing::info!(user_id = %user.id, cookie = query.use_cookies || query.use_session_cookies, "User signed in");

    if query.use_cookies || query.use_session_cookies {
        let cookie = session_cookie(&state.config.auth, &token, !query.use_session_cookies)
            .ok_or_else(|| AppError::internal("session cookie is not a valid header value"))?;
        return Ok(([(SET_COOKIE, cookie)], StatusCode::OK).into_response());
    }

    Ok(Json(AccessTokenResponse {
        token_type: "Bearer",
        access_token: token,
        expires_in: state.sessions.ttl_secs(),
    })
    .into_response())
}

pub async fn user_info(identity: MaybeUser) -> Response {
    match identity {
        MaybeUser::Anonymous => StatusCode::NO_CONTENT.into_response(),
        MaybeUser::UnknownUser => StatusCode::UNAUTHORIZED.into_response(),
        MaybeUser::Authenticated(current) => Json(UserInfo::from(&current.user)).into_response(),
    }
}

pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> Response {
    state.sessions.revoke(&current.token);
    tracing::info!(user_id = %current.user.id, "User signed out");

    match clear_cookie(&state.config.auth) {
        Some(cookie) => ([(SET_COOKIE, cookie)], StatusCode::NO_CONTENT).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
