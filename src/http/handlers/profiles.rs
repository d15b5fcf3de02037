use axum::extract::{Path, State};
use axum::Json;

use crate::application::{account, AppResult};
use crate::auth::CurrentUser;
use crate::domain::UserProfile;
use crate::http::server::AppState;

pub async fn profile(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(account::profile(&state.db, id).await?))
}
