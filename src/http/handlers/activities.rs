//! Activity endpoints.

use axum::extract::{Path, State};
use axum::Json;

use crate::application::activities::{self, ActivityDto, CreateActivityDto, EditActivityDto};
use crate::application::AppResult;
use crate::auth::host::ActivityHost;
use crate::auth::CurrentUser;
use crate::http::extract::ValidatedJson;
use crate::http::server::AppState;

pub async fn list(State(state): State<AppState>, _user: CurrentUser) -> AppResult<Json<Vec<ActivityDto>>> {
    Ok(Json(activities::list_activities(&state.db).await?))
}

pub async fn details(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ActivityDto>> {
    Ok(Json(activities::activity_details(&state.db, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreateActivityDto>,
) -> AppResult<Json<String>> {
    let id = activities::create_activity(&state.db, &current.user, dto).await?;
    Ok(Json(id))
}

pub async fn edit(
    State(state): State<AppState>,
    host: ActivityHost,
    ValidatedJson(dto): ValidatedJson<EditActivityDto>,
) -> AppResult<()> {
    activities::edit_activity(&state.db, host.activity_id, dto).await
}

pub async fn delete(State(state): State<AppState>, host: ActivityHost) -> AppResult<()> {
    activities::delete_activity(&state.db, host.activity_id).await
}

pub async fn attend(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<()> {
    activities::update_attendance(&state.db, id, &current.user).await?;
    Ok(())
}
