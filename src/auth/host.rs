//! Activity host requirement.
//!
//! Only the host attendee may edit or delete an activity. The check runs
//! before the operation, so a missing activity is also a 403, never a 404.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::application::{AppError, AppResult};
use crate::auth::CurrentUser;
use crate::domain::User;
use crate::http::server::AppState;
use crate::persistence::{activities, Database};

/// The caller, proven to host the activity named by the `{id}` path segment.
///
/// Extracted ahead of the body, so a non-host never sees validation errors.
#[derive(Debug, Clone)]
pub struct ActivityHost {
    pub activity_id: String,
    pub user: User,
}

impl FromRequestParts<AppState> for ActivityHost {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        let Path(activity_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        ensure_host(&state.db, &activity_id, &current.user).await?;
        Ok(Self {
            activity_id,
            user: current.user,
        })
    }
}

/// `Ok(())` when `user` hosts activity `activity_id`, otherwise `Forbidden`.
pub async fn ensure_host(db: &Database, activity_id: &str, user: &User) -> AppResult<()> {
    let activity_id = activity_id.to_string();
    let user_id = user.id.clone();
    let attendee = db
        .call(move |conn| activities::find_attendee(conn, &activity_id, &user_id))
        .await?;

    match attendee {
        Some(record) if record.is_host => Ok(()),
        _ => {
            tracing::debug!(user_id = %user.id, "Host requirement failed");
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::activities::{create_activity, update_attendance, ActivityFields, CreateActivityDto};
    use crate::persistence::users::{insert_user, sample_user};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_only_host_passes() {
        let db = Database::open_in_memory().unwrap();
        let bob = sample_user("bob", "bob@test.com", "Bob");
        let tom = sample_user("tom", "tom@test.com", "Tom");
        let (b, t) = (bob.clone(), tom.clone());
        db.call(move |conn| {
            insert_user(conn, &b)?;
            insert_user(conn, &t)
        })
        .await
        .unwrap();

        let fields = ActivityFields {
            title: "Drinks".into(),
            date: Some(Utc::now() + Duration::days(1)),
            description: "Pints".into(),
            category: "drinks".into(),
            city: "London".into(),
            venue: "The Lamb".into(),
            latitude: 51.5,
            longitude: -0.1,
        };
        let id = create_activity(&db, &bob, CreateActivityDto { fields }).await.unwrap();
        update_attendance(&db, id.clone(), &tom).await.unwrap();

        assert!(ensure_host(&db, &id, &bob).await.is_ok());
        assert!(matches!(ensure_host(&db, &id, &tom).await, Err(AppError::Forbidden)));
        assert!(matches!(ensure_host(&db, "missing", &bob).await, Err(AppError::Forbidden)));
    }
}
