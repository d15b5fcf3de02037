//! Activity commands and queries.
//!
//! # Operations
//! - `list_activities` / `activity_details`: read models with host and attendees
//! - `create_activity`: caller becomes host, atomically
//! - `edit_activity` / `delete_activity`: host-only (checked by the caller)
//! - `update_attendance`: join, leave, or (for the host) toggle cancellation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::error::{AppError, AppResult};
use crate::application::validation::{coordinate, max_length, require_text, Validate, ValidationErrors};
use crate::domain::{Activity, User, UserProfile};
use crate::observability::metrics;
use crate::persistence::{activities as repo, Database};

const TITLE_MAX: usize = 100;

/// Fields shared by the create and edit payloads.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityFields {
    pub title: String,
    pub date: Option<DateTime<Utc>>,
    pub description: String,
    pub category: String,
    pub city: String,
    pub venue: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl ActivityFields {
    fn check(&self, errors: &mut ValidationErrors) {
        if require_text(errors, "title", &self.title, "Title") {
            max_length(errors, "title", &self.title, TITLE_MAX, "Title");
        }
        require_text(errors, "description", &self.description, "Description");
        match self.date {
            None => errors.add("date", "Date is required"),
            Some(date) if date <= Utc::now() => errors.add("date", "Date must be in the future"),
            Some(_) => {}
        }
        require_text(errors, "category", &self.category, "Category");
        require_text(errors, "city", &self.city, "City");
        require_text(errors, "venue", &self.venue, "Venue");
        coordinate(errors, "latitude", self.latitude, 90.0, "Latitude");
        coordinate(errors, "longitude", self.longitude, 180.0, "Longitude");
    }

    /// Builds the entity; callers validate first, so a missing date never gets here.
    fn into_activity(self, id: String) -> AppResult<Activity> {
        let date = self
            .date
            .ok_or_else(|| AppError::bad_request("Date is required"))?;
        Ok(Activity {
            id,
            title: self.title.trim().to_string(),
            date,
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            is_cancelled: false,
            city: self.city.trim().to_string(),
            venue: self.venue.trim().to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            attendees: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateActivityDto {
    #[serde(flatten)]
    pub fields: ActivityFields,
}

impl Validate for CreateActivityDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.fields.check(&mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EditActivityDto {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub fields: ActivityFields,
}

impl Validate for EditActivityDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "id", &self.id, "Id");
        self.fields.check(&mut errors);
        errors.into_result()
    }
}

/// Read model returned by the activity endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: String,
    pub is_cancelled: bool,
    pub host_display_name: Option<String>,
    pub host_id: Option<String>,
    pub city: String,
    pub venue: String,
    pub latitude: f64,
    pub longitude: f64,
    pub attendees: Vec<UserProfile>,
}

impl From<Activity> for ActivityDto {
    fn from(activity: Activity) -> Self {
        let host = activity.host().map(|a| a.profile.clone());
        Self {
            id: activity.id,
            title: activity.title,
            date: activity.date,
            description: activity.description,
            category: activity.category,
            is_cancelled: activity.is_cancelled,
            host_display_name: host.as_ref().map(|h| h.display_name.clone()),
            host_id: host.map(|h| h.id),
            city: activity.city,
            venue: activity.venue,
            latitude: activity.latitude,
            longitude: activity.longitude,
            attendees: activity.attendees.into_iter().map(|a| a.profile).collect(),
        }
    }
}

/// What `update_attendance` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceChange {
    Joined,
    Left,
    CancellationToggled { cancelled: bool },
}

pub async fn list_activities(db: &Database) -> AppResult<Vec<ActivityDto>> {
    let activities = db.call(|conn| repo::list_activities(conn)).await?;
    Ok(activities.into_iter().map(ActivityDto::from).collect())
}

pub async fn activity_details(db: &Database, id: String) -> AppResult<ActivityDto> {
    db.call(move |conn| repo::get_activity(conn, &id))
        .await?
        .map(ActivityDto::from)
        .ok_or_else(|| AppError::not_found("Activity not found"))
}

/// Create an activity hosted by `host`. Returns the new id.
pub async fn create_activity(db: &Database, host: &User, dto: CreateActivityDto) -> AppResult<String> {
    let activity = dto.fields.into_activity(Uuid::new_v4().to_string())?;
    let id = activity.id.clone();
    let host_id = host.id.clone();

    db.call(move |conn| repo::insert_activity(conn, &activity, &host_id))
        .await?;

    tracing::info!(activity_id = %id, host_id = %host.id, "Activity created");
    metrics::record_activity_event("created");
    Ok(id)
}

/// Overwrite the editable fields of activity `id`.
pub async fn edit_activity(db: &Database, id: String, dto: EditActivityDto) -> AppResult<()> {
    if dto.id != id {
        return Err(AppError::bad_request("Activity id in body does not match the URL"));
    }
    let activity = dto.fields.into_activity(id.clone())?;

    let updated = db.call(move |conn| repo::update_activity(conn, &activity)).await?;
    if !updated {
        return Err(AppError::not_found("Activity not found"));
    }

    tracing::info!(activity_id = %id, "Activity updated");
    metrics::record_activity_event("updated");
    Ok(())
}

pub async fn delete_activity(db: &Database, id: String) -> AppResult<()> {
    let activity_id = id.clone();
    let deleted = db.call(move |conn| repo::delete_activity(conn, &activity_id)).await?;
    if !deleted {
        return Err(AppError::not_found("Activity not found"));
    }

    tracing::info!(activity_id = %id, "Activity deleted");
    metrics::record_activity_event("deleted");
    Ok(())
}

/// Join, leave, or (for the host) toggle cancellation of activity `id`.
pub async fn update_attendance(db: &Database, id: String, user: &User) -> AppResult<AttendanceChange> {
    let activity_id = id.clone();
    let user_id = user.id.clone();

    let change = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(activity) = repo::get_activity(&tx, &activity_id)? else {
                return Ok(None);
            };

            let change = match repo::find_attendee(&tx, &activity_id, &user_id)? {
                Some(record) if record.is_host => {
                    let cancelled = !activity.is_cancelled;
                    repo::set_cancelled(&tx, &activity_id, cancelled)?;
                    AttendanceChange::CancellationToggled { cancelled }
                }
                Some(_) => {
                    repo::remove_attendee(&tx, &activity_id, &user_id)?;
                    AttendanceChange::Left
                }
                None => {
                    repo::insert_attendee(&tx, &activity_id, &user_id, false, Utc::now())?;
                    AttendanceChange::Joined
                }
            };
            tx.commit()?;
            Ok(Some(change))
        })
        .await?
        .ok_or_else(|| AppError::not_found("Activity not found"))?;

    tracing::info!(activity_id = %id, user_id = %user.id, change = ?change, "Attendance updated");
    metrics::record_activity_event(match change {
        AttendanceChange::Joined => "joined",
        AttendanceChange::Left => "left",
        AttendanceChange::CancellationToggled { .. } => "cancellation_toggled",
    });
    Ok(change)
}
