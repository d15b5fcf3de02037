use chrono::{DateTime, Utc};

use crate::domain::user::UserProfile;

/// A scheduled event and the people attending it.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: String,
    pub is_cancelled: bool,
    pub city: String,
    pub venue: String,
    pub latitude: f64,
    pub longitude: f64,
    pub attendees: Vec<Attendee>,
}

impl Activity {
    /// The attendee who created the activity, if the attendee rows were loaded.
    pub fn host(&self) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.is_host)
    }
}

/// Membership of one user in one activity.
#[derive(Debug, Clone, PartialEq)]
pub struct Attendee {
    pub profile: UserProfile,
    pub is_host: bool,
    pub date_joined: DateTime<Utc>,
}
