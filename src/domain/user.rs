use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    /// Login name. Registration sets it to the e-mail address.
    pub user_name: String,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl User {
    /// Public view of this user.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            bio: self.bio.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Public view of a user, as shown in attendee lists and profile pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
}
