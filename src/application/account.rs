//! Registration, credential checks, and profiles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::error::{AppError, AppResult};
use crate::application::validation::{is_email, Validate, ValidationErrors};
use crate::auth::password::{self, check_policy, IdentityError};
use crate::config::PasswordPolicy;
use crate::domain::{User, UserProfile};
use crate::persistence::{users, Database};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterDto {
    pub display_name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.display_name.trim().is_empty() {
            errors.add("displayName", "The DisplayName field is required.");
        }
        if self.email.trim().is_empty() {
            errors.add("email", "The Email field is required.");
        } else if !is_email(self.email.trim()) {
            errors.add("email", "The Email field is not a valid e-mail address.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

/// Signed-in user as shown to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub display_name: String,
    pub email: String,
    pub id: String,
    pub image_url: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            id: user.id.clone(),
            image_url: user.image_url.clone(),
        }
    }
}

fn identity_failure(errors: Vec<IdentityError>) -> AppError {
    let mut problem = ValidationErrors::new();
    for error in errors {
        problem.add(error.code, error.description);
    }
    AppError::Validation(problem)
}

fn duplicate_email(email: &str) -> IdentityError {
    IdentityError {
        code: "DuplicateEmail",
        description: format!("Email '{}' is already taken.", email),
    }
}

async fn hash_off_thread(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AppError::internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(e.to_string()))
}

/// Create an account. The e-mail address doubles as the user name.
pub async fn register(db: &Database, policy: &PasswordPolicy, dto: RegisterDto) -> AppResult<User> {
    let email = dto.email.trim().to_string();

    let mut failures = check_policy(policy, &dto.password);
    let lookup = email.clone();
    if db.call(move |conn| users::email_taken(conn, &lookup)).await? {
        failures.push(duplicate_email(&email));
    }
    if !failures.is_empty() {
        return Err(identity_failure(failures));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        user_name: email.clone(),
        email,
        display_name: dto.display_name.trim().to_string(),
        bio: None,
        image_url: None,
        password_hash: hash_off_thread(dto.password).await?,
    };

    // Concurrent registrations may pass the check above; the insert re-checks
    // under the connection lock.
    let stored = user.clone();
    if !db.call(move |conn| users::insert_if_email_free(conn, &stored)).await? {
        return Err(identity_failure(vec![duplicate_email(&user.email)]));
    }

    tracing::info!(user_id = %user.id, "User registered");
    Ok(user)
}

/// Resolve credentials to a user. Unknown e-mail and wrong password look the same.
pub async fn authenticate(db: &Database, dto: LoginDto) -> AppResult<User> {
    let email = dto.email.trim().to_string();
    let user = db
        .call(move |conn| users::find_by_email(conn, &email))
        .await?;

    let candidate = dto.password;
    let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
    let verified = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => password::verify_password(&candidate, &hash),
        None => password::verify_unknown_account(&candidate),
    })
    .await
    .map_err(|e| AppError::internal(format!("password verification task failed: {e}")))?;

    match user {
        Some(user) if verified => Ok(user),
        _ => Err(AppError::Unauthorized),
    }
}

pub async fn find_user(db: &Database, id: String) -> AppResult<Option<User>> {
    Ok(db.call(move |conn| users::find_by_id(conn, &id)).await?)
}

pub async fn profile(db: &Database, id: String) -> AppResult<UserProfile> {
    find_user(db, id)
        .await?
        .map(|user| user.profile())
        .ok_or_else(|| AppError::not_found("Profile not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_dto(email: &str, password: &str) -> RegisterDto {
        RegisterDto {
            display_name: "Bob".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_register_shape_rules() {
        let errors = RegisterDto::default().validate().unwrap_err();
        assert_eq!(errors.get("displayName").unwrap(), ["The DisplayName field is required."]);
        assert_eq!(errors.get("email").unwrap(), ["The Email field is required."]);

        let errors = register_dto("not-an-email", "x").validate().unwrap_err();
        assert_eq!(
            errors.get("email").unwrap(),
            ["The Email field is not a valid e-mail address."]
        );
        assert!(errors.get("displayName").is_none());
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let db = Database::open_in_memory().unwrap();
        let policy = PasswordPolicy::default();
        let user = register(&db, &policy, register_dto("bob@test.com", "Pa$$w0rd"))
            .await
            .unwrap();
        assert_eq!(user.user_name, "bob@test.com");

        let found = authenticate(
            &db,
            LoginDto {
                email: "BOB@test.com".into(),
                password: "Pa$$w0rd".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(found.id, user.id);

        let wrong = authenticate(
            &db,
            LoginDto {
                email: "bob@test.com".into(),
                password: "nope".into(),
            },
        )
        .await;
        assert!(matches!(wrong, Err(AppError::Unauthorized)));

        let unknown = authenticate(
            &db,
            LoginDto {
                email: "x@test.com".into(),
                password: "Pa$$w0rd".into(),
            },
        )
        .await;
        assert!(matches!(unknown, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_duplicate_email_and_weak_password_reported_together() {
        let db = Database::open_in_memory().unwrap();
        let policy = PasswordPolicy::default();
        register(&db, &policy, register_dto("bob@test.com", "Pa$$w0rd")).await.unwrap();

        let err = register(&db, &policy, register_dto("Bob@Test.com", "password"))
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(
            errors.get("DuplicateEmail").unwrap(),
            ["Email 'Bob@Test.com' is already taken."]
        );
        assert!(errors.get("PasswordRequiresDigit").is_some());
        assert!(errors.get("PasswordRequiresUpper").is_some());
    }

    #[tokio::test]
    async fn test_profile_lookup() {
        let db = Database::open_in_memory().unwrap();
        let user = register(&db, &PasswordPolicy::default(), register_dto("jane@test.com", "Pa$$w0rd"))
            .await
            .unwrap();

        let found = profile(&db, user.id.clone()).await.unwrap();
        assert_eq!(found.display_name, "Bob");
        assert!(matches!(
            profile(&db, "missing".into()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
