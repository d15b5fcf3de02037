//! User account queries.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::User;
use crate::persistence::DbResult;

const USER_COLUMNS: &str =
    "id, user_name, email, display_name, bio, image_url, password_hash";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        user_name: row.get(1)?,
        email: row.get(2)?,
        display_name: row.get(3)?,
        bio: row.get(4)?,
        image_url: row.get(5)?,
        password_hash: row.get(6)?,
    })
}

/// Insert a new user row.
pub fn insert_user(conn: &Connection, user: &User) -> DbResult<()> {
    conn.execute(
        "INSERT INTO users (id, user_name, email, display_name, bio, image_url, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.user_name,
            user.email,
            user.display_name,
            user.bio,
            user.image_url,
            user.password_hash,
            Utc::now(),
        ],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: &str) -> DbResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            map_user,
        )
        .optional()?;
    Ok(user)
}

/// Case-insensitive lookup by e-mail address.
pub fn find_by_email(conn: &Connection, email: &str) -> DbResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            map_user,
        )
        .optional()?;
    Ok(user)
}

pub fn email_taken(conn: &Connection, email: &str) -> DbResult<bool> {
    let taken = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM users WHERE email = ?1 OR user_name = ?1)",
        params![email],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(taken)
}

/// Insert `user` unless its e-mail is already registered, checked and written
/// in one transaction. Returns whether the row was inserted.
pub fn insert_if_email_free(conn: &mut Connection, user: &User) -> DbResult<bool> {
    let tx = conn.transaction()?;
    if email_taken(&tx, &user.email)? {
        return Ok(false);
    }
    insert_user(&tx, user)?;
    tx.commit()?;
    Ok(true)
}

pub fn count_users(conn: &Connection) -> DbResult<u64> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))?;
    Ok(count as u64)
}

#[cfg(test)]
pub(crate) fn sample_user(id: &str, email: &str, display_name: &str) -> User {
    User {
        id: id.to_string(),
        user_name: email.to_string(),
        email: email.to_string(),
        display_name: display_name.to_string(),
        bio: None,
        image_url: None,
        password_hash: "not-a-real-hash".to_string(),
    }
}
