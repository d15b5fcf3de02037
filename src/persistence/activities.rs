//! Activity and attendee queries.
//!
//! # Invariants
//! - An activity is inserted together with its host attendee, atomically.
//! - Attendee lists come back host first, then by join time.
//! - Deleting an activity cascades to its attendee rows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{Activity, Attendee, UserProfile};
use crate::persistence::DbResult;

const ACTIVITY_COLUMNS: &str =
    "id, title, date, description, category, is_cancelled, city, venue, latitude, longitude";

const ATTENDEE_SELECT: &str = "SELECT aa.activity_id, u.id, u.display_name, u.bio, u.image_url,
            aa.is_host, aa.date_joined
     FROM activity_attendees aa
     JOIN users u ON u.id = aa.user_id";

const ATTENDEE_ORDER: &str = "ORDER BY aa.is_host DESC, aa.date_joined ASC, u.display_name ASC";

/// Membership row without the user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendeeRecord {
    pub is_host: bool,
}

fn map_activity(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        title: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        is_cancelled: row.get(5)?,
        city: row.get(6)?,
        venue: row.get(7)?,
        latitude: row.get(8)?,
        longitude: row.get(9)?,
        attendees: Vec::new(),
    })
}

fn map_attendee(row: &Row<'_>) -> rusqlite::Result<(String, Attendee)> {
    let activity_id: String = row.get(0)?;
    let attendee = Attendee {
        profile: UserProfile {
            id: row.get(1)?,
            display_name: row.get(2)?,
            bio: row.get(3)?,
            image_url: row.get(4)?,
        },
        is_host: row.get(5)?,
        date_joined: row.get(6)?,
    };
    Ok((activity_id, attendee))
}

/// All activities with attendees, ordered by date.
pub fn list_activities(conn: &Connection) -> DbResult<Vec<Activity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities ORDER BY date ASC, title ASC"
    ))?;
    let mut activities = stmt
        .query_map([], map_activity)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&format!("{ATTENDEE_SELECT} {ATTENDEE_ORDER}"))?;
    let mut by_activity: HashMap<String, Vec<Attendee>> = HashMap::new();
    for row in stmt.query_map([], map_attendee)? {
        let (activity_id, attendee) = row?;
        by_activity.entry(activity_id).or_default().push(attendee);
    }

    for activity in &mut activities {
        if let Some(attendees) = by_activity.remove(&activity.id) {
            activity.attendees = attendees;
        }
    }
    Ok(activities)
}

/// One activity with attendees.
pub fn get_activity(conn: &Connection, id: &str) -> DbResult<Option<Activity>> {
    let activity = conn
        .query_row(
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1"),
            params![id],
            map_activity,
        )
        .optional()?;

    let Some(mut activity) = activity else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(&format!(
        "{ATTENDEE_SELECT} WHERE aa.activity_id = ?1 {ATTENDEE_ORDER}"
    ))?;
    activity.attendees = stmt
        .query_map(params![id], map_attendee)?
        .map(|row| row.map(|(_, attendee)| attendee))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(activity))
}

#[cfg(test)]
fn activity_exists(conn: &Connection, id: &str) -> DbResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM activities WHERE id = ?1)",
        params![id],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(exists)
}

/// Insert an activity and make `host_id` its host, in one transaction.
pub fn insert_activity(conn: &mut Connection, activity: &Activity, host_id: &str) -> DbResult<()> {
    let tx = conn.transaction()?;
    write_activity(&tx, activity, host_id)?;
    tx.commit()?;
    Ok(())
}

/// Activity row plus host attendee. The caller owns the transaction.
pub(crate) fn write_activity(conn: &Connection, activity: &Activity, host_id: &str) -> DbResult<()> {
    conn.execute(
        &format!("INSERT INTO activities ({ACTIVITY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
        params![
            activity.id,
            activity.title,
            activity.date,
            activity.description,
            activity.category,
            activity.is_cancelled,
            activity.city,
            activity.venue,
            activity.latitude,
            activity.longitude,
        ],
    )?;
    insert_attendee(conn, &activity.id, host_id, true, Utc::now())?;
    Ok(())
}

/// Overwrite the editable fields. Returns false when the activity does not exist.
pub fn update_activity(conn: &Connection, activity: &Activity) -> DbResult<bool> {
    let changed = conn.execute(
        "UPDATE activities
         SET title = ?2, date = ?3, description = ?4, category = ?5,
             city = ?6, venue = ?7, latitude = ?8, longitude = ?9
         WHERE id = ?1",
        params![
            activity.id,
            activity.title,
            activity.date,
            activity.description,
            activity.category,
            activity.city,
            activity.venue,
            activity.latitude,
            activity.longitude,
        ],
    )?;
    Ok(changed > 0)
}

/// Returns false when the activity does not exist.
pub fn delete_activity(conn: &Connection, id: &str) -> DbResult<bool> {
    let changed = conn.execute("DELETE FROM activities WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn set_cancelled(conn: &Connection, id: &str, cancelled: bool) -> DbResult<bool> {
    let changed = conn.execute(
        "UPDATE activities SET is_cancelled = ?2 WHERE id = ?1",
        params![id, cancelled],
    )?;
    Ok(changed > 0)
}

pub fn find_attendee(
    conn: &Connection,
    activity_id: &str,
    user_id: &str,
) -> DbResult<Option<AttendeeRecord>> {
    let record = conn
        .query_row(
            "SELECT is_host FROM activity_attendees WHERE activity_id = ?1 AND user_id = ?2",
            params![activity_id, user_id],
            |row| Ok(AttendeeRecord { is_host: row.get(0)? }),
        )
        .optional()?;
    Ok(record)
}

pub fn insert_attendee(
    conn: &Connection,
    activity_id: &str,
    user_id: &str,
    is_host: bool,
    date_joined: DateTime<Utc>,
) -> DbResult<()> {
    conn.execute(
        "INSERT INTO activity_attendees (activity_id, user_id, is_host, date_joined)
         VALUES (?1, ?2, ?3, ?4)",
        params![activity_id, user_id, is_host, date_joined],
    )?;
    Ok(())
}

pub fn remove_attendee(conn: &Connection, activity_id: &str, user_id: &str) -> DbResult<bool> {
    let changed = conn.execute(
        "DELETE FROM activity_attendees WHERE activity_id = ?1 AND user_id = ?2",
        params![activity_id, user_id],
    )?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::test_connection;
    use crate::persistence::users::{insert_user, sample_user};
    use chrono::Duration;

    fn sample_activity(id: &str, title: &str, days_ahead: i64) -> Activity {
        Activity {
            id: id.to_string(),
            title: title.to_string(),
            date: Utc::now() + Duration::days(days_ahead),
            description: "Something to do".to_string(),
            category: "drinks".to_string(),
            is_cancelled: false,
            city: "London".to_string(),
            venue: "The Lamb".to_string(),
            latitude: 51.5218,
            longitude: -0.1182,
            attendees: Vec::new(),
        }
    }

    fn seeded() -> Connection {
        let conn = test_connection();
        insert_user(&conn, &sample_user("bob", "bob@test.com", "Bob")).unwrap();
        insert_user(&conn, &sample_user("tom", "tom@test.com", "Tom")).unwrap();
        conn
    }

    #[test]
    fn test_insert_makes_host() {
        let mut conn = seeded();
        insert_activity(&mut conn, &sample_activity("a1", "Drinks", 3), "bob").unwrap();

        let activity = get_activity(&conn, "a1").unwrap().unwrap();
        assert_eq!(activity.attendees.len(), 1);
        let host = activity.host().unwrap();
        assert_eq!(host.profile.id, "bob");
        assert_eq!(host.profile.display_name, "Bob");
        assert_eq!(find_attendee(&conn, "a1", "bob").unwrap(), Some(AttendeeRecord { is_host: true }));
    }

    #[test]
    fn test_insert_rolls_back_without_host() {
        let mut conn = seeded();
        let result = insert_activity(&mut conn, &sample_activity("a1", "Drinks", 3), "ghost");
        assert!(result.is_err());
        assert!(!activity_exists(&conn, "a1").unwrap());
    }

    #[test]
    fn test_list_orders_by_date_and_groups_attendees() {
        let mut conn = seeded();
        insert_activity(&mut conn, &sample_activity("later", "Later", 10), "bob").unwrap();
        insert_activity(&mut conn, &sample_activity("sooner", "Sooner", 1), "tom").unwrap();
        insert_attendee(&conn, "later", "tom", false, Utc::now()).unwrap();

        let activities = list_activities(&conn).unwrap();
        let ids: Vec<_> = activities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["sooner", "later"]);

        let later = &activities[1];
        let attendee_ids: Vec<_> = later.attendees.iter().map(|a| a.profile.id.as_str()).collect();
        assert_eq!(attendee_ids, vec!["bob", "tom"]);
        assert!(later.attendees[0].is_host);
        assert!(!later.attendees[1].is_host);
        assert_eq!(activities[0].attendees.len(), 1);
    }

    #[test]
    fn test_update_and_delete() {
        let mut conn = seeded();
        let mut activity = sample_activity("a1", "Drinks", 3);
        insert_activity(&mut conn, &activity, "bob").unwrap();

        activity.title = "Coffee".to_string();
        activity.is_cancelled = true;
        assert!(update_activity(&conn, &activity).unwrap());

        let stored = get_activity(&conn, "a1").unwrap().unwrap();
        assert_eq!(stored.title, "Coffee");
        assert!(!stored.is_cancelled, "update leaves the cancelled flag alone");

        assert!(set_cancelled(&conn, "a1", true).unwrap());
        assert!(get_activity(&conn, "a1").unwrap().unwrap().is_cancelled);

        assert!(delete_activity(&conn, "a1").unwrap());
        assert!(!delete_activity(&conn, "a1").unwrap());
        assert_eq!(find_attendee(&conn, "a1", "bob").unwrap(), None);
    }

    #[test]
    fn test_remove_attendee() {
        let mut conn = seeded();
        insert_activity(&mut conn, &sample_activity("a1", "Drinks", 3), "bob").unwrap();
        insert_attendee(&conn, "a1", "tom", false, Utc::now()).unwrap();

        assert!(remove_attendee(&conn, "a1", "tom").unwrap());
        assert!(!remove_attendee(&conn, "a1", "tom").unwrap());
        assert_eq!(get_activity(&conn, "a1").unwrap().unwrap().attendees.len(), 1);
    }

    #[test]
    fn test_missing_activity() {
        let conn = seeded();
        assert_eq!(get_activity(&conn, "nope").unwrap(), None);
        assert!(!update_activity(&conn, &sample_activity("nope", "x", 1)).unwrap());
    }
}
