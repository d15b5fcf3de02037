//! Sample data for a fresh database.
//!
//! Runs only when the `users` table is empty, so restarting against a
//! populated database never duplicates rows.

use chrono::{Duration, Utc};
use rusqlite::Connection;

use crate::domain::{Activity, User};
use crate::persistence::activities::{insert_attendee, write_activity};
use crate::persistence::users::{count_users, insert_user};
use crate::persistence::{DbError, DbResult};

/// Password shared by every seeded account.
pub const SEED_PASSWORD: &str = "Pa$$w0rd";

struct SeedUser {
    id: &'static str,
    display_name: &'static str,
    email: &'static str,
}

const USERS: &[SeedUser] = &[
    SeedUser { id: "bob-id", display_name: "Bob", email: "bob@test.com" },
    SeedUser { id: "tom-id", display_name: "Tom", email: "tom@test.com" },
    SeedUser { id: "jane-id", display_name: "Jane", email: "jane@test.com" },
];

struct SeedActivity {
    title: &'static str,
    months: i64,
    description: &'static str,
    category: &'static str,
    city: &'static str,
    venue: &'static str,
    latitude: f64,
    longitude: f64,
    host: usize,
    guests: &'static [usize],
}

const ACTIVITIES: &[SeedActivity] = &[
    SeedActivity {
        title: "Past Activity 1",
        months: -2,
        description: "Activity 2 months ago",
        category: "drinks",
        city: "London",
        venue: "The Lamb, 94 Lamb's Conduit St, London",
        latitude: 51.521_808,
        longitude: -0.118_278,
        host: 0,
        guests: &[1],
    },
    SeedActivity {
        title: "Past Activity 2",
        months: -1,
        description: "Activity 1 month ago",
        category: "culture",
        city: "Paris",
        venue: "Louvre Museum, Rue de Rivoli, Paris",
        latitude: 48.861_147,
        longitude: 2.338_028,
        host: 1,
        guests: &[0],
    },
    SeedActivity {
        title: "Future Activity 1",
        months: 1,
        description: "Activity 1 month in future",
        category: "culture",
        city: "London",
        venue: "Natural History Museum",
        latitude: 51.496_511,
        longitude: -0.176_002,
        host: 2,
        guests: &[1],
    },
    SeedActivity {
        title: "Future Activity 2",
        months: 2,
        description: "Activity 2 months in future",
        category: "music",
        city: "London",
        venue: "The O2",
        latitude: 51.502_936,
        longitude: 0.003_203,
        host: 0,
        guests: &[2],
    },
    SeedActivity {
        title: "Future Activity 3",
        months: 3,
        description: "Activity 3 months in future",
        category: "drinks",
        city: "London",
        venue: "The Mayflower",
        latitude: 51.501_999,
        longitude: -0.053_538,
        host: 1,
        guests: &[0, 2],
    },
    SeedActivity {
        title: "Future Activity 4",
        months: 4,
        description: "Activity 4 months in future",
        category: "drinks",
        city: "London",
        venue: "The Blackfriar",
        latitude: 51.512_252,
        longitude: -0.103_786,
        host: 2,
        guests: &[],
    },
    SeedActivity {
        title: "Future Activity 5",
        months: 5,
        description: "Activity 5 months in future",
        category: "culture",
        city: "London",
        venue: "Sherlock Holmes Museum, 221b Baker St",
        latitude: 51.523_767,
        longitude: -0.158_555,
        host: 0,
        guests: &[1],
    },
    SeedActivity {
        title: "Future Activity 6",
        months: 6,
        description: "Activity 6 months in future",
        category: "music",
        city: "London",
        venue: "Roundhouse, Chalk Farm Rd",
        latitude: 51.543_133,
        longitude: -0.152_134,
        host: 1,
        guests: &[2],
    },
    SeedActivity {
        title: "Future Activity 7",
        months: 7,
        description: "Activity 7 months in future",
        category: "travel",
        city: "London",
        venue: "River Thames, England",
        latitude: 51.507_351,
        longitude: -0.127_758,
        host: 2,
        guests: &[0],
    },
    SeedActivity {
        title: "Future Activity 8",
        months: 8,
        description: "Activity 8 months in future",
        category: "film",
        city: "London",
        venue: "River Thames, England",
        latitude: 51.507_351,
        longitude: -0.127_758,
        host: 0,
        guests: &[1, 2],
    },
];

/// Insert the sample users and activities if the database has no users.
///
/// `hash` turns [`SEED_PASSWORD`] into a stored hash; it is called once per user.
/// Everything is written in one transaction. Returns whether anything was inserted.
pub fn seed_data<H>(conn: &mut Connection, hash: H) -> DbResult<bool>
where
    H: Fn(&str) -> Result<String, String>,
{
    let tx = conn.transaction()?;
    if count_users(&tx)? > 0 {
        return Ok(false);
    }

    let mut user_ids = Vec::with_capacity(USERS.len());
    for seed in USERS {
        let password_hash = hash(SEED_PASSWORD).map_err(DbError::InvalidData)?;
        insert_user(
            &tx,
            &User {
                id: seed.id.to_string(),
                user_name: seed.email.to_string(),
                email: seed.email.to_string(),
                display_name: seed.display_name.to_string(),
                bio: None,
                image_url: None,
                password_hash,
            },
        )?;
        user_ids.push(seed.id);
    }

    let now = Utc::now();
    for seed in ACTIVITIES {
        let activity = Activity {
            id: uuid::Uuid::new_v4().to_string(),
            title: seed.title.to_string(),
            date: now + Duration::days(30 * seed.months),
            description: seed.description.to_string(),
            category: seed.category.to_string(),
            is_cancelled: false,
            city: seed.city.to_string(),
            venue: seed.venue.to_string(),
            latitude: seed.latitude,
            longitude: seed.longitude,
            attendees: Vec::new(),
        };
        write_activity(&tx, &activity, user_ids[seed.host])?;
        for &guest in seed.guests {
            insert_attendee(&tx, &activity.id, user_ids[guest], false, now)?;
        }
    }
    tx.commit()?;

    tracing::info!(
        users = USERS.len(),
        activities = ACTIVITIES.len(),
        "Seeded sample data"
    );
    Ok(true)
}
