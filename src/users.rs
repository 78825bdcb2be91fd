// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::{StoreError, StoreResult};
use crate::models::{AccountStatus, NewUser, Role, User};
use crate::schema::users;

pub fn create_user(conn: &mut SqliteConnection, new_user: NewUser) -> StoreResult<User> {
    let user = diesel::insert_into(users::table)
        .values(&new_user)
        .get_result::<User>(conn)?;
    Ok(user)
}

/// Point lookup. A missing user is an absent result, not an error.
pub fn get_user(conn: &mut SqliteConnection, user_id: i32) -> StoreResult<Option<User>> {
    let user = users::table
        .find(user_id)
        .first::<User>(conn)
        .optional()?;
    Ok(user)
}

pub fn set_status(
    conn: &mut SqliteConnection,
    user_id: i32,
    status: AccountStatus,
) -> StoreResult<()> {
    diesel::update(users::table.find(user_id))
        .set(users::status.eq(status))
        .execute(conn)?;
    Ok(())
}

/// Configures subscription pricing for an artist. Monetization config is an
/// ARTIST-only invariant, enforced here rather than in the schema.
pub fn set_monetization(
    conn: &mut SqliteConnection,
    artist_id: i32,
    price: f64,
    duration_days: i32,
    benefits: Option<String>,
) -> StoreResult<()> {
    let artist = get_user(conn, artist_id)?
        .ok_or_else(|| StoreError::not_found("user", artist_id))?;
    if artist.role != Role::Artist {
        return Err(StoreError::validation(
            "only artist accounts can configure subscriptions",
        ));
    }
    if price <= 0.0 {
        return Err(StoreError::validation("subscription price must be positive"));
    }
    if duration_days < 1 {
        return Err(StoreError::validation(
            "subscription duration must be at least one day",
        ));
    }

    diesel::update(users::table.find(artist_id))
        .set((
            users::subscription_price.eq(Some(price)),
            users::subscription_duration_days.eq(Some(duration_days)),
            users::benefits.eq(benefits),
        ))
        .execute(conn)?;
    Ok(())
}

/// Writes the suspension flag. `ends_at = None` with the flag set means
/// permanent; expiry is evaluated lazily at read time via
/// [`User::suspended_at`], never cleared by a background job.
pub fn set_suspension(
    conn: &mut SqliteConnection,
    user_id: i32,
    suspended: bool,
    ends_at: Option<i64>,
) -> StoreResult<()> {
    diesel::update(users::table.find(user_id))
        .set((
            users::is_suspended.eq(suspended),
            users::suspension_ends_at.eq(ends_at),
        ))
        .execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now_millis;
    use crate::test_util;

    #[test]
    fn monetization_is_artist_only() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let artist = test_util::user(&mut conn, "artist", Role::Artist);

        let err = set_monetization(&mut conn, fan.id, 9.99, 30, None).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        set_monetization(&mut conn, artist.id, 9.99, 30, Some("perks".into())).unwrap();
        let reloaded = get_user(&mut conn, artist.id).unwrap().unwrap();
        assert_eq!(reloaded.subscription_price, Some(9.99));
        assert_eq!(reloaded.subscription_duration_days, Some(30));
    }

    #[test]
    fn expired_suspension_reads_as_lifted() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let user = test_util::user(&mut conn, "suspended", Role::Fan);
        let now = now_millis();

        set_suspension(&mut conn, user.id, true, Some(now - 1)).unwrap();
        let expired = get_user(&mut conn, user.id).unwrap().unwrap();
        assert!(!expired.suspended_at(now));
        // The row itself is untouched.
        assert!(expired.is_suspended);

        set_suspension(&mut conn, user.id, true, None).unwrap();
        let permanent = get_user(&mut conn, user.id).unwrap().unwrap();
        assert!(permanent.suspended_at(now));
    }

    #[test]
    fn missing_user_is_an_absent_result() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        assert!(get_user(&mut conn, 4242).unwrap().is_none());
    }
}
