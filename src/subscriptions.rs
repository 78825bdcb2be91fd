// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::{StoreError, StoreResult};
use crate::models::{now_millis, NewSubscription, Role, Subscription};
use crate::schema::subscriptions;
use crate::users;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Subscribes a fan to an artist for one paid period. Renewal inserts a new
/// row; historical rows are never updated.
pub fn subscribe(
    conn: &mut SqliteConnection,
    fan_id: i32,
    artist_id: i32,
) -> StoreResult<Subscription> {
    let artist = users::get_user(conn, artist_id)?
        .ok_or_else(|| StoreError::not_found("user", artist_id))?;
    if artist.role != Role::Artist {
        return Err(StoreError::validation("subscriptions target artist accounts"));
    }
    let duration_days = match (artist.subscription_price, artist.subscription_duration_days) {
        (Some(_), Some(days)) => days,
        _ => {
            return Err(StoreError::validation(
                "artist has not configured a subscription",
            ))
        }
    };

    let now = now_millis();
    let subscription = diesel::insert_into(subscriptions::table)
        .values(&NewSubscription {
            user_id: fan_id,
            artist_id,
            start_date: now,
            valid_until: now + i64::from(duration_days) * DAY_MILLIS,
            is_cancelled: false,
        })
        .get_result::<Subscription>(conn)?;
    Ok(subscription)
}

/// Active means not cancelled and not past its paid-until date.
pub fn has_active(conn: &mut SqliteConnection, fan_id: i32, artist_id: i32) -> StoreResult<bool> {
    let count = subscriptions::table
        .filter(subscriptions::user_id.eq(fan_id))
        .filter(subscriptions::artist_id.eq(artist_id))
        .filter(subscriptions::is_cancelled.eq(false))
        .filter(subscriptions::valid_until.gt(now_millis()))
        .count()
        .get_result::<i64>(conn)?;
    Ok(count > 0)
}

/// Cancels any still-active period. Returns `false` when nothing was active.
pub fn cancel(conn: &mut SqliteConnection, fan_id: i32, artist_id: i32) -> StoreResult<bool> {
    let updated = diesel::update(
        subscriptions::table
            .filter(subscriptions::user_id.eq(fan_id))
            .filter(subscriptions::artist_id.eq(artist_id))
            .filter(subscriptions::is_cancelled.eq(false))
            .filter(subscriptions::valid_until.gt(now_millis())),
    )
    .set(subscriptions::is_cancelled.eq(true))
    .execute(conn)?;
    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;

    #[test]
    fn renewal_inserts_a_second_row() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let artist = test_util::artist(&mut conn, "artist", 4.99, 30);

        subscribe(&mut conn, fan.id, artist.id).unwrap();
        subscribe(&mut conn, fan.id, artist.id).unwrap();

        let rows = subscriptions::table
            .filter(subscriptions::user_id.eq(fan.id))
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();
        assert_eq!(rows, 2);
        assert!(has_active(&mut conn, fan.id, artist.id).unwrap());
    }

    #[test]
    fn cancelled_subscription_is_not_active() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let artist = test_util::artist(&mut conn, "artist", 4.99, 30);

        subscribe(&mut conn, fan.id, artist.id).unwrap();
        assert!(cancel(&mut conn, fan.id, artist.id).unwrap());
        assert!(!has_active(&mut conn, fan.id, artist.id).unwrap());
        assert!(!cancel(&mut conn, fan.id, artist.id).unwrap());
    }

    #[test]
    fn unconfigured_artist_rejects_subscription() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let fan = test_util::user(&mut conn, "fan", Role::Fan);
        let artist = test_util::user(&mut conn, "bare", Role::Artist);

        let err = subscribe(&mut conn, fan.id, artist.id).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
