// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::StoreResult;
use crate::models::{now_millis, NewNotification, Notification, NotificationKind, User};
use crate::schema::{notifications, users};

/// Inserts one raw notification row. Rows are written as a side effect of the
/// triggering action and never updated afterwards except for `is_read`.
pub fn push(
    conn: &mut SqliteConnection,
    recipient_id: i32,
    sender_id: i32,
    kind: NotificationKind,
    reference_id: i32,
    title: &str,
    message: &str,
) -> StoreResult<()> {
    diesel::insert_into(notifications::table)
        .values(&NewNotification {
            user_id: recipient_id,
            sender_id,
            kind,
            reference_id,
            title: title.to_string(),
            message: message.to_string(),
            created_at: now_millis(),
        })
        .execute(conn)?;
    Ok(())
}

/// All raw rows for a recipient, newest first, each with its sender profile
/// resolved where the sender still exists. A deleted or system sender comes
/// back as `None`.
pub fn rows_with_senders(
    conn: &mut SqliteConnection,
    recipient_id: i32,
) -> StoreResult<Vec<(Notification, Option<User>)>> {
    let rows = notifications::table
        .filter(notifications::user_id.eq(recipient_id))
        .left_join(users::table.on(users::id.eq(notifications::sender_id)))
        .select((Notification::as_select(), Option::<User>::as_select()))
        .order(notifications::created_at.desc())
        .load::<(Notification, Option<User>)>(conn)?;
    Ok(rows)
}

pub fn mark_read(conn: &mut SqliteConnection, notification_id: i32) -> StoreResult<()> {
    diesel::update(notifications::table.find(notification_id))
        .set(notifications::is_read.eq(true))
        .execute(conn)?;
    Ok(())
}

pub fn mark_all_read(conn: &mut SqliteConnection, recipient_id: i32) -> StoreResult<()> {
    diesel::update(notifications::table.filter(notifications::user_id.eq(recipient_id)))
        .set(notifications::is_read.eq(true))
        .execute(conn)?;
    Ok(())
}

pub fn unread_count(conn: &mut SqliteConnection, recipient_id: i32) -> StoreResult<i64> {
    let count = notifications::table
        .filter(notifications::user_id.eq(recipient_id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result::<i64>(conn)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::test_util;

    #[test]
    fn deleted_sender_resolves_to_none() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let recipient = test_util::user(&mut conn, "recipient", Role::Artist);

        // sender_id 999 does not exist; 0 is the system actor
        push(&mut conn, recipient.id, 999, NotificationKind::Follow, recipient.id, "", "").unwrap();
        push(&mut conn, recipient.id, 0, NotificationKind::Warning, 0, "Warning", "Be nice").unwrap();

        let rows = rows_with_senders(&mut conn, recipient.id).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|(_, sender)| sender.is_none()));
    }

    #[test]
    fn unread_count_tracks_mark_read() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let recipient = test_util::user(&mut conn, "recipient", Role::Fan);
        let sender = test_util::user(&mut conn, "sender", Role::Fan);

        push(&mut conn, recipient.id, sender.id, NotificationKind::LikePost, 1, "", "").unwrap();
        push(&mut conn, recipient.id, sender.id, NotificationKind::Comment, 1, "", "").unwrap();
        assert_eq!(unread_count(&mut conn, recipient.id).unwrap(), 2);

        mark_all_read(&mut conn, recipient.id).unwrap();
        assert_eq!(unread_count(&mut conn, recipient.id).unwrap(), 0);
    }
}
