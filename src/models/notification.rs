// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::text_enum;
use crate::schema::notifications;

/// Sender id used for rows produced by the platform itself rather than a user.
pub const SYSTEM_SENDER: i32 = 0;

text_enum! {
    /// What `reference_id` points at depends on the kind: a post for POST and
    /// LIKE_POST and COMMENT, a product for MERCH, a comment for REPLY, the
    /// followed user for FOLLOW, a report for REPORT_RESOLVED.
    NotificationKind {
        Post => "POST",
        Merch => "MERCH",
        LikePost => "LIKE_POST",
        Comment => "COMMENT",
        Reply => "REPLY",
        Follow => "FOLLOW",
        Warning => "WARNING",
        ReportResolved => "REPORT_RESOLVED",
    }
}

/// A raw per-event notification row. Immutable once written except `is_read`.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub sender_id: i32,
    pub kind: NotificationKind,
    pub reference_id: i32,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: i32,
    pub sender_id: i32,
    pub kind: NotificationKind,
    pub reference_id: i32,
    pub title: String,
    pub message: String,
    pub created_at: i64,
}
