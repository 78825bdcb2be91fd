// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! Notification digest builder: collapses raw per-event notification rows
//! into deduplicated, pluralized summaries. A pure projection, recomputed
//! fresh on every call; nothing about it is stored.

use std::collections::HashMap;

use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::error::StoreResult;
use crate::models::{Notification, NotificationKind, User};
use crate::notifications;

/// Display name used when the sender was deleted or is the system actor.
const FALLBACK_SENDER: &str = "FandomHub";

/// One aggregated, user-facing notification summarizing one or more raw rows
/// sharing a grouping key. Sender, avatar, reference and timestamp come from
/// the latest row of the group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestEntry {
    pub kind: NotificationKind,
    pub sender_id: i32,
    pub sender_name: Option<String>,
    pub avatar_url: Option<String>,
    pub reference_id: i32,
    pub title: String,
    pub message: String,
    pub count: usize,
    pub other_count: usize,
    pub is_read: bool,
    pub created_at: i64,
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum GroupKey {
    /// POST and MERCH accumulate under the artist who produced them.
    BySender(NotificationKind, i32),
    /// Reactions to the same target accumulate together regardless of actor.
    ByReference(NotificationKind, i32),
    /// WARNING and REPORT_RESOLVED are individually addressed; one row, one
    /// entry.
    Single(i32),
}

fn group_key(row: &Notification) -> GroupKey {
    match row.kind {
        NotificationKind::Post | NotificationKind::Merch => {
            GroupKey::BySender(row.kind, row.sender_id)
        }
        NotificationKind::LikePost
        | NotificationKind::Comment
        | NotificationKind::Reply
        | NotificationKind::Follow => GroupKey::ByReference(row.kind, row.reference_id),
        NotificationKind::Warning | NotificationKind::ReportResolved => GroupKey::Single(row.id),
    }
}

/// Builds the digest for a recipient, newest group first. A notification
/// whose sender has been deleted renders with the fallback name; it never
/// fails the whole digest.
pub fn build_digest(
    conn: &mut SqliteConnection,
    recipient_id: i32,
) -> StoreResult<Vec<DigestEntry>> {
    let rows = notifications::rows_with_senders(conn, recipient_id)?;

    let mut groups: HashMap<GroupKey, Vec<&(Notification, Option<User>)>> = HashMap::new();
    for row in &rows {
        groups.entry(group_key(&row.0)).or_default().push(row);
    }

    let mut entries: Vec<DigestEntry> = groups.into_values().filter_map(render_group).collect();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(entries)
}

fn render_group(group: Vec<&(Notification, Option<User>)>) -> Option<DigestEntry> {
    // Latest row by timestamp is the representative.
    let (representative, sender) = group
        .iter()
        .max_by_key(|(row, _)| (row.created_at, row.id))?;

    let count = group.len();
    let other_count = count - 1;
    let name = sender
        .as_ref()
        .map(|u| u.display_label().to_string())
        .unwrap_or_else(|| FALLBACK_SENDER.to_string());

    let (title, message) = match representative.kind {
        NotificationKind::Post => (
            "New post".to_string(),
            if count > 1 {
                format!("{name} shared {count} new posts")
            } else {
                format!("{name} shared a new post")
            },
        ),
        NotificationKind::Merch => (
            "New merch".to_string(),
            if count > 1 {
                format!("{name} added {count} new items to their shop")
            } else {
                format!("{name} added a new item to their shop")
            },
        ),
        NotificationKind::LikePost => (
            "New like".to_string(),
            if other_count > 0 {
                format!("{name} and {other_count} others liked your post")
            } else {
                format!("{name} liked your post")
            },
        ),
        NotificationKind::Comment => (
            "New comment".to_string(),
            if other_count > 0 {
                format!("{name} and {other_count} others commented on your post")
            } else {
                format!("{name} commented on your post")
            },
        ),
        NotificationKind::Reply => (
            "New reply".to_string(),
            if other_count > 0 {
                format!("{name} and {other_count} others replied to your comment")
            } else {
                format!("{name} replied to your comment")
            },
        ),
        NotificationKind::Follow => (
            "New follower".to_string(),
            if other_count > 0 {
                format!("{name} and {other_count} others started following you")
            } else {
                format!("{name} started following you")
            },
        ),
        // Already addressed to one recipient; stored text passes through
        // verbatim.
        NotificationKind::Warning | NotificationKind::ReportResolved => (
            representative.title.clone(),
            representative.message.clone(),
        ),
    };

    Some(DigestEntry {
        kind: representative.kind,
        sender_id: representative.sender_id,
        sender_name: sender.as_ref().map(|u| u.display_label().to_string()),
        avatar_url: sender.as_ref().and_then(|u| u.avatar_url.clone()),
        reference_id: representative.reference_id,
        title,
        message,
        count,
        other_count,
        is_read: representative.is_read,
        created_at: representative.created_at,
    })
}
