// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! Access-gating evaluator: follow/subscribe/block precedence for comments
//! and direct messages, plus the block write path and its follow cascade.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::{now_millis, NewBlock, Role, User};
use crate::schema::{blocks, follows};
use crate::social;
use crate::subscriptions;
use crate::users;

/// Outcome of the messaging gate. `Blocked` always wins over
/// `SubscriptionRequired`: the block reason must be the one surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageGate {
    Allowed,
    Blocked,
    SubscriptionRequired,
}

impl MessageGate {
    pub fn is_allowed(&self) -> bool {
        matches!(self, MessageGate::Allowed)
    }
}

/// Commenting on an artist's wall requires being the owner or a follower.
pub fn can_comment(conn: &mut SqliteConnection, actor_id: i32, artist_id: i32) -> StoreResult<bool> {
    if actor_id == artist_id {
        return Ok(true);
    }
    social::is_following(conn, actor_id, artist_id)
}

/// True if either side has blocked the other.
pub fn is_blocked_between(conn: &mut SqliteConnection, a: i32, b: i32) -> StoreResult<bool> {
    let count = blocks::table
        .filter(
            blocks::blocker_id
                .eq(a)
                .and(blocks::blocked_id.eq(b))
                .or(blocks::blocker_id.eq(b).and(blocks::blocked_id.eq(a))),
        )
        .count()
        .get_result::<i64>(conn)?;
    Ok(count > 0)
}

/// Evaluates messaging eligibility on the social channel between two users.
/// Blocks are symmetric and checked first. The subscription gate applies only
/// when the pair resolves to one fan and one artist; any other pairing is not
/// subscription-gated.
pub fn message_gate(conn: &mut SqliteConnection, a: i32, b: i32) -> StoreResult<MessageGate> {
    if is_blocked_between(conn, a, b)? {
        return Ok(MessageGate::Blocked);
    }

    let first = users::get_user(conn, a)?;
    let second = users::get_user(conn, b)?;
    let Some((fan, artist)) = resolve_pairing(first.as_ref(), second.as_ref()) else {
        return Ok(MessageGate::Allowed);
    };

    if subscriptions::has_active(conn, fan.id, artist.id)? {
        Ok(MessageGate::Allowed)
    } else {
        debug!(fan = fan.id, artist = artist.id, "message gate: no active subscription");
        Ok(MessageGate::SubscriptionRequired)
    }
}

fn resolve_pairing<'a>(a: Option<&'a User>, b: Option<&'a User>) -> Option<(&'a User, &'a User)> {
    match (a, b) {
        (Some(x), Some(y)) if x.role == Role::Fan && y.role == Role::Artist => Some((x, y)),
        (Some(x), Some(y)) if x.role == Role::Artist && y.role == Role::Fan => Some((y, x)),
        _ => None,
    }
}

/// Blocks a user. Blocking is a one-way trust revocation that also severs the
/// blocked party's follow edge toward the blocker, in the same transaction.
/// Returns `false` when the block already existed.
pub fn block_user(conn: &mut SqliteConnection, blocker_id: i32, blocked_id: i32) -> StoreResult<bool> {
    if blocker_id == blocked_id {
        return Err(StoreError::validation("cannot block yourself"));
    }
    conn.transaction::<_, StoreError, _>(|conn| {
        let existing = blocks::table
            .filter(blocks::blocker_id.eq(blocker_id))
            .filter(blocks::blocked_id.eq(blocked_id))
            .select(blocks::id)
            .first::<i32>(conn)
            .optional()?;
        if existing.is_some() {
            return Ok(false);
        }

        diesel::insert_into(blocks::table)
            .values(&NewBlock {
                blocker_id,
                blocked_id,
                created_at: now_millis(),
            })
            .execute(conn)?;

        // Force-unfollow: the blocked party's edge toward the blocker goes
        // away; the blocker's own follows are untouched.
        diesel::delete(
            follows::table
                .filter(follows::follower_id.eq(blocked_id))
                .filter(follows::artist_id.eq(blocker_id)),
        )
        .execute(conn)?;

        Ok(true)
    })
}

pub fn unblock_user(
    conn: &mut SqliteConnection,
    blocker_id: i32,
    blocked_id: i32,
) -> StoreResult<bool> {
    let removed = diesel::delete(
        blocks::table
            .filter(blocks::blocker_id.eq(blocker_id))
            .filter(blocks::blocked_id.eq(blocked_id)),
    )
    .execute(conn)?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;

    #[test]
    fn blocking_severs_the_blocked_partys_follow_edge() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "a", Role::Artist);
        let fan = test_util::user(&mut conn, "b", Role::Fan);

        social::follow(&mut conn, fan.id, artist.id).unwrap();
        assert!(social::is_following(&mut conn, fan.id, artist.id).unwrap());

        assert!(block_user(&mut conn, artist.id, fan.id).unwrap());
        assert!(!social::is_following(&mut conn, fan.id, artist.id).unwrap());
        assert!(is_blocked_between(&mut conn, fan.id, artist.id).unwrap());

        // Repeat block is a no-op signal.
        assert!(!block_user(&mut conn, artist.id, fan.id).unwrap());
    }

    #[test]
    fn block_takes_precedence_over_subscription_state() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::artist(&mut conn, "artist", 4.99, 30);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);

        // No subscription yet: gated on subscription.
        assert_eq!(
            message_gate(&mut conn, fan.id, artist.id).unwrap(),
            MessageGate::SubscriptionRequired
        );

        // Even with an active subscription, a block wins and is the reason.
        subscriptions::subscribe(&mut conn, fan.id, artist.id).unwrap();
        assert!(message_gate(&mut conn, fan.id, artist.id).unwrap().is_allowed());

        block_user(&mut conn, artist.id, fan.id).unwrap();
        assert_eq!(
            message_gate(&mut conn, fan.id, artist.id).unwrap(),
            MessageGate::Blocked
        );
        // Symmetric: same answer from the fan's side.
        assert_eq!(
            message_gate(&mut conn, artist.id, fan.id).unwrap(),
            MessageGate::Blocked
        );
    }

    #[test]
    fn non_fan_artist_pairs_are_not_subscription_gated() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let fan_a = test_util::user(&mut conn, "a", Role::Fan);
        let fan_b = test_util::user(&mut conn, "b", Role::Fan);

        assert!(message_gate(&mut conn, fan_a.id, fan_b.id).unwrap().is_allowed());
    }

    #[test]
    fn owner_and_follower_can_comment() {
        let db = test_util::db();
        let mut conn = db.conn().unwrap();
        let artist = test_util::user(&mut conn, "artist", Role::Artist);
        let fan = test_util::user(&mut conn, "fan", Role::Fan);

        assert!(can_comment(&mut conn, artist.id, artist.id).unwrap());
        assert!(!can_comment(&mut conn, fan.id, artist.id).unwrap());
        social::follow(&mut conn, fan.id, artist.id).unwrap();
        assert!(can_comment(&mut conn, fan.id, artist.id).unwrap());
    }
}
