// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{blocks, follows, subscriptions};

/// Model for a follow edge (fan -> artist)
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = follows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Follow {
    pub id: i32,
    pub follower_id: i32,
    pub artist_id: i32,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = follows)]
pub struct NewFollow {
    pub follower_id: i32,
    pub artist_id: i32,
    pub created_at: i64,
}

/// Model for a block edge (blocker -> blocked)
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = blocks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Block {
    pub id: i32,
    pub blocker_id: i32,
    pub blocked_id: i32,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = blocks)]
pub struct NewBlock {
    pub blocker_id: i32,
    pub blocked_id: i32,
    pub created_at: i64,
}

/// A subscription period. Renewal inserts a new row rather than updating the
/// old one, so multiple historical rows per (user, artist) pair are normal.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = subscriptions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Subscription {
    pub id: i32,
    pub user_id: i32,
    pub artist_id: i32,
    pub start_date: i64,
    pub valid_until: i64,
    pub is_cancelled: bool,
}

impl Subscription {
    pub fn is_active(&self, now: i64) -> bool {
        !self.is_cancelled && self.valid_until > now
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct NewSubscription {
    pub user_id: i32,
    pub artist_id: i32,
    pub start_date: i64,
    pub valid_until: i64,
    pub is_cancelled: bool,
}
