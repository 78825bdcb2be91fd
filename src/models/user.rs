// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::text_enum;
use crate::schema::users;

text_enum! {
    /// Account role. Only ARTIST accounts carry monetization config.
    Role {
        Fan => "FAN",
        Artist => "ARTIST",
        Admin => "ADMIN",
    }
}

text_enum! {
    AccountStatus {
        Pending => "PENDING",
        Active => "ACTIVE",
        Rejected => "REJECTED",
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub is_suspended: bool,
    pub suspension_ends_at: Option<i64>,
    pub subscription_price: Option<f64>,
    pub subscription_duration_days: Option<i32>,
    pub benefits: Option<String>,
    pub is_fandom_active: bool,
    pub is_dm_active: bool,
    pub is_interaction_enabled: bool,
    pub created_at: i64,
}

impl User {
    /// Suspension is lifted lazily: an expiry in the past reads as "not
    /// suspended", the row itself is never rewritten. A null expiry while the
    /// flag is set means a permanent suspension.
    pub fn suspended_at(&self, now: i64) -> bool {
        self.is_suspended && self.suspension_ends_at.map_or(true, |ends| ends > now)
    }

    pub fn display_label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// DTO for creating a new user
#[derive(Debug, Insertable, Serialize, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: i64,
}
