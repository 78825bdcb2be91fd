// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::text_enum;
use crate::schema::reports;

text_enum! {
    ReportKind {
        User => "USER",
        Post => "POST",
        Comment => "COMMENT",
        Product => "PRODUCT",
    }
}

text_enum! {
    /// Reports are created PENDING and are terminal once RESOLVED or
    /// DISMISSED; there is no reopening.
    ReportStatus {
        Pending => "PENDING",
        Resolved => "RESOLVED",
        Dismissed => "DISMISSED",
    }
}

text_enum! {
    AdminAction {
        Suspend => "SUSPEND",
        Warning => "WARNING",
        Delete => "DELETE",
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Report {
    pub id: i32,
    pub reporter_id: i32,
    pub reported_id: Option<i32>,
    pub reference_id: Option<i32>,
    pub kind: ReportKind,
    pub reason: Option<String>,
    pub status: ReportStatus,
    pub admin_action: Option<AdminAction>,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport {
    pub reporter_id: i32,
    pub reported_id: Option<i32>,
    pub reference_id: Option<i32>,
    pub kind: ReportKind,
    pub reason: Option<String>,
    pub status: ReportStatus,
    pub created_at: i64,
}
