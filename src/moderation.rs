// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::models::notification::SYSTEM_SENDER;
use crate::models::{
    now_millis, AdminAction, NewReport, NotificationKind, Report, ReportKind, ReportStatus,
};
use crate::notifications;
use crate::schema::{comments, posts, products, reports};
use crate::users;

/// Result of filing a report. A repeat while the earlier report is still
/// pending is a signal, not an error.
#[derive(Debug)]
pub enum ReportOutcome {
    Filed(Report),
    Duplicate,
}

/// Files a report. Idempotent per (reporter, kind, reference) while a prior
/// report from the same reporter on the same target is PENDING; once that one
/// is resolved or dismissed the same reporter may report the target again.
pub fn submit_report(
    conn: &mut SqliteConnection,
    reporter_id: i32,
    kind: ReportKind,
    reported_id: Option<i32>,
    reference_id: Option<i32>,
    reason: Option<String>,
) -> StoreResult<ReportOutcome> {
    let pending = match reference_id {
        Some(reference) => reports::table
            .filter(reports::reporter_id.eq(reporter_id))
            .filter(reports::kind.eq(kind))
            .filter(reports::status.eq(ReportStatus::Pending))
            .filter(reports::reference_id.eq(reference))
            .count()
            .get_result::<i64>(conn)?,
        None => reports::table
            .filter(reports::reporter_id.eq(reporter_id))
            .filter(reports::kind.eq(kind))
            .filter(reports::status.eq(ReportStatus::Pending))
            .filter(reports::reference_id.is_null())
            .count()
            .get_result::<i64>(conn)?,
    };

    if pending > 0 {
        info!(reporter_id, %kind, "duplicate report while pending, ignoring");
        return Ok(ReportOutcome::Duplicate);
    }

    let report = diesel::insert_into(reports::table)
        .values(&NewReport {
            reporter_id,
            reported_id,
            reference_id,
            kind,
            reason,
            status: ReportStatus::Pending,
            created_at: now_millis(),
        })
        .get_result::<Report>(conn)?;
    Ok(ReportOutcome::Filed(report))
}

/// Resolves a pending report, applying the chosen admin action and notifying
/// the reporter. Resolution is terminal.
pub fn resolve_report(
    conn: &mut SqliteConnection,
    report_id: i32,
    action: AdminAction,
    suspension_ends_at: Option<i64>,
) -> StoreResult<Report> {
    conn.transaction::<_, StoreError, _>(|conn| {
        let report = load_pending(conn, report_id)?;

        match action {
            AdminAction::Suspend => {
                if let Some(reported_id) = report.reported_id {
                    users::set_suspension(conn, reported_id, true, suspension_ends_at)?;
                }
            }
            AdminAction::Warning => {
                if let Some(reported_id) = report.reported_id {
                    notifications::push(
                        conn,
                        reported_id,
                        SYSTEM_SENDER,
                        NotificationKind::Warning,
                        report.id,
                        "Warning",
                        "Your content was reported and reviewed. Please follow the community guidelines.",
                    )?;
                }
            }
            AdminAction::Delete => delete_reported_content(conn, &report)?,
        }

        let resolved = diesel::update(reports::table.find(report.id))
            .set((
                reports::status.eq(ReportStatus::Resolved),
                reports::admin_action.eq(Some(action)),
            ))
            .get_result::<Report>(conn)?;

        notifications::push(
            conn,
            resolved.reporter_id,
            SYSTEM_SENDER,
            NotificationKind::ReportResolved,
            resolved.id,
            "Report resolved",
            "Thanks for your report. Our team has reviewed it and taken action.",
        )?;

        Ok(resolved)
    })
}

/// Dismisses a pending report without action. Terminal, reporter is notified.
pub fn dismiss_report(conn: &mut SqliteConnection, report_id: i32) -> StoreResult<Report> {
    let report = load_pending(conn, report_id)?;
    let dismissed = diesel::update(reports::table.find(report.id))
        .set(reports::status.eq(ReportStatus::Dismissed))
        .get_result::<Report>(conn)?;
    notifications::push(
        conn,
        dismissed.reporter_id,
        SYSTEM_SENDER,
        NotificationKind::ReportResolved,
        dismissed.id,
        "Report reviewed",
        "Thanks for your report. Our team reviewed it and found no violation.",
    )?;
    Ok(dismissed)
}

fn load_pending(conn: &mut SqliteConnection, report_id: i32) -> StoreResult<Report> {
    let report = reports::table
        .find(report_id)
        .first::<Report>(conn)
        .optional()?
        .ok_or_else(|| StoreError::not_found("report", report_id))?;
    if report.status != ReportStatus::Pending {
        return Err(StoreError::validation("report is already settled"));
    }
    Ok(report)
}

fn delete_reported_content(conn: &mut SqliteConnection, report: &Report) -> StoreResult<()> {
    let Some(reference_id) = report.reference_id else {
        return Ok(());
    };
    match report.kind {
        ReportKind::Post => {
            diesel::delete(posts::table.find(reference_id)).execute(conn)?;
        }
        ReportKind::Comment => {
            diesel::delete(comments::table.find(reference_id)).execute(conn)?;
        }
        ReportKind::Product => {
            diesel::delete(products::table.find(reference_id)).execute(conn)?;
        }
        // Deleting an account is out of scope for a content report; suspension
        // is the user-level action.
        ReportKind::User => {}
    }
    Ok(())
}
