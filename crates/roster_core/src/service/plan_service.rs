//! Batch planning use-case service.
//!
//! # Responsibility
//! - Fill every missing slot of a period in one outer transaction.
//! - Expose read paths over the resulting plan.
//!
//! # Invariants
//! - Slots are visited by meeting date, then fixed role order. Each pick
//!   changes the fairness counts seen by later picks in the same run.
//! - Each slot runs inside its own savepoint. A failing slot rolls back to
//!   that savepoint only and is reported as `SlotStatus::Failed`; slots
//!   written earlier in the run survive.
//! - Existing rows are never touched, so repeated runs are idempotent.

use crate::error::{RosterError, RosterResult};
use crate::model::assignment::{
    AssignmentDetail, AssignmentId, PlanOutcome, SlotReport, SlotStatus,
};
use crate::model::period::{FairnessWindow, Period};
use crate::model::roster::{Meeting, RoleId};
use crate::repo::artifact_repo::{ArtifactRepository, SqliteArtifactRepository};
use crate::repo::assignment_repo::{AssignmentRepository, SqliteAssignmentRepository};
use crate::repo::directory_repo::{RosterDirectory, SqliteRosterDirectory};
use crate::repo::RepoError;
use crate::service::resolver::AvailabilityResolver;
use log::{debug, error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

const SLOT_CONFLICT: &str = "slot_conflict";
const SLOT_PERSIST_FAILED: &str = "slot_persist_failed";

/// Plan service bound to a caller-owned connection.
pub struct PlanService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> PlanService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates all missing assignments for `period` and auto-assigns people.
    ///
    /// Tagged meetings get a single role-less marker row. Untagged meetings
    /// get one row per role; the person is the resolver's first candidate for
    /// the month containing the meeting, or `None` when nobody is free.
    ///
    /// # Errors
    /// Loading meetings/roles, marking artifacts dirty and reloading the
    /// result propagate. Per-slot write failures do not; they show up in
    /// `PlanOutcome::slots`.
    pub fn create_plan_data(&self, period: &Period) -> RosterResult<PlanOutcome> {
        let started_at = Instant::now();
        info!(
            "event=plan_create module=plan status=start start={} end={}",
            period.start(),
            period.end()
        );

        match self.run_batch(period) {
            Ok(outcome) => {
                info!(
                    "event=plan_create module=plan status=ok duration_ms={} slots={} created={} failed={} total={}",
                    started_at.elapsed().as_millis(),
                    outcome.slots.len(),
                    outcome.created().count(),
                    outcome.failed().count(),
                    outcome.assignments.len()
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    "event=plan_create module=plan status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// All assignments with a meeting inside `period`, fully loaded.
    pub fn get_plan(&self, period: &Period) -> RosterResult<Vec<AssignmentDetail>> {
        Ok(SqliteAssignmentRepository::new(self.conn).list_details(period)?)
    }

    /// One assignment, fully loaded.
    pub fn get_plan_element(&self, id: AssignmentId) -> RosterResult<AssignmentDetail> {
        SqliteAssignmentRepository::new(self.conn)
            .get_detail(id)?
            .ok_or(RosterError::NotFound {
                entity: "assignment",
                id,
            })
    }

    fn run_batch(&self, period: &Period) -> RosterResult<PlanOutcome> {
        let mut tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let invalidated = SqliteArtifactRepository::new(&tx).mark_dirty_intersecting(period)?;
        debug!("event=plan_create module=plan status=progress artifacts_invalidated={invalidated}");

        let directory = SqliteRosterDirectory::new(&tx);
        let meetings = directory.list_meetings(period)?;
        let role_ids: Vec<RoleId> = directory.list_roles()?.iter().map(|role| role.id).collect();

        let mut slots = Vec::new();
        for meeting in &meetings {
            if meeting.is_tagged() {
                slots.push(fill_slot(&mut tx, meeting, None));
                continue;
            }
            for role_id in &role_ids {
                slots.push(fill_slot(&mut tx, meeting, Some(*role_id)));
            }
        }

        let assignments = SqliteAssignmentRepository::new(&tx).list_details(period)?;
        tx.commit()?;

        Ok(PlanOutcome { assignments, slots })
    }
}

fn fill_slot(tx: &mut Transaction<'_>, meeting: &Meeting, role_id: Option<RoleId>) -> SlotReport {
    let status = match try_fill_slot(tx, meeting, role_id) {
        Ok(status) => {
            debug!(
                "event=plan_slot module=plan status=ok meeting_id={} role_id={:?} outcome={:?}",
                meeting.id, role_id, status
            );
            status
        }
        Err(err) => {
            let error_code = if err.is_unique_violation() {
                SLOT_CONFLICT
            } else {
                SLOT_PERSIST_FAILED
            };
            error!(
                "event=plan_slot module=plan status=error meeting_id={} role_id={:?} error_code={} error={}",
                meeting.id, role_id, error_code, err
            );
            SlotStatus::Failed {
                error_code,
                reason: err.to_string(),
            }
        }
    };

    SlotReport {
        meeting_id: meeting.id,
        role_id,
        status,
    }
}

fn try_fill_slot(
    tx: &mut Transaction<'_>,
    meeting: &Meeting,
    role_id: Option<RoleId>,
) -> Result<SlotStatus, RepoError> {
    // Dropping the savepoint on any early return rolls back to it.
    let savepoint = tx.savepoint()?;
    let repo = SqliteAssignmentRepository::new(&savepoint);

    if let Some(assignment_id) = repo.find_slot(meeting.id, role_id)? {
        return Ok(SlotStatus::Skipped { assignment_id });
    }

    let person_id = match role_id {
        Some(role_id) => {
            let window = FairnessWindow::month_containing(meeting.date)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
            AvailabilityResolver::new(&savepoint)
                .first_candidate(meeting, role_id, &window)?
                .map(|candidate| candidate.person.id)
        }
        None => None,
    };

    let assignment = repo.create(meeting.id, role_id, person_id)?;
    savepoint.commit()?;

    Ok(SlotStatus::Created {
        assignment_id: assignment.id,
        person_id: assignment.person_id,
    })
}
