//! Manual editing of single assignments.
//!
//! # Responsibility
//! - Validate and apply one reassignment (`update_plan_element`).
//! - Group candidates for one assignment for the editing UI
//!   (`get_all_person_available`).
//!
//! # Invariants
//! - A person may only take a role they are eligible for.
//! - Reassignment never touches other assignments and never re-balances.
//! - Every artifact whose range contains the meeting date is marked dirty in
//!   the same transaction as the update.

use crate::error::{RosterError, RosterResult};
use crate::model::assignment::{AssignmentDetail, AssignmentId, PeopleAvailability};
use crate::model::period::FairnessWindow;
use crate::model::roster::PersonId;
use crate::repo::artifact_repo::{ArtifactRepository, SqliteArtifactRepository};
use crate::repo::assignment_repo::{AssignmentRepository, SqliteAssignmentRepository};
use crate::repo::directory_repo::{RosterDirectory, SqliteRosterDirectory};
use crate::service::resolver::AvailabilityResolver;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::HashSet;

/// Assignment editing service bound to a caller-owned connection.
pub struct AssignmentService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> AssignmentService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Puts `person_id` on the assignment and returns the updated row.
    ///
    /// # Errors
    /// - `NotFound` for an unknown assignment or person.
    /// - `NotAllowed` when the assignment is a tagged-meeting marker or the
    ///   person is not eligible for its role. Nothing is written.
    /// - `Persistence` when the update or the dirty marking fails.
    pub fn update_plan_element(
        &self,
        assignment_id: AssignmentId,
        person_id: PersonId,
    ) -> RosterResult<AssignmentDetail> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let assignments = SqliteAssignmentRepository::new(&tx);
        let directory = SqliteRosterDirectory::new(&tx);

        let current = assignments
            .get_detail(assignment_id)?
            .ok_or(RosterError::NotFound {
                entity: "assignment",
                id: assignment_id,
            })?;
        if directory.get_person(person_id)?.is_none() {
            return Err(RosterError::NotFound {
                entity: "person",
                id: person_id,
            });
        }

        let role_id = current.role.as_ref().map(|role| role.id);
        let allowed = match role_id {
            Some(role_id) => directory.is_eligible(person_id, role_id)?,
            None => false,
        };
        if !allowed {
            warn!(
                "event=plan_update module=plan status=rejected assignment_id={assignment_id} person_id={person_id} role_id={role_id:?} error_code=not_allowed"
            );
            return Err(RosterError::NotAllowed {
                assignment_id,
                person_id,
                role_id,
            });
        }

        assignments.set_person(assignment_id, Some(person_id))?;
        let invalidated =
            SqliteArtifactRepository::new(&tx).mark_dirty_containing(current.meeting.date)?;
        let updated = assignments
            .get_detail(assignment_id)?
            .ok_or(RosterError::NotFound {
                entity: "assignment",
                id: assignment_id,
            })?;
        tx.commit()?;

        info!(
            "event=plan_update module=plan status=ok assignment_id={assignment_id} person_id={person_id} previous_person_id={:?} artifacts_invalidated={invalidated}",
            current.person_id()
        );
        Ok(updated)
    }

    /// Splits the role's eligible people into available / absent / assigned.
    ///
    /// `available` keeps the resolver's fairness order for the assignment's
    /// month. `absent` holds everyone else eligible except the current
    /// holder: people with an absence and people already on another duty at
    /// the same meeting.
    pub fn get_all_person_available(
        &self,
        assignment: &AssignmentDetail,
    ) -> RosterResult<PeopleAvailability> {
        let role = assignment.role.as_ref().ok_or_else(|| {
            RosterError::Validation(format!(
                "assignment {} marks a tagged meeting and has no role",
                assignment.id
            ))
        })?;
        let window = FairnessWindow::month_containing(assignment.meeting.date)?;
        let directory = SqliteRosterDirectory::new(self.conn);

        let assigned = match assignment.person_id() {
            Some(person_id) => directory.get_person(person_id)?,
            None => None,
        };
        let assigned_id = assigned.as_ref().map(|person| person.id);

        let available: Vec<_> = AvailabilityResolver::new(self.conn)
            .candidates(&assignment.meeting, role.id, &window)?
            .into_iter()
            .map(|candidate| candidate.person)
            .filter(|person| Some(person.id) != assigned_id)
            .collect();

        let available_ids: HashSet<PersonId> = available.iter().map(|person| person.id).collect();
        let absent = directory
            .eligible_people(role.id)?
            .into_iter()
            .filter(|person| !available_ids.contains(&person.id) && Some(person.id) != assigned_id)
            .collect();

        Ok(PeopleAvailability {
            available,
            absent,
            assigned,
        })
    }
}
