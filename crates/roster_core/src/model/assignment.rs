//! Assignment ("plan" row) model and plan-run reports.
//!
//! # Invariants
//! - At most one assignment exists per `(meeting, role)` slot.
//! - A tagged meeting holds at most one marker assignment with neither role
//!   nor person.
//! - `person_id = None` on a role slot means the slot is open.

use crate::model::roster::{Meeting, MeetingId, Person, PersonId, Role, RoleId, Task};
use serde::Serialize;

pub type AssignmentId = i64;

/// Flat assignment row as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub meeting_id: MeetingId,
    pub role_id: Option<RoleId>,
    pub person_id: Option<PersonId>,
}

/// Assignment with meeting, role, task and person resolved.
///
/// Serialized with nested objects; role, task and person are omitted when
/// absent (marker rows and open slots).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentDetail {
    pub id: AssignmentId,
    pub meeting: Meeting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
}

impl AssignmentDetail {
    pub fn is_marker(&self) -> bool {
        self.role.is_none()
    }

    pub fn person_id(&self) -> Option<PersonId> {
        self.person.as_ref().map(|person| person.id)
    }
}

/// What happened to one slot during a batch fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotStatus {
    /// A new row was written. `person_id` is `None` when nobody was available.
    Created {
        assignment_id: AssignmentId,
        person_id: Option<PersonId>,
    },
    /// The slot already had a row; nothing was written.
    Skipped { assignment_id: AssignmentId },
    /// Writing the slot failed and was rolled back to its savepoint.
    /// `error_code` is `slot_conflict` when another writer filled the slot
    /// first, `slot_persist_failed` otherwise.
    Failed {
        error_code: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotReport {
    pub meeting_id: MeetingId,
    /// `None` for the marker slot of a tagged meeting.
    pub role_id: Option<RoleId>,
    #[serde(flatten)]
    pub status: SlotStatus,
}

/// Result of `create_plan_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanOutcome {
    /// Every assignment in the period after the run, new and pre-existing.
    pub assignments: Vec<AssignmentDetail>,
    /// One entry per visited slot, in processing order.
    pub slots: Vec<SlotReport>,
}

impl PlanOutcome {
    pub fn created(&self) -> impl Iterator<Item = &SlotReport> {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.status, SlotStatus::Created { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &SlotReport> {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.status, SlotStatus::Failed { .. }))
    }
}

/// Candidate grouping for manual editing of one assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeopleAvailability {
    /// Eligible and free, in fairness order.
    pub available: Vec<Person>,
    /// Eligible but absent or already on duty at the same meeting.
    pub absent: Vec<Person>,
    /// Current holder of the assignment.
    pub assigned: Option<Person>,
}
