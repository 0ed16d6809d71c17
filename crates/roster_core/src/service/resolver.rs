//! Candidate resolution for one `(meeting, role)` slot.
//!
//! # Responsibility
//! - Filter role-eligible people down to those free for the meeting.
//! - Order them so the least-loaded person in the fairness window comes first.
//!
//! # Invariants
//! - Pure read; safe to run inside the caller's transaction or savepoint, in
//!   which case counts include rows written earlier in the same run.
//! - Nobody already holding any assignment at the meeting is returned.
//! - People with a one-off absence for the meeting, or a recurring absence on
//!   the meeting's weekday, are never returned.
//! - Order is `(window_total, window_role, person id)` ascending. Only rows
//!   with a person count, so tagged-meeting markers and open slots are
//!   invisible to fairness.

use crate::model::period::FairnessWindow;
use crate::model::roster::{Meeting, Person, RoleId};
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

const CANDIDATES_SQL: &str = "SELECT
    p.id AS id,
    p.given_name AS given_name,
    p.last_name AS last_name,
    (
        SELECT COUNT(*)
        FROM assignments a
        JOIN meetings m ON m.id = a.meeting_id
        WHERE a.person_id = p.id
          AND m.date >= ?3
          AND m.date < ?4
    ) AS window_total,
    (
        SELECT COUNT(*)
        FROM assignments a
        JOIN meetings m ON m.id = a.meeting_id
        WHERE a.person_id = p.id
          AND a.role_id = ?2
          AND m.date >= ?3
          AND m.date < ?4
    ) AS window_role
FROM people p
JOIN person_roles pr ON pr.person_id = p.id AND pr.role_id = ?2
WHERE NOT EXISTS (
        SELECT 1 FROM assignments a
        WHERE a.meeting_id = ?1 AND a.person_id = p.id
    )
  AND NOT EXISTS (
        SELECT 1 FROM person_absences pa
        WHERE pa.meeting_id = ?1 AND pa.person_id = p.id
    )
  AND NOT EXISTS (
        SELECT 1 FROM person_recurring_absences ra
        WHERE ra.weekday = ?5 AND ra.person_id = p.id
    )
ORDER BY window_total ASC, window_role ASC, p.id ASC;";

/// One eligible, available person plus the counts used to rank them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub person: Person,
    /// Assignments of any role inside the fairness window.
    pub window_total: u32,
    /// Assignments of the requested role inside the fairness window.
    pub window_role: u32,
}

/// Read-only resolver bound to a caller-owned connection.
pub struct AvailabilityResolver<'conn> {
    conn: &'conn Connection,
}

impl<'conn> AvailabilityResolver<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// All free candidates for the slot, best first.
    pub fn candidates(
        &self,
        meeting: &Meeting,
        role_id: RoleId,
        window: &FairnessWindow,
    ) -> RepoResult<Vec<Candidate>> {
        let mut stmt = self.conn.prepare_cached(CANDIDATES_SQL)?;
        let candidates = stmt
            .query_map(
                params![
                    meeting.id,
                    role_id,
                    window.start,
                    window.end,
                    meeting.weekday_index()
                ],
                |row| {
                    Ok(Candidate {
                        person: Person {
                            id: row.get("id")?,
                            given_name: row.get("given_name")?,
                            last_name: row.get("last_name")?,
                        },
                        window_total: row.get("window_total")?,
                        window_role: row.get("window_role")?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(candidates)
    }

    /// The candidate automatic planning would pick, if any.
    pub fn first_candidate(
        &self,
        meeting: &Meeting,
        role_id: RoleId,
        window: &FairnessWindow,
    ) -> RepoResult<Option<Candidate>> {
        Ok(self
            .candidates(meeting, role_id, window)?
            .into_iter()
            .next())
    }
}
