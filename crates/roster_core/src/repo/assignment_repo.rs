//! Assignment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist one row per `(meeting, role)` slot.
//! - Load assignments fully resolved (meeting, tag, role, task, person).
//!
//! # Invariants
//! - Slot uniqueness is enforced by the `assignments_slot_unique` index; this
//!   module never deduplicates in memory.
//! - Detail listings are ordered by meeting date, then task order, then role
//!   order, so repeated reads are stable.

use crate::model::assignment::{Assignment, AssignmentDetail, AssignmentId};
use crate::model::period::Period;
use crate::model::roster::{Meeting, MeetingId, Person, PersonId, Role, RoleId, Tag, Task};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const DETAIL_SELECT_SQL: &str = "SELECT
    a.id AS id,
    a.meeting_id AS meeting_id,
    a.role_id AS role_id,
    a.person_id AS person_id,
    m.date AS meeting_date,
    g.id AS tag_id,
    g.descr AS tag_descr,
    r.descr AS role_descr,
    r.order_number AS role_order,
    t.id AS task_id,
    t.descr AS task_descr,
    t.order_number AS task_order,
    p.given_name AS given_name,
    p.last_name AS last_name
FROM assignments a
JOIN meetings m ON m.id = a.meeting_id
LEFT JOIN tags g ON g.id = m.tag_id
LEFT JOIN roles r ON r.id = a.role_id
LEFT JOIN tasks t ON t.id = r.task_id
LEFT JOIN people p ON p.id = a.person_id";

const DETAIL_ORDER_SQL: &str = "ORDER BY
    m.date ASC,
    t.order_number IS NULL, t.order_number ASC, t.id ASC,
    r.order_number IS NULL, r.order_number ASC, a.role_id ASC";

/// Repository interface for assignment rows.
pub trait AssignmentRepository {
    /// Returns the id of the row occupying the slot, if any.
    fn find_slot(
        &self,
        meeting_id: MeetingId,
        role_id: Option<RoleId>,
    ) -> RepoResult<Option<AssignmentId>>;
    /// Inserts a new slot row. Fails with a constraint error when the slot is taken.
    fn create(
        &self,
        meeting_id: MeetingId,
        role_id: Option<RoleId>,
        person_id: Option<PersonId>,
    ) -> RepoResult<Assignment>;
    fn get_detail(&self, id: AssignmentId) -> RepoResult<Option<AssignmentDetail>>;
    /// Replaces the person of one row; `NotFound` when the row is missing.
    fn set_person(&self, id: AssignmentId, person_id: Option<PersonId>) -> RepoResult<()>;
    /// All rows whose meeting lies inside `period`.
    fn list_details(&self, period: &Period) -> RepoResult<Vec<AssignmentDetail>>;
}

/// SQLite-backed assignment repository.
pub struct SqliteAssignmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssignmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AssignmentRepository for SqliteAssignmentRepository<'_> {
    fn find_slot(
        &self,
        meeting_id: MeetingId,
        role_id: Option<RoleId>,
    ) -> RepoResult<Option<AssignmentId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id
                 FROM assignments
                 WHERE meeting_id = ?1
                   AND role_id IS ?2;",
                params![meeting_id, role_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn create(
        &self,
        meeting_id: MeetingId,
        role_id: Option<RoleId>,
        person_id: Option<PersonId>,
    ) -> RepoResult<Assignment> {
        self.conn.execute(
            "INSERT INTO assignments (meeting_id, role_id, person_id)
             VALUES (?1, ?2, ?3);",
            params![meeting_id, role_id, person_id],
        )?;
        Ok(Assignment {
            id: self.conn.last_insert_rowid(),
            meeting_id,
            role_id,
            person_id,
        })
    }

    fn get_detail(&self, id: AssignmentId) -> RepoResult<Option<AssignmentDetail>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DETAIL_SELECT_SQL} WHERE a.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_detail_row(row)?));
        }
        Ok(None)
    }

    fn set_person(&self, id: AssignmentId, person_id: Option<PersonId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE assignments SET person_id = ?2 WHERE id = ?1;",
            params![id, person_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "assignment",
                id,
            });
        }
        Ok(())
    }

    fn list_details(&self, period: &Period) -> RepoResult<Vec<AssignmentDetail>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DETAIL_SELECT_SQL}
             WHERE m.date BETWEEN ?1 AND ?2
             {DETAIL_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query(params![period.start(), period.end()])?;
        let mut details = Vec::new();
        while let Some(row) = rows.next()? {
            details.push(parse_detail_row(row)?);
        }
        Ok(details)
    }
}

fn parse_detail_row(row: &Row<'_>) -> RepoResult<AssignmentDetail> {
    let id: AssignmentId = row.get("id")?;
    let meeting_id: MeetingId = row.get("meeting_id")?;

    let tag = match row.get::<_, Option<i64>>("tag_id")? {
        Some(tag_id) => Some(Tag {
            id: tag_id,
            descr: row.get("tag_descr")?,
        }),
        None => None,
    };
    let meeting = Meeting {
        id: meeting_id,
        date: row.get("meeting_date")?,
        tag,
    };

    let (role, task) = match row.get::<_, Option<RoleId>>("role_id")? {
        Some(role_id) => {
            let task_id: Option<i64> = row.get("task_id")?;
            let task_id = task_id.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "assignment {id} references role {role_id} without a task"
                ))
            })?;
            let role = Role {
                id: role_id,
                task_id,
                descr: row.get("role_descr")?,
                order_number: row.get("role_order")?,
            };
            let task = Task {
                id: task_id,
                descr: row.get("task_descr")?,
                order_number: row.get("task_order")?,
            };
            (Some(role), Some(task))
        }
        None => (None, None),
    };

    let person = match row.get::<_, Option<PersonId>>("person_id")? {
        Some(person_id) => Some(Person {
            id: person_id,
            given_name: row.get("given_name")?,
            last_name: row.get("last_name")?,
        }),
        None => None,
    };

    Ok(AssignmentDetail {
        id,
        meeting,
        role,
        task,
        person,
    })
}
