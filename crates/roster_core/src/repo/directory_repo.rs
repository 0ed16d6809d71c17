//! Read-only access to people, duties, meetings and eligibility.
//!
//! # Responsibility
//! - Expose what the roster engine needs from the externally managed
//!   directory tables without offering CRUD on them.
//!
//! # Invariants
//! - Role listing order is fixed: task order, task id, role order, role id
//!   (missing order numbers sort last). Batch planning depends on it.
//! - Meeting listing order is `date ASC`.

use crate::model::period::Period;
use crate::model::roster::{
    Meeting, Person, PersonId, Role, RoleId, Tag, Task, TaskWithRoles,
};
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

const MEETING_SELECT_SQL: &str = "SELECT
    m.id AS id,
    m.date AS date,
    g.id AS tag_id,
    g.descr AS tag_descr
FROM meetings m
LEFT JOIN tags g ON g.id = m.tag_id";

const ROLE_ORDER_SQL: &str = "ORDER BY
    t.order_number IS NULL, t.order_number ASC, t.id ASC,
    r.order_number IS NULL, r.order_number ASC, r.id ASC";

/// Read interface over the roster directory.
pub trait RosterDirectory {
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Meetings dated inside `period`, ordered by date.
    fn list_meetings(&self, period: &Period) -> RepoResult<Vec<Meeting>>;
    /// All roles in fixed planning order.
    fn list_roles(&self) -> RepoResult<Vec<Role>>;
    /// Tasks in display order, each with its roles in display order.
    fn list_tasks_with_roles(&self) -> RepoResult<Vec<TaskWithRoles>>;
    fn is_eligible(&self, person_id: PersonId, role_id: RoleId) -> RepoResult<bool>;
    /// Everyone eligible for `role_id`, ordered by last name, given name, id.
    fn eligible_people(&self, role_id: RoleId) -> RepoResult<Vec<Person>>;
}

/// SQLite-backed roster directory.
pub struct SqliteRosterDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterDirectory<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RosterDirectory for SqliteRosterDirectory<'_> {
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let person = self
            .conn
            .query_row(
                "SELECT id, given_name, last_name FROM people WHERE id = ?1;",
                [id],
                parse_person_row,
            )
            .optional()?;
        Ok(person)
    }

    fn list_meetings(&self, period: &Period) -> RepoResult<Vec<Meeting>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEETING_SELECT_SQL}
             WHERE m.date BETWEEN ?1 AND ?2
             ORDER BY m.date ASC;"
        ))?;
        let meetings = stmt
            .query_map(params![period.start(), period.end()], parse_meeting_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meetings)
    }

    fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT
                r.id AS id,
                r.task_id AS task_id,
                r.descr AS descr,
                r.order_number AS order_number
             FROM roles r
             JOIN tasks t ON t.id = r.task_id
             {ROLE_ORDER_SQL};"
        ))?;
        let roles = stmt
            .query_map([], parse_role_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(roles)
    }

    fn list_tasks_with_roles(&self) -> RepoResult<Vec<TaskWithRoles>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, descr, order_number
             FROM tasks t
             ORDER BY t.order_number IS NULL, t.order_number ASC, t.id ASC;",
        )?;
        let mut grouped = stmt
            .query_map([], |row| {
                Ok(TaskWithRoles {
                    task: Task {
                        id: row.get("id")?,
                        descr: row.get("descr")?,
                        order_number: row.get("order_number")?,
                    },
                    roles: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for role in self.list_roles()? {
            if let Some(entry) = grouped.iter_mut().find(|entry| entry.task.id == role.task_id) {
                entry.roles.push(role);
            }
        }
        Ok(grouped)
    }

    fn is_eligible(&self, person_id: PersonId, role_id: RoleId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM person_roles WHERE person_id = ?1 AND role_id = ?2
            );",
            params![person_id, role_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn eligible_people(&self, role_id: RoleId) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id AS id, p.given_name AS given_name, p.last_name AS last_name
             FROM people p
             JOIN person_roles pr ON pr.person_id = p.id
             WHERE pr.role_id = ?1
             ORDER BY p.last_name ASC, p.given_name ASC, p.id ASC;",
        )?;
        let people = stmt
            .query_map([role_id], parse_person_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(people)
    }
}

pub(crate) fn parse_person_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get("id")?,
        given_name: row.get("given_name")?,
        last_name: row.get("last_name")?,
    })
}

fn parse_role_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        descr: row.get("descr")?,
        order_number: row.get("order_number")?,
    })
}

fn parse_meeting_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    let tag = match row.get::<_, Option<i64>>("tag_id")? {
        Some(id) => Some(Tag {
            id,
            descr: row.get("tag_descr")?,
        }),
        None => None,
    };
    Ok(Meeting {
        id: row.get("id")?,
        date: row.get("date")?,
        tag,
    })
}
