#![allow(dead_code)]

use chrono::NaiveDate;
use roster_core::db::open_db_in_memory;
use roster_core::{MeetingId, PersonId, RoleId};
use rusqlite::{params, Connection};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn fresh_db() -> Connection {
    open_db_in_memory().unwrap()
}

pub fn add_person(conn: &Connection, given: &str, last: &str) -> PersonId {
    conn.execute(
        "INSERT INTO people (given_name, last_name) VALUES (?1, ?2);",
        params![given, last],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn add_task(conn: &Connection, descr: &str, order: i64) -> i64 {
    conn.execute(
        "INSERT INTO tasks (descr, order_number) VALUES (?1, ?2);",
        params![descr, order],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn add_role(conn: &Connection, task_id: i64, descr: &str, order: i64) -> RoleId {
    conn.execute(
        "INSERT INTO roles (task_id, descr, order_number) VALUES (?1, ?2, ?3);",
        params![task_id, descr, order],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn add_meeting(conn: &Connection, date: NaiveDate) -> MeetingId {
    conn.execute("INSERT INTO meetings (date) VALUES (?1);", params![date])
        .unwrap();
    conn.last_insert_rowid()
}

pub fn add_tagged_meeting(conn: &Connection, date: NaiveDate, tag: &str) -> MeetingId {
    conn.execute("INSERT INTO tags (descr) VALUES (?1);", params![tag])
        .unwrap();
    let tag_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO meetings (date, tag_id) VALUES (?1, ?2);",
        params![date, tag_id],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn make_eligible(conn: &Connection, person_id: PersonId, role_id: RoleId) {
    conn.execute(
        "INSERT INTO person_roles (person_id, role_id) VALUES (?1, ?2);",
        params![person_id, role_id],
    )
    .unwrap();
}

pub fn add_absence(conn: &Connection, person_id: PersonId, meeting_id: MeetingId) {
    conn.execute(
        "INSERT INTO person_absences (person_id, meeting_id) VALUES (?1, ?2);",
        params![person_id, meeting_id],
    )
    .unwrap();
}

/// `weekday` uses 0 = Sunday.
pub fn add_recurring_absence(conn: &Connection, person_id: PersonId, weekday: u32) {
    conn.execute(
        "INSERT INTO person_recurring_absences (person_id, weekday) VALUES (?1, ?2);",
        params![person_id, weekday],
    )
    .unwrap();
}

pub fn add_assignment(
    conn: &Connection,
    meeting_id: MeetingId,
    role_id: Option<RoleId>,
    person_id: Option<PersonId>,
) -> i64 {
    conn.execute(
        "INSERT INTO assignments (meeting_id, role_id, person_id) VALUES (?1, ?2, ?3);",
        params![meeting_id, role_id, person_id],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn count_assignments(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM assignments;", [], |row| row.get(0))
        .unwrap()
}

pub fn person_at(conn: &Connection, meeting_id: MeetingId, role_id: RoleId) -> Option<PersonId> {
    conn.query_row(
        "SELECT person_id FROM assignments WHERE meeting_id = ?1 AND role_id = ?2;",
        params![meeting_id, role_id],
        |row| row.get(0),
    )
    .unwrap()
}

/// One task "Service" with a single "Reader" role.
pub fn single_role(conn: &Connection) -> RoleId {
    let task = add_task(conn, "Service", 1);
    add_role(conn, task, "Reader", 1)
}
