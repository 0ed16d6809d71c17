//! Roster export rendering.
//!
//! # Responsibility
//! - Group plan rows into a per-task table (`RosterTable`).
//! - Turn that table into a standalone document (`html`).
//!
//! # Invariants
//! - Cells are looked up by role id, never by object identity.
//! - A tagged meeting renders as one spanning cell with the tag text in
//!   every task section.

pub mod html;

use crate::model::assignment::AssignmentDetail;
use crate::model::period::Period;
use crate::model::roster::{MeetingId, Role, RoleId, Task, TaskWithRoles};
use chrono::{Datelike, Month, NaiveDate, Weekday};
use std::collections::HashMap;

/// Export table: one section per task that has at least one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterTable {
    pub sections: Vec<TaskSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSection {
    pub task: Task,
    /// Column headers, in display order.
    pub roles: Vec<Role>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub date: NaiveDate,
    pub cells: RowCells,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowCells {
    /// Special event; the tag text spans every role column.
    Tagged(String),
    /// One entry per role column; `None` is an open slot.
    Roles(Vec<Option<String>>),
}

struct MeetingRow {
    meeting_id: MeetingId,
    date: NaiveDate,
    tag: Option<String>,
    people: HashMap<RoleId, String>,
}

impl RosterTable {
    /// Groups `assignments` (any order) under `tasks` (display order).
    ///
    /// Rows are the distinct meetings that own at least one assignment,
    /// ordered by date; every task section lists all of them.
    pub fn build(tasks: &[TaskWithRoles], assignments: &[AssignmentDetail]) -> Self {
        let mut meetings: Vec<MeetingRow> = Vec::new();
        for assignment in assignments {
            let index = match meetings
                .iter()
                .position(|row| row.meeting_id == assignment.meeting.id)
            {
                Some(index) => index,
                None => {
                    meetings.push(MeetingRow {
                        meeting_id: assignment.meeting.id,
                        date: assignment.meeting.date,
                        tag: assignment.meeting.tag.as_ref().map(|tag| tag.descr.clone()),
                        people: HashMap::new(),
                    });
                    meetings.len() - 1
                }
            };
            if let (Some(role), Some(person)) = (&assignment.role, &assignment.person) {
                meetings[index]
                    .people
                    .insert(role.id, person.display_name());
            }
        }
        meetings.sort_by_key(|row| (row.date, row.meeting_id));

        let sections = tasks
            .iter()
            .filter(|entry| !entry.roles.is_empty())
            .map(|entry| TaskSection {
                task: entry.task.clone(),
                roles: entry.roles.clone(),
                rows: meetings
                    .iter()
                    .map(|row| TableRow {
                        date: row.date,
                        cells: match &row.tag {
                            Some(tag) => RowCells::Tagged(tag.clone()),
                            None => RowCells::Roles(
                                entry
                                    .roles
                                    .iter()
                                    .map(|role| row.people.get(&role.id).cloned())
                                    .collect(),
                            ),
                        },
                    })
                    .collect(),
            })
            .collect();

        Self { sections }
    }
}

/// Document title for a range: "March 2024", "March-April 2024" or
/// "December 2024 - January 2025".
pub fn headline(period: &Period) -> String {
    let (start, end) = (period.start(), period.end());
    if start.year() == end.year() && start.month() == end.month() {
        format!("{} {}", month_name(start), start.year())
    } else if start.year() == end.year() {
        format!("{}-{} {}", month_name(start), month_name(end), start.year())
    } else {
        format!(
            "{} {} - {} {}",
            month_name(start),
            start.year(),
            month_name(end),
            end.year()
        )
    }
}

pub fn month_name(date: NaiveDate) -> &'static str {
    u8::try_from(date.month())
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .map_or("", |month| month.name())
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
