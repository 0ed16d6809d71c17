//! People, duties and meetings as seen by the roster engine.
//!
//! These rows are owned by an external CRUD layer; the engine only reads them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub type PersonId = i64;
pub type TaskId = i64;
pub type RoleId = i64;
pub type MeetingId = i64;
pub type TagId = i64;

/// Someone who can be put on duty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub given_name: String,
    pub last_name: String,
}

impl Person {
    /// Name as printed on the roster.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.given_name, self.last_name)
    }
}

/// Category grouping several roles; one table section per task on export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub descr: String,
    /// Display order; `None` sorts last.
    pub order_number: Option<i64>,
}

/// A named duty ("task detail") that receives one person per meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Parent task, immutable once the role exists.
    pub task_id: TaskId,
    pub descr: String,
    /// Display order within the parent task; `None` sorts last.
    pub order_number: Option<i64>,
}

/// Label that turns a meeting into a special event without duties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub descr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<Tag>,
}

impl Meeting {
    /// Tagged meetings are exempt from normal role assignment.
    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }

    /// Weekday index as stored for recurring absences (Sunday = 0).
    pub fn weekday_index(&self) -> u32 {
        weekday_index(self.date)
    }
}

/// A task together with its roles in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskWithRoles {
    pub task: Task,
    pub roles: Vec<Role>,
}

/// Maps a date to the recurring-absence weekday index (Sunday = 0 .. Saturday = 6).
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}
