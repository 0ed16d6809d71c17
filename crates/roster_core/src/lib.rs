//! Core domain logic for duty rostering.
//! This crate is the single source of truth for planning invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod render;
pub mod repo;
pub mod service;

pub use config::{ConfigError, RosterConfig};
pub use error::{RosterError, RosterResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::artifact::{Artifact, ArtifactId};
pub use model::assignment::{
    Assignment, AssignmentDetail, AssignmentId, PeopleAvailability, PlanOutcome, SlotReport,
    SlotStatus,
};
pub use model::period::{parse_date, FairnessWindow, Period, PeriodError};
pub use model::roster::{
    Meeting, MeetingId, Person, PersonId, Role, RoleId, Tag, TagId, Task, TaskId, TaskWithRoles,
};
pub use repo::{RepoError, RepoResult};
pub use service::artifact_cache::ArtifactCache;
pub use service::assignment_service::AssignmentService;
pub use service::plan_service::PlanService;
pub use service::resolver::{AvailabilityResolver, Candidate};
