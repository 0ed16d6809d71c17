//! Error taxonomy shared by roster use-case services.

use crate::model::assignment::AssignmentId;
use crate::model::period::PeriodError;
use crate::model::roster::{PersonId, RoleId};
use crate::render::html::RenderError;
use crate::repo::RepoError;
use std::path::PathBuf;
use thiserror::Error;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug, Error)]
pub enum RosterError {
    /// Malformed input; nothing was mutated.
    #[error("invalid period: {0}")]
    InvalidPeriod(#[from] PeriodError),
    #[error("validation failed: {0}")]
    Validation(String),
    /// Person may not take this assignment; prior state is preserved.
    #[error("person {person_id} is not allowed for assignment {assignment_id}")]
    NotAllowed {
        assignment_id: AssignmentId,
        person_id: PersonId,
        role_id: Option<RoleId>,
    },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    /// Store failure in a single-entity operation.
    #[error("persistence failure: {0}")]
    Persistence(RepoError),
    #[error("artifact file error at `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("roster rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl From<RepoError> for RosterError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Persistence(other),
        }
    }
}

impl From<rusqlite::Error> for RosterError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(value.into())
    }
}
