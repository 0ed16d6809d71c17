//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//! - Decode stored rows explicitly at this boundary, so services never see
//!   raw storage encodings.
//!
//! # Invariants
//! - Repositories borrow a caller-provided connection (plain, transaction or
//!   savepoint) and never open their own.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use rusqlite::{ffi, ErrorCode};
use thiserror::Error;

pub mod artifact_repo;
pub mod assignment_repo;
pub mod directory_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for roster persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("invalid persisted roster data: {0}")]
    InvalidData(String),
}

impl RepoError {
    /// True when a unique index rejected the write, e.g. another writer
    /// filled the same slot first. Trigger and foreign key aborts do not count.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
                if err.code == ErrorCode::ConstraintViolation
                    && matches!(
                        err.extended_code,
                        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    )
        )
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_from_db(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_db(value: bool) -> i64 {
    i64::from(value)
}
