//! Artifact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store one export row per exact `(start_date, end_date)` range.
//! - Flip the dirty flag for ranges touched by plan mutations.
//!
//! # Invariants
//! - Regeneration updates the existing row in place; a range never gets a
//!   second row.
//! - Only `upsert_generated` clears `data_changed`.

use crate::model::artifact::{Artifact, ArtifactId};
use crate::model::period::Period;
use crate::repo::{bool_from_db, bool_to_db, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};

const ARTIFACT_SELECT_SQL: &str = "SELECT
    id,
    start_date,
    end_date,
    name,
    file_path,
    data_changed,
    revision,
    generated_at
FROM artifacts";

/// Repository interface for cached exports.
pub trait ArtifactRepository {
    /// Exact range lookup.
    fn find_by_period(&self, period: &Period) -> RepoResult<Option<Artifact>>;
    /// Inserts or refreshes the row for `period` and clears its dirty flag.
    fn upsert_generated(
        &self,
        period: &Period,
        name: &str,
        file_path: &Path,
        revision: i64,
    ) -> RepoResult<Artifact>;
    /// Marks every artifact whose range overlaps `period`; returns the count.
    fn mark_dirty_intersecting(&self, period: &Period) -> RepoResult<usize>;
    /// Marks every artifact whose range contains `date`; returns the count.
    fn mark_dirty_containing(&self, date: NaiveDate) -> RepoResult<usize>;
    fn list(&self) -> RepoResult<Vec<Artifact>>;
    /// Deletes and returns artifacts whose range ended before `cutoff`.
    fn delete_ended_before(&self, cutoff: NaiveDate) -> RepoResult<Vec<Artifact>>;
}

/// SQLite-backed artifact repository.
pub struct SqliteArtifactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArtifactRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, bind: impl rusqlite::Params) -> RepoResult<Vec<Artifact>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut artifacts = Vec::new();
        while let Some(row) = rows.next()? {
            artifacts.push(parse_artifact_row(row)?);
        }
        Ok(artifacts)
    }
}

impl ArtifactRepository for SqliteArtifactRepository<'_> {
    fn find_by_period(&self, period: &Period) -> RepoResult<Option<Artifact>> {
        let mut found = self.query(
            &format!("{ARTIFACT_SELECT_SQL} WHERE start_date = ?1 AND end_date = ?2;"),
            params![period.start(), period.end()],
        )?;
        Ok(found.pop())
    }

    fn upsert_generated(
        &self,
        period: &Period,
        name: &str,
        file_path: &Path,
        revision: i64,
    ) -> RepoResult<Artifact> {
        let path_text = file_path.to_str().ok_or_else(|| {
            RepoError::InvalidData(format!(
                "artifact path `{}` is not valid UTF-8",
                file_path.display()
            ))
        })?;

        self.conn.execute(
            "INSERT INTO artifacts (start_date, end_date, name, file_path, data_changed, revision)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)
             ON CONFLICT (start_date, end_date) DO UPDATE SET
                name = excluded.name,
                file_path = excluded.file_path,
                data_changed = 0,
                revision = excluded.revision,
                generated_at = (strftime('%s', 'now') * 1000);",
            params![period.start(), period.end(), name, path_text, revision],
        )?;

        self.find_by_period(period)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "artifact for {}..{} vanished after upsert",
                period.start(),
                period.end()
            ))
        })
    }

    fn mark_dirty_intersecting(&self, period: &Period) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE artifacts
             SET data_changed = ?3
             WHERE start_date <= ?2
               AND end_date >= ?1;",
            params![period.start(), period.end(), bool_to_db(true)],
        )?;
        Ok(changed)
    }

    fn mark_dirty_containing(&self, date: NaiveDate) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE artifacts
             SET data_changed = ?2
             WHERE ?1 BETWEEN start_date AND end_date;",
            params![date, bool_to_db(true)],
        )?;
        Ok(changed)
    }

    fn list(&self) -> RepoResult<Vec<Artifact>> {
        self.query(
            &format!("{ARTIFACT_SELECT_SQL} ORDER BY start_date ASC, end_date ASC;"),
            params![],
        )
    }

    fn delete_ended_before(&self, cutoff: NaiveDate) -> RepoResult<Vec<Artifact>> {
        let expired = self.query(
            &format!("{ARTIFACT_SELECT_SQL} WHERE end_date < ?1 ORDER BY start_date ASC;"),
            [cutoff],
        )?;
        for artifact in &expired {
            self.conn
                .execute("DELETE FROM artifacts WHERE id = ?1;", [artifact.id])?;
        }
        Ok(expired)
    }
}

fn parse_artifact_row(row: &Row<'_>) -> RepoResult<Artifact> {
    let id: ArtifactId = row.get("id")?;
    let start: NaiveDate = row.get("start_date")?;
    let end: NaiveDate = row.get("end_date")?;
    let period = Period::new(start, end)
        .map_err(|err| RepoError::InvalidData(format!("artifact {id}: {err}")))?;
    let file_path: String = row.get("file_path")?;

    Ok(Artifact {
        id,
        period,
        name: row.get("name")?,
        file_path: PathBuf::from(file_path),
        data_changed: bool_from_db(row.get("data_changed")?, "artifacts.data_changed")?,
        revision: row.get("revision")?,
        generated_at: row.get("generated_at")?,
    })
}
