//! Invalidation-aware cache of rendered roster exports.
//!
//! # Responsibility
//! - Return the stored export for an exact range when it is still fresh.
//! - Regenerate, persist and clear the dirty flag otherwise.
//! - Expose artifact identity (range, path) and the age-based sweep used by
//!   the scheduled retention job.
//!
//! # Invariants
//! - Reading plan rows, writing the file and clearing the dirty flag happen in
//!   one IMMEDIATE transaction, so a concurrent dirty mark is never lost.
//! - Each regeneration bumps `revision`; the file name embeds it, so the
//!   returned path changes whenever the document was rebuilt.
//! - The cache is the only writer of file paths and the only place that
//!   clears `data_changed`.

use crate::error::{RosterError, RosterResult};
use crate::model::artifact::Artifact;
use crate::model::period::Period;
use crate::render::html::render_document;
use crate::render::{headline, RosterTable};
use crate::repo::artifact_repo::{ArtifactRepository, SqliteArtifactRepository};
use crate::repo::assignment_repo::{AssignmentRepository, SqliteAssignmentRepository};
use crate::repo::directory_repo::{RosterDirectory, SqliteRosterDirectory};
use chrono::{Local, Months, NaiveDate};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

const FILE_PREFIX: &str = "roster";
const FILE_EXTENSION: &str = "html";

/// Artifact cache bound to a caller-owned connection and an output directory.
pub struct ArtifactCache<'conn> {
    conn: &'conn Connection,
    output_dir: PathBuf,
}

impl<'conn> ArtifactCache<'conn> {
    pub fn new(conn: &'conn Connection, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            conn,
            output_dir: output_dir.into(),
        }
    }

    /// Returns the export file for exactly `period`, rebuilding it when it is
    /// missing, dirty, or its file has disappeared.
    pub fn get_or_create(&self, period: &Period) -> RosterResult<PathBuf> {
        let started_at = Instant::now();
        let result = self.get_or_regenerate(period);
        match &result {
            Ok((path, regenerated)) => info!(
                "event=artifact_get module=artifact status=ok start={} end={} regenerated={} duration_ms={} path={}",
                period.start(),
                period.end(),
                regenerated,
                started_at.elapsed().as_millis(),
                path.display()
            ),
            Err(err) => error!(
                "event=artifact_get module=artifact status=error start={} end={} duration_ms={} error={}",
                period.start(),
                period.end(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result.map(|(path, _)| path)
    }

    /// All cached artifacts ordered by range.
    pub fn list_artifacts(&self) -> RosterResult<Vec<Artifact>> {
        Ok(SqliteArtifactRepository::new(self.conn).list()?)
    }

    /// Deletes artifacts whose range ended more than `retention_months`
    /// before `today`, together with their files. Missing files are ignored.
    pub fn remove_expired(
        &self,
        today: NaiveDate,
        retention_months: u32,
    ) -> RosterResult<Vec<Artifact>> {
        let cutoff = today
            .checked_sub_months(Months::new(retention_months))
            .ok_or_else(|| {
                RosterError::Validation(format!(
                    "retention of {retention_months} months reaches before the calendar start"
                ))
            })?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed = SqliteArtifactRepository::new(&tx).delete_ended_before(cutoff)?;
        tx.commit()?;

        for artifact in &removed {
            remove_file_if_present(&artifact.file_path);
        }
        info!(
            "event=artifact_sweep module=artifact status=ok cutoff={cutoff} removed={}",
            removed.len()
        );
        Ok(removed)
    }

    fn get_or_regenerate(&self, period: &Period) -> RosterResult<(PathBuf, bool)> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let artifacts = SqliteArtifactRepository::new(&tx);

        let existing = artifacts.find_by_period(period)?;
        if let Some(artifact) = &existing {
            if !artifact.data_changed && artifact.file_path.is_file() {
                return Ok((artifact.file_path.clone(), false));
            }
        }

        let tasks = SqliteRosterDirectory::new(&tx).list_tasks_with_roles()?;
        let rows = SqliteAssignmentRepository::new(&tx).list_details(period)?;
        let table = RosterTable::build(&tasks, &rows);
        let document = render_document(&headline(period), &table, Local::now().date_naive())?;

        let revision = existing.as_ref().map_or(1, |artifact| artifact.revision + 1);
        let name = artifact_file_name(period, revision);
        let path = self.output_dir.join(&name);
        fs::create_dir_all(&self.output_dir).map_err(|source| RosterError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        fs::write(&path, document).map_err(|source| RosterError::Io {
            path: path.clone(),
            source,
        })?;

        let stored = match artifacts.upsert_generated(period, &name, &path, revision) {
            Ok(stored) => stored,
            Err(err) => {
                remove_file_if_present(&path);
                return Err(err.into());
            }
        };
        if let Err(err) = tx.commit() {
            remove_file_if_present(&path);
            return Err(err.into());
        }

        if let Some(previous) = existing {
            if previous.file_path != stored.file_path {
                remove_file_if_present(&previous.file_path);
            }
        }
        Ok((stored.file_path, true))
    }
}

/// `roster-<start>_<end>-r<revision>.html`
pub fn artifact_file_name(period: &Period, revision: i64) -> String {
    format!(
        "{FILE_PREFIX}-{}_{}-r{revision}.{FILE_EXTENSION}",
        period.start(),
        period.end()
    )
}

fn remove_file_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(
            "event=artifact_file_remove module=artifact status=error path={} error={}",
            path.display(),
            err
        ),
    }
}
