//! Cached roster export metadata.

use crate::model::period::Period;
use serde::Serialize;
use std::path::PathBuf;

pub type ArtifactId = i64;

/// One rendered export for an exact date range.
///
/// `data_changed` is the dirty flag: set by plan mutations, cleared only by
/// the artifact cache after it regenerated the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub period: Period,
    pub name: String,
    pub file_path: PathBuf,
    pub data_changed: bool,
    /// Incremented on every regeneration; part of the file name.
    pub revision: i64,
    /// Epoch ms of the last regeneration.
    pub generated_at: i64,
}
