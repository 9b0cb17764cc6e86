use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{debug, info};

use crate::{config::AppConfig, error::StoreError, models::Record};

/// What [`CatalogSync::prepare`] had to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareOutcome {
    /// The committed file was missing and has been created as an empty list.
    pub created_committed: bool,
    /// The working copy was missing or stale and has been re-seeded.
    pub refreshed_working: bool,
}

/// Keeps the committed catalog file and its editable working copy in step.
///
/// The committed file is the long-lived source of truth and only changes
/// on [`CatalogSync::commit`]. The working copy receives every store
/// mutation and is refreshed from the committed file whenever the latter
/// is newer.
#[derive(Debug, Clone)]
pub struct CatalogSync {
    committed_path: PathBuf,
    working_path: PathBuf,
}

impl CatalogSync {
    /// Create a synchroniser over the two given files.
    pub fn new(committed_path: impl Into<PathBuf>, working_path: impl Into<PathBuf>) -> Self {
        Self {
            committed_path: committed_path.into(),
            working_path: working_path.into(),
        }
    }

    /// Create a synchroniser from the configured file locations.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.committed_path, &config.working_path)
    }

    /// Path of the committed file.
    pub fn committed_path(&self) -> &Path {
        &self.committed_path
    }

    /// Path of the working copy.
    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    /// Ensure the committed file exists and the working copy is current.
    ///
    /// Edits made directly to the committed file therefore flow into the
    /// working copy; the reverse only happens through [`Self::commit`].
    pub fn prepare(&self) -> Result<PrepareOutcome, StoreError> {
        let mut outcome = PrepareOutcome::default();

        if !self.committed_path.exists() {
            info!("creating empty catalog {}", self.committed_path.display());
            write_records(&self.committed_path, &[])?;
            outcome.created_committed = true;
        }

        if self.working_is_stale()? {
            self.copy_committed_to_working()?;
            outcome.refreshed_working = true;
        }

        Ok(outcome)
    }

    /// Read the working copy.
    pub fn read_working(&self) -> Result<Vec<Record>, StoreError> {
        read_records(&self.working_path)
    }

    /// Replace the working copy with `records`.
    pub fn write_working(&self, records: &[Record]) -> Result<(), StoreError> {
        write_records(&self.working_path, records)
    }

    /// Overwrite the working copy with the committed file, discarding edits.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.copy_committed_to_working()
    }

    /// Overwrite the committed file with `records`. The working copy is untouched.
    pub fn commit(&self, records: &[Record]) -> Result<(), StoreError> {
        write_records(&self.committed_path, records)
    }

    fn working_is_stale(&self) -> Result<bool, StoreError> {
        if !self.working_path.exists() {
            return Ok(true);
        }
        let committed = modified_at(&self.committed_path)?;
        let working = modified_at(&self.working_path)?;
        Ok(committed > working)
    }

    fn copy_committed_to_working(&self) -> Result<(), StoreError> {
        ensure_parent(&self.working_path)?;
        fs::copy(&self.committed_path, &self.working_path)
            .map_err(|err| StoreError::io("copy", &self.committed_path, err))?;
        info!(
            "copied {} to {}",
            self.committed_path.display(),
            self.working_path.display()
        );
        Ok(())
    }
}

fn modified_at(path: &Path) -> Result<SystemTime, StoreError> {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|err| StoreError::io("inspect", path, err))
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|err| StoreError::io("create directory", parent, err)),
        _ => Ok(()),
    }
}

/// Parse a JSON array of records from `path`.
pub(crate) fn read_records(path: &Path) -> Result<Vec<Record>, StoreError> {
    let content = fs::read_to_string(path).map_err(|err| StoreError::io("read", path, err))?;
    let records: Vec<Record> =
        serde_json::from_str(&content).map_err(|err| StoreError::json("parse", path, err))?;
    debug!(count = records.len(), "read {}", path.display());
    Ok(records)
}

/// Serialise `records` as indented JSON and replace the whole file.
pub(crate) fn write_records(path: &Path, records: &[Record]) -> Result<(), StoreError> {
    ensure_parent(path)?;
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    records
        .serialize(&mut serializer)
        .map_err(|err| StoreError::json("serialize", path, err))?;
    buffer.write_all(b"\n").map_err(|err| StoreError::io("serialize", path, err))?;
    fs::write(path, buffer).map_err(|err| StoreError::io("write", path, err))?;
    debug!(count = records.len(), "wrote {}", path.display());
    Ok(())
}
