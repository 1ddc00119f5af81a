//! Policy snapshot format and file persistence
//!
//! A snapshot is a flat, order-irrelevant list of `(state, action, value)`
//! entries plus the current ε. Floats round-trip exactly through JSON, so
//! a reloaded engine resumes learning bit-for-bit.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use helmsman_common::{Action, InternalState, PersistenceError};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::table::ValueTable;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// One `(state, action) → value` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(flatten)]
    pub state: InternalState,
    pub action: Action,
    pub value: f64,
}

/// Serialized policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub version: u32,
    pub epsilon: f64,
    #[serde(default)]
    pub updates: u64,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    pub entries: Vec<SnapshotEntry>,
}

impl PolicySnapshot {
    /// Capture a table; entries are sorted so identical tables serialize identically
    pub fn capture(table: &ValueTable, epsilon: f64, updates: u64) -> Self {
        let mut entries: Vec<SnapshotEntry> = table
            .iter()
            .flat_map(|(state, values)| {
                values.iter().map(move |(action, value)| SnapshotEntry {
                    state: state.clone(),
                    action,
                    value,
                })
            })
            .collect();
        entries.sort_by(|a, b| (&a.state, a.action).cmp(&(&b.state, b.action)));

        Self {
            version: SNAPSHOT_VERSION,
            epsilon,
            updates,
            saved_at: Some(Utc::now()),
            entries,
        }
    }

    /// Rebuild the table, rejecting anything that could not have been saved
    pub fn to_table(&self) -> Result<ValueTable, PersistenceError> {
        self.check()?;

        let mut table = ValueTable::new();
        for entry in &self.entries {
            table.entry_mut(entry.state.clone()).set(entry.action, entry.value);
        }
        Ok(table)
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if !(self.epsilon.is_finite() && (0.0..=1.0).contains(&self.epsilon)) {
            return Err(PersistenceError::Corrupt(format!(
                "epsilon {} outside [0, 1]",
                self.epsilon
            )));
        }
        if let Some(entry) = self.entries.iter().find(|e| !e.value.is_finite()) {
            return Err(PersistenceError::Corrupt(format!(
                "non-finite value for {} / {}",
                entry.state, entry.action
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check()?;
        Ok(snapshot)
    }

    /// Write via a uniquely named sibling temp file and rename, so readers
    /// never see a torn file and concurrent writers never share a temp file
    pub fn write_to(&self, path: &Path) -> Result<(), PersistenceError> {
        let json = self.to_json()?;

        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
                parent
            }
            None => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(parent).map_err(|source| io_error(parent, source))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| io_error(tmp.path(), source))?;
        tmp.persist(path)
            .map_err(|err| io_error(path, err.error))?;

        debug!(path = %path.display(), entries = self.entries.len(), "Policy snapshot written");
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, PersistenceError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(path.to_path_buf()))
            }
            Err(source) => return Err(io_error(path, source)),
        };
        Self::from_json(&json)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}
