use crate::types::{DigestError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// File-backed record of article ids that have already been notified.
///
/// The backing file is a JSON object mapping id to the unix time (seconds)
/// it was processed. Entries are only ever added. Writes go to a sibling
/// temp file which then replaces the original, so a crash mid-write leaves
/// the previous contents intact.
///
/// Dropping a store with unflushed records performs a final flush.
pub struct ProcessedStore {
    path: PathBuf,
    entries: BTreeMap<String, i64>,
    dirty: bool,
}

/// Ids set aside for a batch, committed only after its notification succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "staged ids are discarded unless committed"]
pub struct StagedCommit {
    ids: Vec<String>,
}

impl StagedCommit {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl ProcessedStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| persistence(&path, e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No processed news file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(persistence(&path, e)),
        };

        info!("Loaded {} processed ids from {}", entries.len(), path.display());
        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn processed_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.entries
            .get(id)
            .and_then(|ts| DateTime::<Utc>::from_timestamp(*ts, 0))
    }

    /// Marks `id` as processed. An existing entry keeps its original timestamp.
    /// Returns whether the id was new.
    pub fn record(&mut self, id: impl Into<String>, timestamp: DateTime<Utc>) -> bool {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return false;
        }
        debug!("Recording processed id: {}", id);
        self.entries.insert(id, timestamp.timestamp());
        self.dirty = true;
        true
    }

    /// First phase: collects the ids not yet present. Does not touch the store.
    pub fn stage<I, S>(&self, ids: I) -> StagedCommit
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut staged: Vec<String> = Vec::new();
        for id in ids {
            let id = id.as_ref();
            if !self.contains(id) && !staged.iter().any(|s| s == id) {
                staged.push(id.to_string());
            }
        }
        StagedCommit { ids: staged }
    }

    /// Second phase: records every staged id. Returns how many were new.
    pub fn commit(&mut self, staged: StagedCommit, timestamp: DateTime<Utc>) -> usize {
        staged
            .ids
            .into_iter()
            .filter(|id| self.record(id.clone(), timestamp))
            .count()
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persistence(&self.path, e))?;
        }

        let serialized = serde_json::to_string_pretty(&self.entries).map_err(|e| persistence(&self.path, e))?;

        let tmp_path = temp_path(&self.path);
        let write_tmp = || -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(serialized.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        };
        if let Err(e) = write_tmp() {
            let _ = fs::remove_file(&tmp_path);
            return Err(persistence(&self.path, e));
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| persistence(&self.path, e))?;

        self.dirty = false;
        debug!("Saved {} processed ids to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

impl Drop for ProcessedStore {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.flush() {
                error!("Failed to save processed news on exit: {}", e);
            }
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn persistence(path: &Path, e: impl std::fmt::Display) -> DigestError {
    DigestError::Persistence {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}
