use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// One scheduled announcement. Immutable after creation except for the
/// single `warned` flip performed by the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Job {
    pub(crate) name: String,
    pub(crate) announce_channel: u64,
    pub(crate) input_channel: u64,
    pub(crate) author: u64,
    pub(crate) substitutions: Option<HashMap<String, String>>,
    #[serde(default)]
    pub(crate) warned: bool,
}

/// Pending jobs bucketed by their UTC UNIX fire timestamp.
pub(crate) type JobMap = BTreeMap<i64, Vec<Job>>;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("couldn't serialize job map: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("couldn't write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Whole-snapshot JSON persistence for the job map. The data volume is a
/// handful of pending announcements, so every mutation rewrites the full
/// document rather than patching it incrementally.
#[derive(Debug)]
pub(crate) struct JobStore {
    path: PathBuf,
}

impl JobStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing file is an empty store, a corrupt file is logged and
    /// treated as empty. Startup must never fail here.
    pub(crate) fn load(&self) -> JobMap {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return JobMap::new(),
            Err(err) => {
                warn!("couldn't read {}: {}, starting empty", self.path.display(), err);
                return JobMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(jobs) => jobs,
            Err(err) => {
                warn!(
                    "couldn't parse {}: {}, starting empty",
                    self.path.display(),
                    err
                );
                JobMap::new()
            }
        }
    }

    /// Write to a sibling temp file, then rename over the real one. A crash
    /// mid-write never leaves a torn document behind.
    pub(crate) fn save(&self, jobs: &JobMap) -> Result<(), StoreError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_string_pretty(jobs)?).map_err(|source| {
            StoreError::Write {
                path: tmp.clone(),
                source,
            }
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
