// SPDX-License-Identifier: MIT OR Apache-2.0
//! Key timing snapshots.
//!
//! Two record formats back the copy/paste tools:
//! - [`KeyTimeRecord`]: the merged key times of a selection, with the
//!   playback range they were copied from.
//! - [`KeyTimingSnapshot`]: key times per object and attribute.
//!
//! Both are stored as pretty-printed JSON in a user-scoped directory.

use crate::key_times::normalize_times;
use crate::range::TimeRange;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the pose-to-pose record
pub const POSE_RECORD_FILE: &str = "esn_key_times.json";

/// File name of the per-channel record
pub const CHANNEL_RECORD_FILE: &str = "maya_key_timing.json";

/// Folder under the user's home directory holding the records
pub const SNAPSHOT_DIR_NAME: &str = "animTools";

/// Snapshot storage errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No record at the expected location
    #[error("Snapshot not found: {0}")]
    NotFound(PathBuf),

    /// The record could not be parsed or is incomplete
    #[error("Snapshot corrupt: {0}")]
    Corrupt(String),

    /// Any other filesystem failure
    #[error("Snapshot I/O error at {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Merged key times of a selection (pose-to-pose copy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTimeRecord {
    /// Copied key times, sorted and unique
    pub key_times: Vec<f64>,
    /// Playback range at copy time
    pub playback_range: TimeRange,
    /// Objects the times were copied from
    #[serde(default)]
    pub source_objects: Vec<String>,
    /// Whether any key times were found
    #[serde(default)]
    pub has_keys: bool,
}

impl KeyTimeRecord {
    /// Create a normalized record
    pub fn new(
        key_times: impl IntoIterator<Item = f64>,
        playback_range: TimeRange,
        source_objects: Vec<String>,
    ) -> Self {
        let key_times = normalize_times(key_times);
        Self {
            has_keys: !key_times.is_empty(),
            key_times,
            playback_range,
            source_objects,
        }
    }

    /// Sort and dedup the key times and recompute `has_keys`
    pub fn normalized(self) -> Self {
        Self::new(self.key_times, self.playback_range, self.source_objects)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Corrupt(e.to_string()))
    }

    /// Parse a record, normalizing it
    pub fn from_json(json: &str) -> Result<Self> {
        let record: KeyTimeRecord =
            serde_json::from_str(json).map_err(|e| SnapshotError::Corrupt(e.to_string()))?;
        Ok(record.normalized())
    }
}

/// Key times per object and attribute (channel copy).
///
/// Objects keep their copy order; the first one is the reference used for
/// targets that were not part of the copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyTimingSnapshot {
    objects: IndexMap<String, IndexMap<String, Vec<f64>>>,
}

impl KeyTimingSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the key times of one attribute
    pub fn insert(&mut self, object: impl Into<String>, attribute: impl Into<String>, times: impl IntoIterator<Item = f64>) {
        self.objects
            .entry(object.into())
            .or_default()
            .insert(attribute.into(), normalize_times(times));
    }

    /// Timing recorded for an object
    pub fn object(&self, object: &str) -> Option<&IndexMap<String, Vec<f64>>> {
        self.objects.get(object)
    }

    /// The first recorded object
    pub fn reference(&self) -> Option<(&str, &IndexMap<String, Vec<f64>>)> {
        self.objects.first().map(|(name, attrs)| (name.as_str(), attrs))
    }

    /// Timing for an object, falling back to the reference object
    pub fn timing_for(&self, object: &str) -> Option<&IndexMap<String, Vec<f64>>> {
        self.object(object).or_else(|| self.reference().map(|(_, attrs)| attrs))
    }

    /// Recorded object names in copy order
    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Number of recorded objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Sort and dedup every time list
    pub fn normalized(mut self) -> Self {
        for attrs in self.objects.values_mut() {
            for times in attrs.values_mut() {
                *times = normalize_times(times.iter().copied());
            }
        }
        self
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Corrupt(e.to_string()))
    }

    /// Parse a snapshot, normalizing it
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: KeyTimingSnapshot =
            serde_json::from_str(json).map_err(|e| SnapshotError::Corrupt(e.to_string()))?;
        Ok(snapshot.normalized())
    }
}

/// Directory holding the snapshot records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    dir: PathBuf,
    pose_file: String,
    channel_file: String,
}

impl SnapshotStore {
    /// Store records in `dir` under the default file names
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pose_file: POSE_RECORD_FILE.to_string(),
            channel_file: CHANNEL_RECORD_FILE.to_string(),
        }
    }

    /// Override the record file names
    pub fn with_file_names(mut self, pose_file: impl Into<String>, channel_file: impl Into<String>) -> Self {
        self.pose_file = pose_file.into();
        self.channel_file = channel_file.into();
        self
    }

    /// The user's `animTools` folder
    pub fn default_dir() -> PathBuf {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SNAPSHOT_DIR_NAME)
    }

    /// Storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the pose-to-pose record
    pub fn pose_path(&self) -> PathBuf {
        self.dir.join(&self.pose_file)
    }

    /// Location of the per-channel record
    pub fn channel_path(&self) -> PathBuf {
        self.dir.join(&self.channel_file)
    }

    /// Write the pose-to-pose record
    pub fn save_pose(&self, record: &KeyTimeRecord) -> Result<PathBuf> {
        let path = self.pose_path();
        self.write(&path, &record.to_json()?)?;
        Ok(path)
    }

    /// Read the pose-to-pose record
    pub fn load_pose(&self) -> Result<KeyTimeRecord> {
        let path = self.pose_path();
        let record: KeyTimeRecord = read_json(&path)?;
        Ok(record.normalized())
    }

    /// Write the per-channel record
    pub fn save_channels(&self, snapshot: &KeyTimingSnapshot) -> Result<PathBuf> {
        let path = self.channel_path();
        self.write(&path, &snapshot.to_json()?)?;
        Ok(path)
    }

    /// Read the per-channel record
    pub fn load_channels(&self) -> Result<KeyTimingSnapshot> {
        let path = self.channel_path();
        let snapshot: KeyTimingSnapshot = read_json(&path)?;
        Ok(snapshot.normalized())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::Io {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(path, contents).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Wrote snapshot {}", path.display());
        Ok(())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SnapshotError::NotFound(path.to_path_buf())
        } else {
            SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    serde_json::from_str(&content)
        .map_err(|e| SnapshotError::Corrupt(format!("{}: {e}", path.display())))
}
