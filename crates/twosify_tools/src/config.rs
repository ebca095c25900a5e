// SPDX-License-Identifier: MIT OR Apache-2.0
//! User configuration.
//!
//! Stored as RON next to the snapshot records. Every field has a default,
//! so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use twosify_timing::{SnapshotStore, CHANNEL_RECORD_FILE, POSE_RECORD_FILE};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "twosify.ron";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem error
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid RON
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Could not serialize
    #[error("Config serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Snapshot directory; the user's `animTools` folder when unset
    pub snapshot_dir: Option<PathBuf>,
    /// Pose-to-pose record file name
    pub pose_record_file: String,
    /// Per-channel record file name
    pub channel_record_file: String,
    /// Layer created by the stepped layer tool
    pub stepped_layer_name: String,
    /// Group holding ghost poses
    pub ghost_group: String,
    /// Material assigned to ghost poses
    pub ghost_material: String,
    /// Ghost opacity on a 0-10 scale
    pub ghost_opacity: f64,
    /// Group holding camera attach rigs
    pub follow_cam_group: String,
    /// Outliner color of the camera attach group
    pub follow_cam_color: [f64; 3],
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: None,
            pose_record_file: POSE_RECORD_FILE.to_string(),
            channel_record_file: CHANNEL_RECORD_FILE.to_string(),
            stepped_layer_name: "TWOS".to_string(),
            ghost_group: "GhostGrp".to_string(),
            ghost_material: "GhostMat".to_string(),
            ghost_opacity: 5.0,
            follow_cam_group: "FOLLOW_CAM_GRP".to_string(),
            follow_cam_color: [0.75, 0.5, 0.9],
        }
    }
}

impl ToolConfig {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&content)?)
    }

    /// Load `twosify.ron` from the default snapshot folder if it exists
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = SnapshotStore::default_dir().join(CONFIG_FILE_NAME);
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings as RON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Snapshot store described by these settings
    pub fn snapshot_store(&self) -> SnapshotStore {
        let dir = self.snapshot_dir.clone().unwrap_or_else(SnapshotStore::default_dir);
        SnapshotStore::new(dir).with_file_names(&self.pose_record_file, &self.channel_record_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ToolConfig::default();
        assert_eq!(config.ghost_opacity, 5.0);
        assert_eq!(config.pose_record_file, "esn_key_times.json");
        assert!(config.snapshot_store().pose_path().ends_with("esn_key_times.json"));
    }

    #[test]
    fn test_partial_config() {
        let config: ToolConfig = ron::from_str("(stepped_layer_name: \"STEPPED\", ghost_opacity: 8.0)").unwrap();
        assert_eq!(config.stepped_layer_name, "STEPPED");
        assert_eq!(config.ghost_opacity, 8.0);
        assert_eq!(config.ghost_group, "GhostGrp");
    }

    #[test]
    fn test_config_file_round_trip() {
        let path = std::env::temp_dir().join(format!("twosify-config-{}.ron", uuid::Uuid::new_v4()));
        let config = ToolConfig {
            snapshot_dir: Some(PathBuf::from("/tmp/anim")),
            ..ToolConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ToolConfig::load(&path).unwrap(), config);
        assert_eq!(config.snapshot_store().dir(), Path::new("/tmp/anim"));
        std::fs::remove_file(&path).unwrap();
    }
}
