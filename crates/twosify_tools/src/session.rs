// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-run tool state.
//!
//! Everything the tools remember between button presses lives here and is
//! passed to each operation explicitly.

use crate::camera::CameraSetup;
use crate::config::ToolConfig;
use crate::ghost::GhostSettings;
use crate::timing_copy::CopyMode;
use twosify_timing::SnapshotStore;

/// Tool session state
#[derive(Debug, Clone)]
pub struct Session {
    /// Active settings
    pub config: ToolConfig,
    /// Where snapshot records are kept
    pub store: SnapshotStore,
    /// Key times from the last pose-to-pose copy, used when the record
    /// file cannot be read
    pub copied_key_times: Vec<f64>,
    /// Copy/paste mode selected in the UI
    pub copy_mode: CopyMode,
    /// Pose ghoster state
    pub ghost: GhostSettings,
    /// Camera attach fields
    pub camera: CameraSetup,
}

impl Session {
    /// Start a session from settings
    pub fn new(config: ToolConfig) -> Self {
        Self {
            store: config.snapshot_store(),
            ghost: GhostSettings::new(config.ghost_opacity),
            copied_key_times: Vec::new(),
            copy_mode: CopyMode::default(),
            camera: CameraSetup::default(),
            config,
        }
    }

    /// Use a different snapshot store
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = store;
        self
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ToolConfig::default())
    }
}
