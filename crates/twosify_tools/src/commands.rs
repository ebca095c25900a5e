// SPDX-License-Identifier: MIT OR Apache-2.0
//! User-facing commands.
//!
//! Every button and menu item is an [`Action`]. The [`ActionTable`] maps
//! actions to handlers that run against a host and a session.

use crate::camera::{assign_camera, assign_key_times, assign_master, attach_to_camera};
use crate::error::{Result, ToolError};
use crate::ghost::{
    apply_ghost_opacity, assign_ghost_targets, delete_all_ghosts, delete_current_ghost, go_to_next_ghost,
    go_to_previous_ghost, make_ghost_pose, update_ghost_pose,
};
use crate::host::SceneHost;
use crate::keying::key_on_preset;
use crate::session::Session;
use crate::stepped::{add_selection_to_layer, convert_to_stepped, create_stepped_layer};
use crate::timing_copy::{copy_action, paste_action, CopyMode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use twosify_timing::StepPreset;

/// Command handler
pub type Handler = fn(&mut dyn SceneHost, &mut Session) -> Result<()>;

/// Every user-facing command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Key the selection on a preset
    Key(StepPreset),
    /// Copy key timing in the current mode
    Copy,
    /// Paste key timing in the current mode
    Paste,
    /// Switch copy/paste mode
    SetCopyMode(CopyMode),
    /// Create the stepped layer from the selection
    CreateSteppedLayer,
    /// Add the selection to the selected layer
    AddToLayer,
    /// Re-key the selected layer as stepped
    ConvertToStepped,
    /// Use the selection as ghost targets
    GhostAssign,
    /// Ghost the targets at the current frame
    GhostMake,
    /// Re-make the current frame's ghosts
    GhostUpdate,
    /// Jump to the previous ghosted frame
    GhostPrevious,
    /// Jump to the next ghosted frame
    GhostNext,
    /// Delete the current frame's ghosts
    GhostDeleteCurrent,
    /// Delete every ghost
    GhostDeleteAll,
    /// Apply the ghost opacity
    GhostOpacity,
    /// Assign the camera from the selection
    CameraAssign,
    /// Assign the master control from the selection
    CameraAssignMaster,
    /// Assign key times from the selection
    CameraAssignKeys,
    /// Attach the master control to the camera
    CameraAttach,
}

impl Action {
    /// All actions in menu order
    pub fn all() -> Vec<Action> {
        let mut actions: Vec<Action> = StepPreset::all().iter().copied().map(Action::Key).collect();
        actions.extend([
            Action::Copy,
            Action::Paste,
            Action::SetCopyMode(CopyMode::PoseToPose),
            Action::SetCopyMode(CopyMode::Channels),
            Action::CreateSteppedLayer,
            Action::AddToLayer,
            Action::ConvertToStepped,
            Action::GhostAssign,
            Action::GhostMake,
            Action::GhostUpdate,
            Action::GhostPrevious,
            Action::GhostNext,
            Action::GhostDeleteCurrent,
            Action::GhostDeleteAll,
            Action::GhostOpacity,
            Action::CameraAssign,
            Action::CameraAssignMaster,
            Action::CameraAssignKeys,
            Action::CameraAttach,
        ]);
        actions
    }

    /// Stable command-line name
    pub fn name(&self) -> String {
        match self {
            Action::Key(preset) => format!("key-{}", preset.name()),
            Action::Copy => "copy".to_string(),
            Action::Paste => "paste".to_string(),
            Action::SetCopyMode(CopyMode::PoseToPose) => "mode-pose".to_string(),
            Action::SetCopyMode(CopyMode::Channels) => "mode-channels".to_string(),
            Action::CreateSteppedLayer => "stepped-layer".to_string(),
            Action::AddToLayer => "add-to-layer".to_string(),
            Action::ConvertToStepped => "convert-to-stepped".to_string(),
            Action::GhostAssign => "ghost-assign".to_string(),
            Action::GhostMake => "ghost-make".to_string(),
            Action::GhostUpdate => "ghost-update".to_string(),
            Action::GhostPrevious => "ghost-previous".to_string(),
            Action::GhostNext => "ghost-next".to_string(),
            Action::GhostDeleteCurrent => "ghost-delete".to_string(),
            Action::GhostDeleteAll => "ghost-delete-all".to_string(),
            Action::GhostOpacity => "ghost-opacity".to_string(),
            Action::CameraAssign => "camera-assign".to_string(),
            Action::CameraAssignMaster => "camera-assign-master".to_string(),
            Action::CameraAssignKeys => "camera-assign-keys".to_string(),
            Action::CameraAttach => "camera-attach".to_string(),
        }
    }

    /// Look up an action by its command-line name
    pub fn from_name(name: &str) -> Option<Action> {
        Self::all().into_iter().find(|action| action.name() == name)
    }

    /// Button or menu label
    pub fn label(&self) -> &'static str {
        match self {
            Action::Key(preset) => preset.label(),
            Action::Copy => "Copy Time",
            Action::Paste => "Paste Time",
            Action::SetCopyMode(mode) => mode.label(),
            Action::CreateSteppedLayer => "Create animLayer from Selections",
            Action::AddToLayer => "Add Selection to AnimLayer",
            Action::ConvertToStepped => "Update Layer",
            Action::GhostAssign => "Add Geo",
            Action::GhostMake => "Make Ghost Pose",
            Action::GhostUpdate => "Update Ghost Pose",
            Action::GhostPrevious => "<<< Go To Previous Ghost",
            Action::GhostNext => "Go To Next Ghost >>>",
            Action::GhostDeleteCurrent => "Delete Current Ghost",
            Action::GhostDeleteAll => "Delete all Ghost",
            Action::GhostOpacity => "Opacity",
            Action::CameraAssign => "Assign Camera",
            Action::CameraAssignMaster => "Assign Master Ctrl",
            Action::CameraAssignKeys => "Assign Keys Time",
            Action::CameraAttach => "Attach to Camera",
        }
    }

    /// Handler for this action
    fn handler(&self) -> Handler {
        match self {
            Action::Key(StepPreset::Ones) => key_ones,
            Action::Key(StepPreset::Twos) => key_twos,
            Action::Key(StepPreset::Threes) => key_threes,
            Action::Key(StepPreset::TwosThrees) => key_twos_threes,
            Action::Key(StepPreset::ThreesFours) => key_threes_fours,
            Action::Copy => copy_action,
            Action::Paste => paste_action,
            Action::SetCopyMode(CopyMode::PoseToPose) => mode_pose,
            Action::SetCopyMode(CopyMode::Channels) => mode_channels,
            Action::CreateSteppedLayer => |host, session| create_stepped_layer(host, session).map(drop),
            Action::AddToLayer => |host, session| add_selection_to_layer(host, session).map(drop),
            Action::ConvertToStepped => |host, session| convert_to_stepped(host, session).map(drop),
            Action::GhostAssign => assign_ghost_targets,
            Action::GhostMake => |host, session| make_ghost_pose(host, session).map(drop),
            Action::GhostUpdate => |host, session| update_ghost_pose(host, session).map(drop),
            Action::GhostPrevious => |host, session| go_to_previous_ghost(host, session).map(drop),
            Action::GhostNext => |host, session| go_to_next_ghost(host, session).map(drop),
            Action::GhostDeleteCurrent => |host, session| delete_current_ghost(host, session).map(drop),
            Action::GhostDeleteAll => delete_all_ghosts,
            Action::GhostOpacity => apply_ghost_opacity,
            Action::CameraAssign => assign_camera,
            Action::CameraAssignMaster => assign_master,
            Action::CameraAssignKeys => assign_key_times,
            Action::CameraAttach => |host, session| attach_to_camera(host, session).map(drop),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

fn key_ones(host: &mut dyn SceneHost, _session: &mut Session) -> Result<()> {
    key_on_preset(host, StepPreset::Ones).map(drop)
}

fn key_twos(host: &mut dyn SceneHost, _session: &mut Session) -> Result<()> {
    key_on_preset(host, StepPreset::Twos).map(drop)
}

fn key_threes(host: &mut dyn SceneHost, _session: &mut Session) -> Result<()> {
    key_on_preset(host, StepPreset::Threes).map(drop)
}

fn key_twos_threes(host: &mut dyn SceneHost, _session: &mut Session) -> Result<()> {
    key_on_preset(host, StepPreset::TwosThrees).map(drop)
}

fn key_threes_fours(host: &mut dyn SceneHost, _session: &mut Session) -> Result<()> {
    key_on_preset(host, StepPreset::ThreesFours).map(drop)
}

fn mode_pose(_host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    session.copy_mode = CopyMode::PoseToPose;
    Ok(())
}

fn mode_channels(_host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    session.copy_mode = CopyMode::Channels;
    Ok(())
}

/// Action to handler mapping
#[derive(Clone)]
pub struct ActionTable {
    handlers: IndexMap<Action, Handler>,
}

impl ActionTable {
    /// Table without any handlers
    pub fn empty() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// Register or replace a handler
    pub fn register(&mut self, action: Action, handler: Handler) {
        self.handlers.insert(action, handler);
    }

    /// Handler for an action
    pub fn get(&self, action: Action) -> Option<Handler> {
        self.handlers.get(&action).copied()
    }

    /// Registered actions in order
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.handlers.keys().copied()
    }

    /// Run an action.
    ///
    /// Failures are logged and shown to the user, then returned.
    pub fn dispatch(&self, action: Action, host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
        let result = match self.get(action) {
            Some(handler) => {
                tracing::debug!("Running {}", action);
                handler(host, session)
            }
            None => Err(ToolError::precondition(format!("No handler for {action}"))),
        };

        if let Err(e) = &result {
            match e {
                ToolError::HostPreconditionFailed(_) => tracing::warn!("{}: {}", action, e),
                _ => tracing::error!("{} failed: {}", action, e),
            }
            host.show_message(&e.to_string());
        }
        result
    }
}

impl std::fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.handlers.keys()).finish()
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for action in Action::all() {
            table.register(action, action.handler());
        }
        table
    }
}

impl Session {
    /// Run an action from the default table
    pub fn dispatch(&mut self, host: &mut dyn SceneHost, action: Action) -> Result<()> {
        ActionTable::default().dispatch(action, host, self)
    }
}
