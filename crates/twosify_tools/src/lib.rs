// SPDX-License-Identifier: MIT OR Apache-2.0
//! # Twosify tools
//!
//! Animation tools built on the frame pattern engine:
//!
//! - Stepped keying on ones, twos, threes and mixed cadences
//! - Key timing copy and paste, pose to pose or per channel
//! - Stepped animation layers
//! - Pose ghosting
//! - Camera attach rigs
//!
//! Tools talk to the animation application through [`SceneHost`].
//! [`MemoryScene`] implements it over a serializable in-memory scene.

pub mod camera;
pub mod commands;
pub mod config;
pub mod error;
pub mod ghost;
pub mod host;
pub mod keying;
pub mod scene;
pub mod session;
pub mod stepped;
pub mod timing_copy;

pub use camera::{attach_to_camera, plan_constraints, CameraAttachment, CameraSetup};
pub use commands::{Action, ActionTable, Handler};
pub use config::{ConfigError, ToolConfig, CONFIG_FILE_NAME};
pub use error::{Result, ToolError};
pub use ghost::{ghosted_frames, set_ghost_opacity, GhostSettings};
pub use host::{
    AttrFlags, AttrValue, Axis, ConstraintKind, ConstraintRequest, HostError, HostResult, KeyMode, ObjectKind,
    SceneHost, Tangent,
};
pub use keying::{key_on_preset, SyncReport};
pub use scene::{MemoryScene, SceneFileError};
pub use session::Session;
pub use stepped::SteppedConversion;
pub use timing_copy::CopyMode;
