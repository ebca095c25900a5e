// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame pattern and keyframe-set engine for Twosify.
//!
//! This crate holds the host-independent part of the retiming tools:
//! - Time ranges and frame sets
//! - Stepped frame patterns (ones, every N, alternating, legacy parity)
//! - Keyframe-set synchronization (add/remove planning)
//! - Key timing snapshots and their on-disk store
//! - Ghost frame navigation
//!
//! ## Architecture
//!
//! Everything here is pure data and arithmetic. The scene that owns
//! keyframes is an external collaborator; callers query it for key times,
//! ask this crate what to change, and apply the result themselves.

pub mod error;
pub mod key_times;
pub mod navigation;
pub mod pattern;
pub mod range;
pub mod snapshot;
pub mod sync;

pub use error::{Result, TimingError};
pub use key_times::{format_key_list, normalize_times, parse_key_list};
pub use navigation::{next_frame, previous_frame};
pub use pattern::{generate_frames, parity_frames, FrameSet, KeyingPolicy, ParitySplit, Pattern, StepPreset};
pub use range::TimeRange;
pub use snapshot::{
    KeyTimeRecord, KeyTimingSnapshot, SnapshotError, SnapshotStore, CHANNEL_RECORD_FILE,
    POSE_RECORD_FILE,
};
pub use sync::{plan_sync, SyncPlan};
