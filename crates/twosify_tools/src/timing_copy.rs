// SPDX-License-Identifier: MIT OR Apache-2.0
//! Copying key timing between objects.
//!
//! Two modes are offered:
//! - Pose to pose: the merged key times of the selection are copied and
//!   every channel of the paste targets is retimed onto them.
//! - Channels: key times are copied per object and attribute and pasted
//!   channel by channel, falling back to the first copied object for
//!   targets that were not part of the copy.

use crate::error::{Result, ToolError};
use crate::host::SceneHost;
use crate::keying::{sync_channel, sync_objects, SyncReport};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use twosify_timing::{normalize_times, KeyTimeRecord, KeyTimingSnapshot};

/// Copy/paste mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CopyMode {
    /// Merged key times of the whole selection
    #[default]
    PoseToPose,
    /// Key times per object and attribute
    Channels,
}

impl CopyMode {
    /// Label shown in the mode menu
    pub fn label(&self) -> &'static str {
        match self {
            CopyMode::PoseToPose => "Pose to Pose",
            CopyMode::Channels => "Channels",
        }
    }
}

fn require_selection(host: &dyn SceneHost, message: &str) -> Result<Vec<String>> {
    let selection = host.selection();
    if selection.is_empty() {
        return Err(ToolError::precondition(message));
    }
    Ok(selection)
}

/// Copy using the session's mode
pub fn copy_action(host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    tracing::debug!("Copy pressed - mode: {}", session.copy_mode.label());
    match session.copy_mode {
        CopyMode::PoseToPose => copy_pose_timing(host, session).map(drop),
        CopyMode::Channels => copy_channel_timing(host, session).map(drop),
    }
}

/// Paste using the session's mode
pub fn paste_action(host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    tracing::debug!("Paste pressed - mode: {}", session.copy_mode.label());
    match session.copy_mode {
        CopyMode::PoseToPose => paste_pose_timing(host, session).map(drop),
        CopyMode::Channels => paste_channel_timing(host, session).map(drop),
    }
}

/// Copy the selection's key times inside the playback range
pub fn copy_pose_timing(host: &mut dyn SceneHost, session: &mut Session) -> Result<KeyTimeRecord> {
    let selection = require_selection(host, "No objects selected for copy operation.")?;
    let range = host.playback_range();

    let times: Vec<f64> = selection
        .iter()
        .flat_map(|obj| host.keyframe_times(obj, None, Some(range.bounds())))
        .collect();
    let record = KeyTimeRecord::new(times, range, selection);
    if record.has_keys {
        tracing::info!("Found keyframes: {:?}", record.key_times);
    } else {
        tracing::info!("No keyframes found on selected objects, storing empty key times");
    }

    session.copied_key_times = record.key_times.clone();
    let path = session.store.save_pose(&record)?;
    tracing::info!("Key times saved to {}", path.display());

    host.show_message("Copied Key Time");
    Ok(record)
}

/// Retime the selection onto the copied key times
pub fn paste_pose_timing(host: &mut dyn SceneHost, session: &mut Session) -> Result<SyncReport> {
    let (times, stored_range) = match session.store.load_pose() {
        Ok(record) => {
            if record.key_times.is_empty() {
                return Err(ToolError::precondition(
                    "No key times found in the copied record. Please use Copy first.",
                ));
            }
            tracing::info!("Loaded key times: {:?}", record.key_times);
            (record.key_times, Some(record.playback_range))
        }
        Err(e) => {
            tracing::warn!("Could not read key time record: {e}");
            let times = normalize_times(session.copied_key_times.iter().copied());
            if times.is_empty() {
                return Err(ToolError::precondition("No key times found. Please use Copy first."));
            }
            host.show_message("Key time record unavailable, using key times copied in this session.");
            (times, None)
        }
    };
    let Some(&first_key) = times.first() else {
        return Err(ToolError::precondition("No key times found. Please use Copy first."));
    };

    let selection = require_selection(host, "No objects selected. Please select objects to paste keys.")?;
    let range = stored_range.unwrap_or_else(|| host.playback_range());
    tracing::info!("Using playback range {}", range);

    let current = host.current_time();
    let result = sync_objects(host, &selection, &times, first_key, range.bounds());
    host.set_current_time(current);

    let report = result?;
    tracing::info!(
        "Applied key timing to {} objects: +{} keys, -{} keys",
        report.objects,
        report.added,
        report.removed
    );
    Ok(report)
}

/// Channels to copy from an object: the channel box selection, or every
/// keyable attribute when nothing is selected there
fn channels_to_copy(host: &dyn SceneHost, object: &str) -> Vec<String> {
    let selected = host.selected_channels();
    if selected.is_empty() {
        host.keyable_attributes(object)
    } else {
        selected
    }
}

/// Copy key times per object and attribute
pub fn copy_channel_timing(host: &mut dyn SceneHost, session: &mut Session) -> Result<KeyTimingSnapshot> {
    let selection = require_selection(host, "No objects selected.")?;

    let mut snapshot = KeyTimingSnapshot::new();
    for object in &selection {
        for attribute in channels_to_copy(host, object) {
            if !host.has_attribute(object, &attribute) {
                continue;
            }
            let times = host.keyframe_times(object, Some(&attribute), None);
            if !times.is_empty() {
                snapshot.insert(object.as_str(), attribute, times);
            }
        }
    }

    if snapshot.is_empty() {
        return Err(ToolError::precondition("No keyed attributes found on selected objects."));
    }

    let path = session.store.save_channels(&snapshot)?;
    tracing::info!("Channel key timing saved to {}", path.display());
    host.show_message("Copied Key Time");
    Ok(snapshot)
}

/// Synchronize each selected object's channels to the copied timing
/// inside the playback range
pub fn paste_channel_timing(host: &mut dyn SceneHost, session: &mut Session) -> Result<SyncReport> {
    let snapshot = session.store.load_channels()?;
    let Some((reference, _)) = snapshot.reference() else {
        return Err(ToolError::precondition("The channel timing record is empty."));
    };
    tracing::debug!("Reference object for fallback: {}", reference);

    let selection = require_selection(host, "Please select at least one object.")?;
    let bounds = host.playback_range().bounds();

    let mut report = SyncReport::default();
    for object in &selection {
        let Some(timing) = snapshot.timing_for(object) else {
            continue;
        };
        for (attribute, times) in timing {
            let locked = host.attribute_flags(object, attribute).map(|flags| flags.locked);
            if locked != Some(false) {
                continue;
            }
            let plan = sync_channel(host, object, attribute, times, bounds)?;
            if !plan.is_empty() {
                tracing::info!(
                    "Synced {}.{}: +{} keys, -{} keys",
                    object,
                    attribute,
                    plan.to_add.len(),
                    plan.to_remove.len()
                );
            }
            report.added += plan.to_add.len();
            report.removed += plan.to_remove.len();
        }
        report.objects += 1;
    }
    Ok(report)
}
