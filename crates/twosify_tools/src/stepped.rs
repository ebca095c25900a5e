// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stepped animation layers.
//!
//! A stepped layer is an override layer that holds a key at every existing
//! key time of the selection, with stepped out tangents.

use crate::error::{Result, ToolError};
use crate::host::{plug, KeyMode, SceneHost, Tangent};
use crate::session::Session;
use twosify_timing::{normalize_times, TimeRange};

/// Result of a layer conversion
#[derive(Debug, Clone, PartialEq)]
pub struct SteppedConversion {
    /// Layer that received the keys
    pub layer: String,
    /// Range the keys were taken from
    pub range: TimeRange,
    /// Key times re-keyed on the layer
    pub key_times: Vec<f64>,
}

fn animatable_plugs(host: &dyn SceneHost, objects: &[String]) -> Vec<String> {
    objects
        .iter()
        .flat_map(|obj| {
            host.keyable_attributes(obj)
                .into_iter()
                .map(move |attr| plug(obj, &attr))
        })
        .collect()
}

/// Create the stepped layer from the selection and make it the only
/// selected layer
pub fn create_stepped_layer(host: &mut dyn SceneHost, session: &mut Session) -> Result<String> {
    let selection = host.selection();
    if selection.is_empty() {
        return Err(ToolError::precondition("Please select something to create an animLayer."));
    }

    let previous = host.selected_layers();
    let layer = host.create_layer(&session.config.stepped_layer_name)?;
    for other in previous.iter().filter(|name| **name != layer) {
        host.select_layer(other, false)?;
    }
    host.select_layer(&layer, true)?;

    let plugs = animatable_plugs(host, &selection);
    host.add_layer_attributes(&layer, &plugs)?;
    tracing::info!("Created layer {} with {} attributes", layer, plugs.len());
    Ok(layer)
}

/// Add the selection's animatable attributes to the selected layer
pub fn add_selection_to_layer(host: &mut dyn SceneHost, _session: &mut Session) -> Result<String> {
    let selection = host.selection();
    if selection.is_empty() {
        return Err(ToolError::precondition("Please select something to add to the animLayer."));
    }
    let Some(layer) = host.selected_layers().into_iter().next() else {
        return Err(ToolError::precondition("Please make sure to have an animLayer selected!"));
    };

    let plugs = animatable_plugs(host, &selection);
    host.add_layer_attributes(&layer, &plugs)?;
    tracing::debug!("Added {} attributes to {}", plugs.len(), layer);
    Ok(layer)
}

/// Re-key the selection on the selected layer at every key time in range
/// and step the result.
///
/// A highlighted time slider range spanning more than one frame limits the
/// conversion; its keys get stepped in tangents too.
pub fn convert_to_stepped(host: &mut dyn SceneHost, _session: &mut Session) -> Result<SteppedConversion> {
    let selection = host.selection();
    if selection.is_empty() {
        return Err(ToolError::precondition("Please select something!"));
    }
    let root = host.root_layer();
    let layer = match host.selected_layers().into_iter().next() {
        Some(layer) if layer != root => layer,
        _ => return Err(ToolError::precondition("Please make sure to have an animLayer selected!")),
    };

    let highlighted = host.highlighted_range().filter(|range| range.len() > 1);
    let range = highlighted.unwrap_or_else(|| host.playback_range());
    let in_tangent = if highlighted.is_some() { Tangent::Step } else { Tangent::Auto };

    let key_times = normalize_times(
        selection
            .iter()
            .flat_map(|obj| host.keyframe_times(obj, None, Some(range.bounds()))),
    );
    if key_times.is_empty() {
        return Err(ToolError::precondition("Please set some keys!"));
    }

    host.set_layer_override(&layer, true)?;
    host.set_layer_weight(&layer, 0.0)?;

    let current = host.current_time();
    let keyed = key_at_times(host, &selection, &key_times);
    host.set_current_time(current);
    keyed?;

    host.set_layer_weight(&layer, 1.0)?;
    for obj in &selection {
        host.set_tangents(obj, None, in_tangent, Tangent::Step)?;
    }

    tracing::info!("Converted {} keys on {} over {}", key_times.len(), layer, range);
    Ok(SteppedConversion { layer, range, key_times })
}

fn key_at_times(host: &mut dyn SceneHost, objects: &[String], times: &[f64]) -> Result<()> {
    for &time in times {
        host.set_current_time(time);
        for obj in objects {
            host.set_keyframe(obj, None, time, KeyMode::Capture)?;
        }
    }
    Ok(())
}
