// SPDX-License-Identifier: MIT OR Apache-2.0
//! The scene host boundary.
//!
//! Every tool talks to the animation application through [`SceneHost`].
//! The host owns objects, attributes, keyframes and layers; the tools only
//! query it and ask it to change things.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use twosify_timing::TimeRange;

/// Failures reported by the host itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// No object with this name
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// The object has no such attribute
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// Name already taken
    #[error("Name already exists: {0}")]
    AlreadyExists(String),

    /// No animation layer with this name
    #[error("Animation layer not found: {0}")]
    LayerNotFound(String),

    /// The request is not valid for this object or attribute
    #[error("Invalid host operation: {0}")]
    InvalidOperation(String),
}

/// Result type for host calls
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Integer attribute
    Int(i64),
    /// Floating point attribute
    Float(f64),
    /// String attribute
    Text(String),
    /// Enumeration: selected index and option names
    Enum {
        /// Selected option
        index: u32,
        /// Option names
        options: Vec<String>,
    },
    /// Three component value (colors, transparency)
    Double3([f64; 3]),
}

impl AttrValue {
    /// Numeric view used for keying; text and vectors have none
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            AttrValue::Enum { index, .. } => Some(f64::from(*index)),
            AttrValue::Text(_) | AttrValue::Double3(_) => None,
        }
    }

    /// Integer view
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Float(v) => Some(*v as i64),
            AttrValue::Enum { index, .. } => Some(i64::from(*index)),
            AttrValue::Text(_) | AttrValue::Double3(_) => None,
        }
    }

    /// String view
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Same kind of value with a new number, as written by a curve
    pub fn with_number(&self, value: f64) -> AttrValue {
        match self {
            AttrValue::Int(_) => AttrValue::Int(value.round() as i64),
            AttrValue::Enum { options, .. } => AttrValue::Enum {
                index: value.round().max(0.0) as u32,
                options: options.clone(),
            },
            _ => AttrValue::Float(value),
        }
    }

    /// Enumeration built from a `"Off:On"` style option string
    pub fn enumeration(options: &str, index: u32) -> AttrValue {
        AttrValue::Enum {
            index,
            options: options.split(':').map(str::to_string).collect(),
        }
    }
}

/// Channel box flags of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrFlags {
    /// Can be keyed
    pub keyable: bool,
    /// Value is locked
    pub locked: bool,
    /// Shown in the channel box while not keyable
    pub channel_box: bool,
}

impl AttrFlags {
    /// Keyable, unlocked
    pub const KEYABLE: AttrFlags = AttrFlags {
        keyable: true,
        locked: false,
        channel_box: false,
    };

    /// Not keyable and hidden
    pub const HIDDEN: AttrFlags = AttrFlags {
        keyable: false,
        locked: false,
        channel_box: false,
    };
}

impl Default for AttrFlags {
    fn default() -> Self {
        Self::KEYABLE
    }
}

/// How a key is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMode {
    /// Key the attribute's current value
    Capture,
    /// Insert a key on an existing curve without changing its shape
    Insert,
}

/// Key tangent types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tangent {
    /// Smooth automatic tangent
    #[default]
    Auto,
    /// Linear tangent
    Linear,
    /// Hold until the next key
    Step,
}

/// Kinds of scene objects the tools create or inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Plain transform (geometry, controls)
    Transform,
    /// Empty group
    Group,
    /// Camera transform
    Camera,
    /// Locator
    Locator,
    /// NURBS circle control
    Circle,
    /// Shading material
    Material,
    /// Constraint node
    Constraint,
}

/// Constraint types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Translate and rotate
    Parent,
    /// Translate only
    Point,
    /// Rotate only
    Orient,
}

impl ConstraintKind {
    /// Node type name
    pub fn node_type(&self) -> &'static str {
        match self {
            ConstraintKind::Parent => "parentConstraint",
            ConstraintKind::Point => "pointConstraint",
            ConstraintKind::Orient => "orientConstraint",
        }
    }
}

/// Transform axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// All axes in order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Upper-case attribute suffix
    pub fn suffix(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// Request for a new constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRequest {
    /// Constraint type
    pub kind: ConstraintKind,
    /// Driving object
    pub driver: String,
    /// Constrained object
    pub driven: String,
    /// Axes left unconstrained
    pub skip: Vec<Axis>,
    /// Keep the current offset between the two
    pub maintain_offset: bool,
}

/// Plug name `object.attribute`
pub fn plug(object: &str, attribute: &str) -> String {
    format!("{object}.{attribute}")
}

/// The animation application, seen by the tools
pub trait SceneHost {
    // Selection and time

    /// Selected objects in selection order
    fn selection(&self) -> Vec<String>;

    /// Replace the selection
    fn select(&mut self, objects: &[String]) -> HostResult<()>;

    /// Playback range of the timeline
    fn playback_range(&self) -> TimeRange;

    /// Change the playback range
    fn set_playback_range(&mut self, range: TimeRange);

    /// Range highlighted on the time slider, if any
    fn highlighted_range(&self) -> Option<TimeRange>;

    /// Current time
    fn current_time(&self) -> f64;

    /// Move the current time; animated attributes re-evaluate
    fn set_current_time(&mut self, time: f64);

    // Objects

    /// Whether an object exists
    fn object_exists(&self, object: &str) -> bool;

    /// Kind of an existing object
    fn object_kind(&self, object: &str) -> Option<ObjectKind>;

    /// Create an object with exactly this name
    fn create_object(&mut self, name: &str, kind: ObjectKind) -> HostResult<String>;

    /// Duplicate an object under a new name
    fn duplicate(&mut self, object: &str, name: &str) -> HostResult<String>;

    /// Delete an object and its descendants
    fn delete(&mut self, object: &str) -> HostResult<()>;

    /// Reparent an object
    fn parent(&mut self, child: &str, parent: &str) -> HostResult<()>;

    /// Direct children of an object
    fn children(&self, object: &str) -> Vec<String>;

    /// Assign a material to an object
    fn assign_material(&mut self, object: &str, material: &str) -> HostResult<()>;

    /// Copy translation and rotation from `target` onto `object`
    fn match_transform(&mut self, object: &str, target: &str) -> HostResult<()>;

    // Attributes

    /// Whether the object has this attribute
    fn has_attribute(&self, object: &str, attribute: &str) -> bool;

    /// All attribute names of an object
    fn attributes(&self, object: &str) -> Vec<String>;

    /// Keyable, unlocked attributes of an object
    fn keyable_attributes(&self, object: &str) -> Vec<String>;

    /// Channels selected in the channel box
    fn selected_channels(&self) -> Vec<String>;

    /// Read an attribute
    fn attribute(&self, object: &str, attribute: &str) -> Option<AttrValue>;

    /// Write an attribute
    fn set_attribute(&mut self, object: &str, attribute: &str, value: AttrValue) -> HostResult<()>;

    /// Add a dynamic attribute
    fn add_attribute(&mut self, object: &str, attribute: &str, value: AttrValue, flags: AttrFlags) -> HostResult<()>;

    /// Read attribute flags
    fn attribute_flags(&self, object: &str, attribute: &str) -> Option<AttrFlags>;

    /// Change attribute flags
    fn set_attribute_flags(&mut self, object: &str, attribute: &str, flags: AttrFlags) -> HostResult<()>;

    /// Drive `destination` from `source` (both plugs), replacing any input
    fn connect_attributes(&mut self, source: &str, destination: &str) -> HostResult<()>;

    // Keyframes

    /// Key times of one attribute, or of every attribute when `None`,
    /// optionally limited to an inclusive window
    fn keyframe_times(&self, object: &str, attribute: Option<&str>, window: Option<(f64, f64)>) -> Vec<f64>;

    /// Set a key on one attribute, or on every keyable attribute when `None`
    fn set_keyframe(&mut self, object: &str, attribute: Option<&str>, time: f64, mode: KeyMode) -> HostResult<()>;

    /// Remove keys inside `[from, to]`, returning how many were cut
    fn cut_keys(&mut self, object: &str, attribute: Option<&str>, from: f64, to: f64) -> HostResult<usize>;

    /// Set tangents on every key of the attribute(s)
    fn set_tangents(&mut self, object: &str, attribute: Option<&str>, in_tangent: Tangent, out_tangent: Tangent) -> HostResult<()>;

    // Constraints

    /// Create a constraint, returning the constraint node name
    fn create_constraint(&mut self, request: &ConstraintRequest) -> HostResult<String>;

    // Animation layers

    /// Name of the base layer
    fn root_layer(&self) -> String;

    /// Layers selected in the layer editor
    fn selected_layers(&self) -> Vec<String>;

    /// Create a layer, returning its (possibly uniquified) name
    fn create_layer(&mut self, name: &str) -> HostResult<String>;

    /// Select or deselect a layer
    fn select_layer(&mut self, layer: &str, selected: bool) -> HostResult<()>;

    /// Add plugs to a layer
    fn add_layer_attributes(&mut self, layer: &str, plugs: &[String]) -> HostResult<()>;

    /// Set layer weight
    fn set_layer_weight(&mut self, layer: &str, weight: f64) -> HostResult<()>;

    /// Switch a layer between override and additive
    fn set_layer_override(&mut self, layer: &str, override_mode: bool) -> HostResult<()>;

    // Feedback

    /// Show a short message to the user
    fn show_message(&mut self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_value_views() {
        assert_eq!(AttrValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(AttrValue::Float(2.6).as_i64(), Some(2));
        assert_eq!(AttrValue::Text("pCube1".into()).as_text(), Some("pCube1"));
        assert_eq!(AttrValue::Double3([0.5; 3]).as_f64(), None);
    }

    #[test]
    fn test_enumeration() {
        let value = AttrValue::enumeration("Off:On", 1);
        assert_eq!(
            value,
            AttrValue::Enum {
                index: 1,
                options: vec!["Off".to_string(), "On".to_string()],
            }
        );
        assert_eq!(value.with_number(0.2).as_i64(), Some(0));
    }

    #[test]
    fn test_plug_names() {
        assert_eq!(plug("pCube1", "translateX"), "pCube1.translateX");
        assert_eq!(ConstraintKind::Orient.node_type(), "orientConstraint");
    }
}
