// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory scene host.
//!
//! [`MemoryScene`] is a small, serializable stand-in for the animation
//! application. It is what the command line front end edits and what the
//! tool tests run against. Curves are linear between keys and hold when a
//! key's out tangent is stepped; there are no shape nodes, so display
//! overrides live on the transform itself.

use crate::host::{
    plug, AttrFlags, AttrValue, ConstraintRequest, HostError, HostResult, KeyMode, ObjectKind,
    SceneHost, Tangent,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use twosify_timing::{normalize_times, TimeRange};

/// Name of the base animation layer
pub const ROOT_LAYER: &str = "BaseAnimation";

const TRANSFORM_CHANNELS: [&str; 9] = [
    "translateX", "translateY", "translateZ",
    "rotateX", "rotateY", "rotateZ",
    "scaleX", "scaleY", "scaleZ",
];

/// Errors reading or writing a scene file
#[derive(Debug, Error)]
pub enum SceneFileError {
    /// Filesystem error
    #[error("Scene file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid scene JSON
    #[error("Scene file parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A key on an attribute curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Key time
    pub time: f64,
    /// Key value
    pub value: f64,
    /// Incoming tangent
    #[serde(default)]
    pub in_tangent: Tangent,
    /// Outgoing tangent
    #[serde(default)]
    pub out_tangent: Tangent,
}

impl Key {
    /// Key with automatic tangents
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            in_tangent: Tangent::Auto,
            out_tangent: Tangent::Auto,
        }
    }
}

/// An attribute with its optional animation curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Current value
    pub value: AttrValue,
    /// Channel box flags
    #[serde(default)]
    pub flags: AttrFlags,
    /// Keys sorted by time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<Key>,
    /// Incoming connection plug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

impl Attribute {
    /// Unanimated attribute
    pub fn new(value: AttrValue, flags: AttrFlags) -> Self {
        Self {
            value,
            flags,
            keys: Vec::new(),
            input: None,
        }
    }

    /// Whether the attribute can receive captured keys
    fn is_keyable(&self) -> bool {
        self.flags.keyable && !self.flags.locked && self.value.as_f64().is_some()
    }

    /// Evaluate the curve at `time`
    pub fn evaluate(&self, time: f64) -> Option<f64> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }

        let next_idx = self.keys.iter().position(|k| k.time >= time)?;
        let next = &self.keys[next_idx];
        if next.time == time {
            return Some(next.value);
        }
        let prev = &self.keys[next_idx - 1];
        if prev.out_tangent == Tangent::Step {
            return Some(prev.value);
        }
        let t = (time - prev.time) / (next.time - prev.time);
        Some(prev.value + (next.value - prev.value) * t)
    }

    fn put_key(&mut self, time: f64, value: f64) {
        match self.keys.iter_mut().find(|k| k.time == time) {
            Some(key) => key.value = value,
            None => {
                self.keys.push(Key::new(time, value));
                self.keys.sort_by(|a, b| a.time.total_cmp(&b.time));
            }
        }
    }
}

/// An object in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Object kind
    pub kind: ObjectKind,
    /// Parent object
    #[serde(default)]
    pub parent: Option<String>,
    /// Assigned material
    #[serde(default)]
    pub material: Option<String>,
    /// Attributes by name
    #[serde(default)]
    pub attributes: IndexMap<String, Attribute>,
    /// How this constraint node was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ConstraintRequest>,
}

impl SceneObject {
    /// New object with the default attributes of its kind
    pub fn new(kind: ObjectKind) -> Self {
        let mut attributes = IndexMap::new();
        let hidden = |value| Attribute::new(value, AttrFlags::HIDDEN);

        match kind {
            ObjectKind::Transform
            | ObjectKind::Group
            | ObjectKind::Camera
            | ObjectKind::Locator
            | ObjectKind::Circle => {
                for channel in TRANSFORM_CHANNELS {
                    let value = if channel.starts_with("scale") { 1.0 } else { 0.0 };
                    attributes.insert(
                        channel.to_string(),
                        Attribute::new(AttrValue::Float(value), AttrFlags::KEYABLE),
                    );
                }
                attributes.insert(
                    "visibility".to_string(),
                    Attribute::new(AttrValue::Float(1.0), AttrFlags::KEYABLE),
                );
                attributes.insert("displayHandle".to_string(), hidden(AttrValue::Int(0)));
                attributes.insert("overrideEnabled".to_string(), hidden(AttrValue::Int(0)));
                attributes.insert("overrideColor".to_string(), hidden(AttrValue::Int(0)));
                attributes.insert("useOutlinerColor".to_string(), hidden(AttrValue::Int(0)));
                attributes.insert("outlinerColor".to_string(), hidden(AttrValue::Double3([0.0; 3])));
                if kind == ObjectKind::Camera {
                    attributes.insert(
                        "focalLength".to_string(),
                        Attribute::new(AttrValue::Float(35.0), AttrFlags::KEYABLE),
                    );
                }
            }
            ObjectKind::Material => {
                attributes.insert("color".to_string(), hidden(AttrValue::Double3([0.5; 3])));
                attributes.insert("transparency".to_string(), hidden(AttrValue::Double3([0.0; 3])));
            }
            ObjectKind::Constraint => {}
        }

        Self {
            kind,
            parent: None,
            material: None,
            attributes,
            constraint: None,
        }
    }

    fn has_keys(&self) -> bool {
        self.attributes.values().any(|attr| !attr.keys.is_empty())
    }
}

/// An animation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimLayer {
    /// Blend weight
    pub weight: f64,
    /// Override (true) or additive (false)
    pub override_mode: bool,
    /// Selected in the layer editor
    pub selected: bool,
    /// Plugs animated on this layer
    pub plugs: Vec<String>,
}

impl Default for AnimLayer {
    fn default() -> Self {
        Self {
            weight: 1.0,
            override_mode: false,
            selected: false,
            plugs: Vec::new(),
        }
    }
}

fn default_root_layer() -> String {
    ROOT_LAYER.to_string()
}

/// Serializable in-memory scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryScene {
    playback_range: TimeRange,
    #[serde(default)]
    highlighted_range: Option<TimeRange>,
    #[serde(default)]
    current_time: f64,
    #[serde(default)]
    objects: IndexMap<String, SceneObject>,
    #[serde(default)]
    selection: Vec<String>,
    #[serde(default)]
    selected_channels: Vec<String>,
    #[serde(default = "default_root_layer")]
    root_layer: String,
    #[serde(default)]
    layers: IndexMap<String, AnimLayer>,
    #[serde(skip)]
    messages: Vec<String>,
}

impl MemoryScene {
    /// Empty scene with a playback range; the current time is the range start
    pub fn new(playback_range: TimeRange) -> Self {
        let mut layers = IndexMap::new();
        layers.insert(ROOT_LAYER.to_string(), AnimLayer::default());
        Self {
            playback_range,
            highlighted_range: None,
            current_time: f64::from(playback_range.start()),
            objects: IndexMap::new(),
            selection: Vec::new(),
            selected_channels: Vec::new(),
            root_layer: ROOT_LAYER.to_string(),
            layers,
            messages: Vec::new(),
        }
    }

    /// Load a scene from JSON
    pub fn load(path: &Path) -> Result<Self, SceneFileError> {
        let content = std::fs::read_to_string(path)?;
        let mut scene: MemoryScene = serde_json::from_str(&content)?;
        let root = scene.root_layer.clone();
        scene.layers.entry(root).or_default();
        Ok(scene)
    }

    /// Save the scene as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SceneFileError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Look up an object
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    /// Replace the keys of an attribute with `(time, value)` pairs
    pub fn set_curve(&mut self, object: &str, attribute: &str, keys: &[(f64, f64)]) -> HostResult<()> {
        let attr = self.attribute_mut(object, attribute)?;
        attr.keys = keys.iter().map(|&(time, value)| Key::new(time, value)).collect();
        attr.keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        let time = self.current_time;
        self.evaluate_at(time);
        Ok(())
    }

    /// Keys of an attribute
    pub fn curve(&self, object: &str, attribute: &str) -> Option<&[Key]> {
        self.objects
            .get(object)?
            .attributes
            .get(attribute)
            .map(|attr| attr.keys.as_slice())
    }

    /// Source plug connected into `destination`
    pub fn connection_source(&self, destination: &str) -> Option<&str> {
        let (object, attribute) = destination.split_once('.')?;
        self.objects.get(object)?.attributes.get(attribute)?.input.as_deref()
    }

    /// Look up a layer
    pub fn layer(&self, name: &str) -> Option<&AnimLayer> {
        self.layers.get(name)
    }

    /// Set the channel box selection
    pub fn set_selected_channels(&mut self, channels: Vec<String>) {
        self.selected_channels = channels;
    }

    /// Highlight a range on the time slider
    pub fn set_highlighted_range(&mut self, range: Option<TimeRange>) {
        self.highlighted_range = range;
    }

    /// Messages shown so far
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    fn object_ref(&self, object: &str) -> HostResult<&SceneObject> {
        self.objects
            .get(object)
            .ok_or_else(|| HostError::ObjectNotFound(object.to_string()))
    }

    fn object_mut(&mut self, object: &str) -> HostResult<&mut SceneObject> {
        self.objects
            .get_mut(object)
            .ok_or_else(|| HostError::ObjectNotFound(object.to_string()))
    }

    fn attribute_mut(&mut self, object: &str, attribute: &str) -> HostResult<&mut Attribute> {
        self.object_mut(object)?
            .attributes
            .get_mut(attribute)
            .ok_or_else(|| HostError::AttributeNotFound(plug(object, attribute)))
    }

    fn layer_mut(&mut self, layer: &str) -> HostResult<&mut AnimLayer> {
        self.layers
            .get_mut(layer)
            .ok_or_else(|| HostError::LayerNotFound(layer.to_string()))
    }

    /// Attribute names to act on for a keying call
    fn key_targets(&self, object: &str, attribute: Option<&str>, animated_only: bool) -> HostResult<Vec<String>> {
        let obj = self.object_ref(object)?;
        match attribute {
            Some(name) => {
                if !obj.attributes.contains_key(name) {
                    return Err(HostError::AttributeNotFound(plug(object, name)));
                }
                Ok(vec![name.to_string()])
            }
            None => Ok(obj
                .attributes
                .iter()
                .filter(|(_, attr)| if animated_only { !attr.keys.is_empty() } else { attr.is_keyable() })
                .map(|(name, _)| name.clone())
                .collect()),
        }
    }

    fn evaluate_at(&mut self, time: f64) {
        for obj in self.objects.values_mut() {
            for attr in obj.attributes.values_mut() {
                if let Some(value) = attr.evaluate(time) {
                    attr.value = attr.value.with_number(value);
                }
            }
        }
    }

    fn descendants(&self, object: &str) -> Vec<String> {
        let mut found = Vec::new();
        let mut pending = vec![object.to_string()];
        while let Some(current) = pending.pop() {
            for child in self.children(&current) {
                pending.push(child.clone());
                found.push(child);
            }
        }
        found
    }
}

impl SceneHost for MemoryScene {
    fn selection(&self) -> Vec<String> {
        self.selection.clone()
    }

    fn select(&mut self, objects: &[String]) -> HostResult<()> {
        if let Some(missing) = objects.iter().find(|name| !self.objects.contains_key(*name)) {
            return Err(HostError::ObjectNotFound(missing.clone()));
        }
        self.selection = objects.to_vec();
        Ok(())
    }

    fn playback_range(&self) -> TimeRange {
        self.playback_range
    }

    fn set_playback_range(&mut self, range: TimeRange) {
        self.playback_range = range;
    }

    fn highlighted_range(&self) -> Option<TimeRange> {
        self.highlighted_range
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, time: f64) {
        self.current_time = time;
        self.evaluate_at(time);
    }

    fn object_exists(&self, object: &str) -> bool {
        self.objects.contains_key(object)
    }

    fn object_kind(&self, object: &str) -> Option<ObjectKind> {
        self.objects.get(object).map(|obj| obj.kind)
    }

    fn create_object(&mut self, name: &str, kind: ObjectKind) -> HostResult<String> {
        if self.objects.contains_key(name) {
            return Err(HostError::AlreadyExists(name.to_string()));
        }
        self.objects.insert(name.to_string(), SceneObject::new(kind));
        tracing::debug!("Created {:?} {}", kind, name);
        Ok(name.to_string())
    }

    fn duplicate(&mut self, object: &str, name: &str) -> HostResult<String> {
        if self.objects.contains_key(name) {
            return Err(HostError::AlreadyExists(name.to_string()));
        }
        let mut copy = self.object_ref(object)?.clone();
        for attr in copy.attributes.values_mut() {
            attr.keys.clear();
            attr.input = None;
        }
        self.objects.insert(name.to_string(), copy);
        Ok(name.to_string())
    }

    fn delete(&mut self, object: &str) -> HostResult<()> {
        self.object_ref(object)?;
        let mut doomed = self.descendants(object);
        doomed.push(object.to_string());

        for name in &doomed {
            self.objects.shift_remove(name);
        }
        self.selection.retain(|name| !doomed.contains(name));
        for obj in self.objects.values_mut() {
            if obj.material.as_ref().is_some_and(|m| doomed.contains(m)) {
                obj.material = None;
            }
            for attr in obj.attributes.values_mut() {
                let dangling = attr
                    .input
                    .as_ref()
                    .and_then(|src| src.split_once('.'))
                    .is_some_and(|(src_obj, _)| doomed.iter().any(|d| d == src_obj));
                if dangling {
                    attr.input = None;
                }
            }
        }
        Ok(())
    }

    fn parent(&mut self, child: &str, parent: &str) -> HostResult<()> {
        self.object_ref(parent)?;
        self.object_ref(child)?;
        if child == parent || self.descendants(child).iter().any(|d| d == parent) {
            return Err(HostError::InvalidOperation(format!(
                "Cannot parent {child} under its own descendant {parent}"
            )));
        }
        self.object_mut(child)?.parent = Some(parent.to_string());
        Ok(())
    }

    fn children(&self, object: &str) -> Vec<String> {
        self.objects
            .iter()
            .filter(|(_, obj)| obj.parent.as_deref() == Some(object))
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn assign_material(&mut self, object: &str, material: &str) -> HostResult<()> {
        if self.object_ref(material)?.kind != ObjectKind::Material {
            return Err(HostError::InvalidOperation(format!("{material} is not a material")));
        }
        self.object_mut(object)?.material = Some(material.to_string());
        Ok(())
    }

    fn match_transform(&mut self, object: &str, target: &str) -> HostResult<()> {
        let source = self.object_ref(target)?.attributes.clone();
        let obj = self.object_mut(object)?;
        for channel in TRANSFORM_CHANNELS.iter().filter(|c| !c.starts_with("scale")) {
            if let (Some(from), Some(to)) = (source.get(*channel), obj.attributes.get_mut(*channel)) {
                to.value = from.value.clone();
            }
        }
        Ok(())
    }

    fn has_attribute(&self, object: &str, attribute: &str) -> bool {
        self.objects
            .get(object)
            .is_some_and(|obj| obj.attributes.contains_key(attribute))
    }

    fn attributes(&self, object: &str) -> Vec<String> {
        self.objects
            .get(object)
            .map(|obj| obj.attributes.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn keyable_attributes(&self, object: &str) -> Vec<String> {
        self.objects
            .get(object)
            .map(|obj| {
                obj.attributes
                    .iter()
                    .filter(|(_, attr)| attr.is_keyable())
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn selected_channels(&self) -> Vec<String> {
        self.selected_channels.clone()
    }

    fn attribute(&self, object: &str, attribute: &str) -> Option<AttrValue> {
        Some(self.objects.get(object)?.attributes.get(attribute)?.value.clone())
    }

    fn set_attribute(&mut self, object: &str, attribute: &str, value: AttrValue) -> HostResult<()> {
        let attr = self.attribute_mut(object, attribute)?;
        if attr.flags.locked {
            return Err(HostError::InvalidOperation(format!(
                "{} is locked",
                plug(object, attribute)
            )));
        }
        attr.value = value;
        Ok(())
    }

    fn add_attribute(&mut self, object: &str, attribute: &str, value: AttrValue, flags: AttrFlags) -> HostResult<()> {
        let obj = self.object_mut(object)?;
        if obj.attributes.contains_key(attribute) {
            return Err(HostError::AlreadyExists(plug(object, attribute)));
        }
        obj.attributes.insert(attribute.to_string(), Attribute::new(value, flags));
        Ok(())
    }

    fn attribute_flags(&self, object: &str, attribute: &str) -> Option<AttrFlags> {
        Some(self.objects.get(object)?.attributes.get(attribute)?.flags)
    }

    fn set_attribute_flags(&mut self, object: &str, attribute: &str, flags: AttrFlags) -> HostResult<()> {
        self.attribute_mut(object, attribute)?.flags = flags;
        Ok(())
    }

    fn connect_attributes(&mut self, source: &str, destination: &str) -> HostResult<()> {
        let parse = |p: &str| {
            p.split_once('.')
                .map(|(o, a)| (o.to_string(), a.to_string()))
                .ok_or_else(|| HostError::InvalidOperation(format!("Not a plug: {p}")))
        };
        let (src_obj, src_attr) = parse(source)?;
        let (dst_obj, dst_attr) = parse(destination)?;

        let value = self
            .attribute(&src_obj, &src_attr)
            .ok_or_else(|| HostError::AttributeNotFound(source.to_string()))?;
        let attr = self.attribute_mut(&dst_obj, &dst_attr)?;
        if let Some(number) = value.as_f64() {
            attr.value = attr.value.with_number(number);
        }
        attr.input = Some(source.to_string());
        Ok(())
    }

    fn keyframe_times(&self, object: &str, attribute: Option<&str>, window: Option<(f64, f64)>) -> Vec<f64> {
        let Some(obj) = self.objects.get(object) else {
            return Vec::new();
        };
        let in_window = |time: &f64| window.map_or(true, |(min, max)| min <= *time && *time <= max);

        let times = obj
            .attributes
            .iter()
            .filter(|(name, _)| attribute.map_or(true, |wanted| wanted == name.as_str()))
            .flat_map(|(_, attr)| attr.keys.iter().map(|k| k.time))
            .filter(in_window);
        normalize_times(times)
    }

    fn set_keyframe(&mut self, object: &str, attribute: Option<&str>, time: f64, mode: KeyMode) -> HostResult<()> {
        let targets = self.key_targets(object, attribute, mode == KeyMode::Insert)?;
        for name in targets {
            let attr = self.attribute_mut(object, &name)?;
            match mode {
                KeyMode::Capture => {
                    if attr.flags.locked {
                        return Err(HostError::InvalidOperation(format!(
                            "{} is locked",
                            plug(object, &name)
                        )));
                    }
                    let value = attr.value.as_f64().ok_or_else(|| {
                        HostError::InvalidOperation(format!("{} is not keyable", plug(object, &name)))
                    })?;
                    attr.put_key(time, value);
                }
                KeyMode::Insert => {
                    // Inserting on an unanimated attribute is a no-op
                    if let Some(value) = attr.evaluate(time) {
                        attr.put_key(time, value);
                    }
                }
            }
        }
        Ok(())
    }

    fn cut_keys(&mut self, object: &str, attribute: Option<&str>, from: f64, to: f64) -> HostResult<usize> {
        let targets = self.key_targets(object, attribute, true)?;
        let mut cut = 0;
        for name in targets {
            let attr = self.attribute_mut(object, &name)?;
            let before = attr.keys.len();
            attr.keys.retain(|k| k.time < from || k.time > to);
            cut += before - attr.keys.len();
        }
        Ok(cut)
    }

    fn set_tangents(&mut self, object: &str, attribute: Option<&str>, in_tangent: Tangent, out_tangent: Tangent) -> HostResult<()> {
        let targets = self.key_targets(object, attribute, true)?;
        for name in targets {
            for key in &mut self.attribute_mut(object, &name)?.keys {
                key.in_tangent = in_tangent;
                key.out_tangent = out_tangent;
            }
        }
        Ok(())
    }

    fn create_constraint(&mut self, request: &ConstraintRequest) -> HostResult<String> {
        self.object_ref(&request.driver)?;
        let driven_animated = {
            let driven = self.object_ref(&request.driven)?;
            driven.attributes.iter().any(|(name, attr)| {
                (name.starts_with("translate") || name.starts_with("rotate")) && !attr.keys.is_empty()
            }) && !driven.attributes.contains_key("blendParent1")
        };

        let base = format!("{}_{}", request.driven, request.kind.node_type());
        let name = (1..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !self.objects.contains_key(candidate))
            .unwrap_or(base);

        let mut node = SceneObject::new(ObjectKind::Constraint);
        node.parent = Some(request.driven.clone());
        node.constraint = Some(request.clone());
        node.attributes.insert(
            format!("{}W0", request.driver),
            Attribute::new(AttrValue::Float(1.0), AttrFlags::KEYABLE),
        );
        self.objects.insert(name.clone(), node);

        // Constraining animated channels blends them through a pair blend
        if driven_animated {
            self.add_attribute(&request.driven, "blendParent1", AttrValue::Float(1.0), AttrFlags::KEYABLE)?;
        }

        tracing::debug!("Created {} driving {}", name, request.driven);
        Ok(name)
    }

    fn root_layer(&self) -> String {
        self.root_layer.clone()
    }

    fn selected_layers(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter(|(_, layer)| layer.selected)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn create_layer(&mut self, name: &str) -> HostResult<String> {
        let unique = std::iter::once(name.to_string())
            .chain((1..).map(|n| format!("{name}{n}")))
            .find(|candidate| !self.layers.contains_key(candidate))
            .unwrap_or_else(|| name.to_string());
        self.layers.insert(unique.clone(), AnimLayer::default());
        Ok(unique)
    }

    fn select_layer(&mut self, layer: &str, selected: bool) -> HostResult<()> {
        self.layer_mut(layer)?.selected = selected;
        Ok(())
    }

    fn add_layer_attributes(&mut self, layer: &str, plugs: &[String]) -> HostResult<()> {
        for p in plugs {
            let (object, attribute) = p
                .split_once('.')
                .ok_or_else(|| HostError::InvalidOperation(format!("Not a plug: {p}")))?;
            if !self.has_attribute(object, attribute) {
                return Err(HostError::AttributeNotFound(p.clone()));
            }
        }
        let layer = self.layer_mut(layer)?;
        for p in plugs {
            if !layer.plugs.contains(p) {
                layer.plugs.push(p.clone());
            }
        }
        Ok(())
    }

    fn set_layer_weight(&mut self, layer: &str, weight: f64) -> HostResult<()> {
        self.layer_mut(layer)?.weight = weight;
        Ok(())
    }

    fn set_layer_override(&mut self, layer: &str, override_mode: bool) -> HostResult<()> {
        self.layer_mut(layer)?.override_mode = override_mode;
        Ok(())
    }

    fn show_message(&mut self, message: &str) {
        tracing::info!("{}", message);
        self.messages.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> MemoryScene {
        let mut scene = MemoryScene::new(TimeRange::new(1, 24).unwrap());
        scene.create_object("ball", ObjectKind::Transform).unwrap();
        scene
    }

    #[test]
    fn test_curve_evaluation() {
        let mut scene = scene();
        scene.set_curve("ball", "translateY", &[(1.0, 0.0), (11.0, 10.0)]).unwrap();

        scene.set_current_time(6.0);
        assert_eq!(scene.attribute("ball", "translateY"), Some(AttrValue::Float(5.0)));
        scene.set_current_time(30.0);
        assert_eq!(scene.attribute("ball", "translateY"), Some(AttrValue::Float(10.0)));

        scene.set_tangents("ball", None, Tangent::Auto, Tangent::Step).unwrap();
        scene.set_current_time(6.0);
        assert_eq!(scene.attribute("ball", "translateY"), Some(AttrValue::Float(0.0)));
    }

    #[test]
    fn test_insert_keeps_curve_shape() {
        let mut scene = scene();
        scene.set_curve("ball", "translateX", &[(1.0, 0.0), (5.0, 8.0)]).unwrap();
        scene.set_keyframe("ball", None, 3.0, KeyMode::Insert).unwrap();

        let keys = scene.curve("ball", "translateX").unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[1].value, 4.0);
        // Unanimated channels are not touched by inserts
        assert!(scene.curve("ball", "translateY").unwrap().is_empty());
    }

    #[test]
    fn test_capture_keys_all_keyable() {
        let mut scene = scene();
        scene.set_attribute("ball", "rotateZ", AttrValue::Float(45.0)).unwrap();
        scene.set_keyframe("ball", None, 1.0, KeyMode::Capture).unwrap();

        assert_eq!(scene.keyframe_times("ball", None, None), vec![1.0]);
        assert_eq!(scene.curve("ball", "rotateZ").unwrap()[0].value, 45.0);
        assert!(scene.curve("ball", "displayHandle").unwrap().is_empty());
    }

    #[test]
    fn test_cut_and_query_window() {
        let mut scene = scene();
        scene.set_curve("ball", "translateX", &[(1.0, 0.0), (2.0, 1.0), (3.0, 2.0), (9.0, 3.0)]).unwrap();
        assert_eq!(scene.keyframe_times("ball", Some("translateX"), Some((2.0, 8.0))), vec![2.0, 3.0]);
        assert_eq!(scene.cut_keys("ball", None, 2.0, 3.0).unwrap(), 2);
        assert_eq!(scene.keyframe_times("ball", None, None), vec![1.0, 9.0]);
        assert!(matches!(
            scene.cut_keys("ball", Some("nope"), 0.0, 1.0),
            Err(HostError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn test_delete_removes_descendants() {
        let mut scene = scene();
        scene.create_object("grp", ObjectKind::Group).unwrap();
        scene.create_object("child", ObjectKind::Locator).unwrap();
        scene.parent("child", "grp").unwrap();
        scene.select(&["child".to_string(), "ball".to_string()]).unwrap();

        scene.delete("grp").unwrap();
        assert!(!scene.object_exists("child"));
        assert_eq!(scene.selection(), vec!["ball".to_string()]);
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let mut scene = scene();
        scene.create_object("grp", ObjectKind::Group).unwrap();
        scene.parent("ball", "grp").unwrap();
        assert!(scene.parent("grp", "ball").is_err());
    }

    #[test]
    fn test_constraint_on_animated_object_adds_blend() {
        let mut scene = scene();
        scene.create_object("loc", ObjectKind::Locator).unwrap();
        scene.set_curve("ball", "translateX", &[(1.0, 0.0)]).unwrap();

        let request = ConstraintRequest {
            kind: crate::host::ConstraintKind::Parent,
            driver: "loc".to_string(),
            driven: "ball".to_string(),
            skip: Vec::new(),
            maintain_offset: true,
        };
        let name = scene.create_constraint(&request).unwrap();
        assert_eq!(name, "ball_parentConstraint1");
        assert!(scene.has_attribute(&name, "locW0"));
        assert!(scene.has_attribute("ball", "blendParent1"));
        assert_eq!(scene.create_constraint(&request).unwrap(), "ball_parentConstraint2");
    }

    #[test]
    fn test_connections() {
        let mut scene = scene();
        scene
            .add_attribute("ball", "Attach_Cam", AttrValue::enumeration("Off:On", 1), AttrFlags::KEYABLE)
            .unwrap();
        scene.connect_attributes("ball.Attach_Cam", "ball.visibility").unwrap();
        assert_eq!(scene.connection_source("ball.visibility"), Some("ball.Attach_Cam"));
        assert!(scene.connect_attributes("ball.missing", "ball.visibility").is_err());
    }

    #[test]
    fn test_layers() {
        let mut scene = scene();
        let first = scene.create_layer("TWOS").unwrap();
        let second = scene.create_layer("TWOS").unwrap();
        assert_eq!((first.as_str(), second.as_str()), ("TWOS", "TWOS1"));

        scene.select_layer("TWOS1", true).unwrap();
        assert_eq!(scene.selected_layers(), vec!["TWOS1".to_string()]);
        scene.add_layer_attributes("TWOS1", &["ball.translateX".to_string()]).unwrap();
        assert!(scene.add_layer_attributes("TWOS1", &["ball.nope".to_string()]).is_err());
        assert_eq!(scene.layer("TWOS1").unwrap().plugs, vec!["ball.translateX".to_string()]);
    }

    #[test]
    fn test_scene_file_round_trip() {
        let mut scene = scene();
        scene.set_curve("ball", "translateX", &[(1.0, 0.0), (12.0, 3.0)]).unwrap();
        let path = std::env::temp_dir().join(format!("twosify-scene-{}.json", uuid::Uuid::new_v4()));

        scene.save(&path).unwrap();
        let loaded = MemoryScene::load(&path).unwrap();
        assert_eq!(loaded, scene);

        std::fs::remove_file(&path).unwrap();
    }
}
