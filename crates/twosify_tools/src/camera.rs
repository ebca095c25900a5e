// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera attach.
//!
//! Attaching builds a small rig under the follow camera group:
//!
//! ```text
//! FOLLOW_CAM_GRP
//! └── <master>_esn_cam_attach_NN   (constrained to the camera, Attach_Cam switch)
//!     └── Follow_Cam_Loc_NN        (keyed to the master's pose at each key time)
//! ```
//!
//! The master control is then constrained to the locator, so it rides along
//! with the camera while keeping the poses it had at the chosen key times.

use crate::error::{Result, ToolError};
use crate::host::{
    plug, AttrFlags, AttrValue, Axis, ConstraintKind, ConstraintRequest, KeyMode, ObjectKind, SceneHost, Tangent,
};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use twosify_timing::{format_key_list, normalize_times, parse_key_list};

/// Switch attribute added to the attach circle
pub const ATTACH_ATTR: &str = "Attach_Cam";
/// Blend attribute created when an animated object gets constrained
pub const BLEND_ATTR: &str = "blendParent1";

const CIRCLE_SUFFIX: &str = "esn_cam_attach";
const LOCATOR_BASE: &str = "Follow_Cam_Loc";
const CIRCLE_COLOR: i64 = 17;
const LOCATOR_COLOR: i64 = 13;
const MOTION_CHANNELS: [&str; 6] = ["translateX", "translateY", "translateZ", "rotateX", "rotateY", "rotateZ"];

/// Objects and key times the attach uses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraSetup {
    /// Camera to follow
    pub camera: Option<String>,
    /// Control that follows the camera
    pub master: Option<String>,
    /// Times at which the master's pose is held
    pub key_times: Vec<f64>,
}

impl CameraSetup {
    /// Key times as shown in the key field
    pub fn key_list(&self) -> String {
        format_key_list(&self.key_times)
    }

    /// Set key times from `"1, 5, 9"` style text
    pub fn set_key_list(&mut self, text: &str) -> twosify_timing::Result<()> {
        self.key_times = normalize_times(parse_key_list(text)?);
        Ok(())
    }
}

/// Rig created by [`attach_to_camera`]
#[derive(Debug, Clone, PartialEq)]
pub struct CameraAttachment {
    /// Attach circle
    pub circle: String,
    /// Keyed locator
    pub locator: String,
    /// Constraints from the camera to the circle
    pub camera_constraints: Vec<String>,
    /// Constraints from the locator to the master
    pub master_constraints: Vec<String>,
}

fn first_selected(host: &dyn SceneHost) -> Result<String> {
    host.selection()
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::precondition("No objects selected!"))
}

/// Use the first selected object as the camera
pub fn assign_camera(host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    let camera = first_selected(host)?;
    tracing::info!("Assigned camera: {}", camera);
    session.camera.camera = Some(camera);
    Ok(())
}

/// Use the first selected object as the master control
pub fn assign_master(host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    let master = first_selected(host)?;
    tracing::info!("Assigned master control: {}", master);
    session.camera.master = Some(master);
    Ok(())
}

/// Use the selection's key times
pub fn assign_key_times(host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    let selection = host.selection();
    if selection.is_empty() {
        return Err(ToolError::precondition("No objects selected!"));
    }
    let times = normalize_times(selection.iter().flat_map(|obj| host.keyframe_times(obj, None, None)));
    if times.is_empty() {
        return Err(ToolError::precondition("No keyframes found on selected objects."));
    }
    session.camera.key_times = times;
    tracing::info!("Found keyframe times: {}", session.camera.key_list());
    Ok(())
}

/// Axes whose `<prefix>X/Y/Z` channel is keyable and unlocked
pub fn free_axes(host: &dyn SceneHost, object: &str, prefix: &str) -> Vec<Axis> {
    Axis::ALL
        .into_iter()
        .filter(|axis| {
            host.attribute_flags(object, &format!("{prefix}{}", axis.suffix()))
                .is_some_and(|flags| flags.keyable && !flags.locked)
        })
        .collect()
}

/// Constraints that drive the free channels of `driven`.
///
/// A parent constraint when every translate and rotate axis is free,
/// otherwise a point and/or orient constraint skipping the locked axes.
pub fn plan_constraints(driver: &str, driven: &str, free_translate: &[Axis], free_rotate: &[Axis]) -> Vec<ConstraintRequest> {
    let request = |kind, free: &[Axis]| ConstraintRequest {
        kind,
        driver: driver.to_string(),
        driven: driven.to_string(),
        skip: Axis::ALL.into_iter().filter(|a| !free.contains(a)).collect(),
        maintain_offset: true,
    };

    if free_translate.len() == Axis::ALL.len() && free_rotate.len() == Axis::ALL.len() {
        return vec![request(ConstraintKind::Parent, free_translate)];
    }
    let mut plan = Vec::new();
    if !free_translate.is_empty() {
        plan.push(request(ConstraintKind::Point, free_translate));
    }
    if !free_rotate.is_empty() {
        plan.push(request(ConstraintKind::Orient, free_rotate));
    }
    plan
}

/// Constrain `driven` to `driver` on whatever channels are free
pub fn smart_constraint(host: &mut dyn SceneHost, driver: &str, driven: &str) -> Result<Vec<String>> {
    let plan = plan_constraints(
        driver,
        driven,
        &free_axes(host, driven, "translate"),
        &free_axes(host, driven, "rotate"),
    );
    if plan.is_empty() {
        return Err(ToolError::precondition(format!(
            "{driven} has no free translate or rotate channels to constrain."
        )));
    }
    plan.iter()
        .map(|request| {
            tracing::debug!("{:?} constraint {} -> {} skip {:?}", request.kind, driver, driven, request.skip);
            host.create_constraint(request).map_err(ToolError::from)
        })
        .collect()
}

/// Smart constraint whose weights follow an `Attach_Cam` switch on `driven`
fn switched_constraint(host: &mut dyn SceneHost, driver: &str, driven: &str) -> Result<Vec<String>> {
    let constraints = smart_constraint(host, driver, driven)?;
    if !host.has_attribute(driven, ATTACH_ATTR) {
        host.add_attribute(driven, ATTACH_ATTR, AttrValue::enumeration("Off:On", 1), AttrFlags::KEYABLE)?;
    }

    let switch = plug(driven, ATTACH_ATTR);
    for node in &constraints {
        let weights: Vec<String> = host
            .attributes(node)
            .into_iter()
            .filter(|attr| attr.contains("W0") || attr.contains("Weight"))
            .collect();
        for weight in weights {
            host.connect_attributes(&switch, &plug(node, &weight))?;
        }
    }
    Ok(constraints)
}

/// First free `<base>_NN` name
fn unique_name(host: &dyn SceneHost, base: &str) -> String {
    (1u32..)
        .map(|n| format!("{base}_{n:02}"))
        .find(|name| !host.object_exists(name))
        .unwrap_or_else(|| base.to_string())
}

/// Create a colored control with visibility locked and scale hidden
fn create_control(host: &mut dyn SceneHost, base: &str, kind: ObjectKind, color: i64) -> Result<String> {
    let name = unique_name(host, base);
    let name = host.create_object(&name, kind)?;
    host.set_attribute(&name, "overrideEnabled", AttrValue::Int(1))?;
    host.set_attribute(&name, "overrideColor", AttrValue::Int(color))?;
    host.set_attribute_flags(
        &name,
        "visibility",
        AttrFlags {
            keyable: false,
            locked: true,
            channel_box: false,
        },
    )?;
    for axis in Axis::ALL {
        hide_channel(host, &name, &format!("scale{}", axis.suffix()))?;
    }
    host.set_attribute(&name, "displayHandle", AttrValue::Int(1))?;
    Ok(name)
}

fn hide_channel(host: &mut dyn SceneHost, object: &str, attribute: &str) -> Result<()> {
    let locked = host.attribute_flags(object, attribute).is_some_and(|flags| flags.locked);
    host.set_attribute_flags(
        object,
        attribute,
        AttrFlags {
            keyable: false,
            locked,
            channel_box: false,
        },
    )?;
    Ok(())
}

fn ensure_follow_group(host: &mut dyn SceneHost, session: &Session) -> Result<String> {
    let group = session.config.follow_cam_group.clone();
    if !host.object_exists(&group) {
        host.create_object(&group, ObjectKind::Group)?;
        host.set_attribute(&group, "useOutlinerColor", AttrValue::Int(1))?;
        host.set_attribute(&group, "outlinerColor", AttrValue::Double3(session.config.follow_cam_color))?;
    }
    Ok(group)
}

/// Keep `master`'s poses at the setup's key times while following the camera
pub fn attach_to_camera(host: &mut dyn SceneHost, session: &mut Session) -> Result<CameraAttachment> {
    let setup = session.camera.clone();
    let camera = setup.camera.clone().ok_or_else(|| ToolError::precondition("No camera assigned!"))?;
    let master = setup.master.clone().ok_or_else(|| ToolError::precondition("No master control assigned!"))?;
    let Some(&first_key) = setup.key_times.first() else {
        return Err(ToolError::precondition("No keys time assigned!"));
    };

    if host
        .selection()
        .iter()
        .any(|obj| host.object_exists(&format!("{obj}_{CIRCLE_SUFFIX}_01")))
    {
        return Err(ToolError::precondition(
            "You have already done a setup on the selected objects. Please remove the old setup.",
        ));
    }
    for (role, obj) in [("Camera", &camera), ("Master control", &master)] {
        if !host.object_exists(obj) {
            return Err(ToolError::precondition(format!("{role} '{obj}' does not exist!")));
        }
    }

    host.set_current_time(first_key);
    tracing::info!("Attaching {} to {} at keys {}", master, camera, setup.key_list());

    let group = ensure_follow_group(host, session)?;
    let circle = create_control(host, &format!("{master}_{CIRCLE_SUFFIX}"), ObjectKind::Circle, CIRCLE_COLOR)?;
    let locator = create_control(host, LOCATOR_BASE, ObjectKind::Locator, LOCATOR_COLOR)?;
    host.parent(&locator, &circle)?;
    host.parent(&circle, &group)?;

    let camera_constraints = switched_constraint(host, &camera, &circle)?;
    for channel in MOTION_CHANNELS {
        hide_channel(host, &circle, channel)?;
    }

    let current = host.current_time();
    let keyed = key_locator(host, &locator, &master, &setup.key_times);
    host.set_current_time(current);
    keyed?;
    for channel in MOTION_CHANNELS {
        host.set_tangents(&locator, Some(channel), Tangent::Auto, Tangent::Step)?;
    }

    let master_was_keyed = !host.keyframe_times(&master, None, None).is_empty();
    if !master_was_keyed {
        tracing::debug!("{} has no keys, keying its current pose", master);
        for channel in MOTION_CHANNELS {
            host.set_keyframe(&master, Some(channel), current, KeyMode::Capture)?;
        }
    }

    let master_constraints = smart_constraint(host, &locator, &master)?;
    if host.has_attribute(&master, BLEND_ATTR) {
        if !master_was_keyed {
            host.set_attribute(&master, BLEND_ATTR, AttrValue::Float(1.0))?;
        }
        host.connect_attributes(&plug(&circle, ATTACH_ATTR), &plug(&master, BLEND_ATTR))?;
    } else {
        tracing::debug!("{} not found on {}", BLEND_ATTR, master);
    }

    tracing::info!("Attached {} to {} through {}", master, camera, circle);
    Ok(CameraAttachment {
        circle,
        locator,
        camera_constraints,
        master_constraints,
    })
}

fn key_locator(host: &mut dyn SceneHost, locator: &str, master: &str, times: &[f64]) -> Result<()> {
    for &time in times {
        host.set_current_time(time);
        host.match_transform(locator, master)?;
        for channel in MOTION_CHANNELS {
            host.set_keyframe(locator, Some(channel), time, KeyMode::Capture)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use twosify_timing::TimeRange;

    fn setup() -> (MemoryScene, Session) {
        let mut scene = MemoryScene::new(TimeRange::new(1, 24).unwrap());
        scene.create_object("cam", ObjectKind::Camera).unwrap();
        scene.create_object("hero", ObjectKind::Transform).unwrap();
        scene.set_curve("hero", "translateX", &[(1.0, 0.0), (6.0, 5.0), (12.0, 11.0)]).unwrap();

        let mut session = Session::default();
        scene.select(&["cam".to_string()]).unwrap();
        assign_camera(&mut scene, &mut session).unwrap();
        scene.select(&["hero".to_string()]).unwrap();
        assign_master(&mut scene, &mut session).unwrap();
        assign_key_times(&mut scene, &mut session).unwrap();
        (scene, session)
    }

    #[test]
    fn test_assignments() {
        let (_, session) = setup();
        assert_eq!(session.camera.camera.as_deref(), Some("cam"));
        assert_eq!(session.camera.master.as_deref(), Some("hero"));
        assert_eq!(session.camera.key_list(), "1, 6, 12");
    }

    #[test]
    fn test_key_list_text() {
        let mut setup = CameraSetup::default();
        setup.set_key_list("12, 3, ,7").unwrap();
        assert_eq!(setup.key_times, vec![3.0, 7.0, 12.0]);
        assert!(setup.set_key_list("3, soon").is_err());
    }

    #[test]
    fn test_plan_constraints() {
        let parent = plan_constraints("a", "b", &Axis::ALL, &Axis::ALL);
        assert_eq!(parent.len(), 1);
        assert_eq!(parent[0].kind, ConstraintKind::Parent);
        assert!(parent[0].skip.is_empty());

        let split = plan_constraints("a", "b", &Axis::ALL, &[Axis::Y]);
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].kind, ConstraintKind::Point);
        assert!(split[0].skip.is_empty());
        assert_eq!(split[1].kind, ConstraintKind::Orient);
        assert_eq!(split[1].skip, vec![Axis::X, Axis::Z]);

        let rotate_only = plan_constraints("a", "b", &[], &Axis::ALL);
        assert_eq!(rotate_only.len(), 1);
        assert_eq!(rotate_only[0].kind, ConstraintKind::Orient);

        assert!(plan_constraints("a", "b", &[], &[]).is_empty());
    }

    #[test]
    fn test_free_axes_skip_locked() {
        let mut scene = MemoryScene::new(TimeRange::new(1, 5).unwrap());
        scene.create_object("ctrl", ObjectKind::Transform).unwrap();
        scene
            .set_attribute_flags("ctrl", "translateY", AttrFlags { keyable: true, locked: true, channel_box: false })
            .unwrap();
        assert_eq!(free_axes(&scene, "ctrl", "translate"), vec![Axis::X, Axis::Z]);
        assert_eq!(free_axes(&scene, "ctrl", "rotate"), Axis::ALL.to_vec());
    }

    #[test]
    fn test_attach_builds_rig() {
        let (mut scene, mut session) = setup();
        let rig = attach_to_camera(&mut scene, &mut session).unwrap();

        assert_eq!(rig.circle, "hero_esn_cam_attach_01");
        assert_eq!(rig.locator, "Follow_Cam_Loc_01");
        assert_eq!(scene.object(&rig.locator).unwrap().parent.as_deref(), Some("hero_esn_cam_attach_01"));
        assert_eq!(scene.object(&rig.circle).unwrap().parent.as_deref(), Some("FOLLOW_CAM_GRP"));
        assert_eq!(scene.attribute("FOLLOW_CAM_GRP", "useOutlinerColor"), Some(AttrValue::Int(1)));
        assert_eq!(scene.attribute(&rig.circle, "overrideColor"), Some(AttrValue::Int(17)));
        assert!(scene.attribute_flags(&rig.locator, "visibility").unwrap().locked);
        assert!(!scene.attribute_flags(&rig.circle, "translateX").unwrap().keyable);

        // Camera weights follow the switch
        assert_eq!(rig.camera_constraints.len(), 1);
        let weight = plug(&rig.camera_constraints[0], "camW0");
        assert_eq!(scene.connection_source(&weight), Some("hero_esn_cam_attach_01.Attach_Cam"));

        // Locator holds the master's poses
        assert_eq!(scene.keyframe_times(&rig.locator, Some("translateX"), None), vec![1.0, 6.0, 12.0]);
        let keys = scene.curve(&rig.locator, "translateX").unwrap();
        assert_eq!(keys.iter().map(|k| k.value).collect::<Vec<_>>(), vec![0.0, 5.0, 11.0]);
        assert!(keys.iter().all(|k| k.out_tangent == Tangent::Step));
        assert_eq!(scene.current_time(), 1.0);

        assert_eq!(
            scene.connection_source("hero.blendParent1"),
            Some("hero_esn_cam_attach_01.Attach_Cam")
        );
    }

    #[test]
    fn test_attach_refuses_existing_setup() {
        let (mut scene, mut session) = setup();
        attach_to_camera(&mut scene, &mut session).unwrap();
        let err = attach_to_camera(&mut scene, &mut session).unwrap_err();
        assert!(err.to_string().starts_with("You have already done a setup"));
    }

    #[test]
    fn test_attach_unkeyed_master() {
        let (mut scene, mut session) = setup();
        scene.create_object("prop", ObjectKind::Transform).unwrap();
        scene.select(&["prop".to_string()]).unwrap();
        session.camera.master = Some("prop".to_string());
        session.camera.key_times = vec![4.0, 10.0];

        attach_to_camera(&mut scene, &mut session).unwrap();
        assert_eq!(scene.keyframe_times("prop", Some("rotateZ"), None), vec![4.0]);
        assert_eq!(scene.attribute("prop", "blendParent1"), Some(AttrValue::Float(1.0)));
        assert_eq!(scene.connection_source("prop.blendParent1"), Some("prop_esn_cam_attach_01.Attach_Cam"));
    }

    #[test]
    fn test_attach_needs_setup() {
        let mut scene = MemoryScene::new(TimeRange::new(1, 5).unwrap());
        let mut session = Session::default();
        let err = attach_to_camera(&mut scene, &mut session).unwrap_err();
        assert_eq!(err.to_string(), "No camera assigned!");

        session.camera.camera = Some("cam".to_string());
        session.camera.master = Some("hero".to_string());
        session.camera.key_times = vec![1.0];
        let err = attach_to_camera(&mut scene, &mut session).unwrap_err();
        assert_eq!(err.to_string(), "Camera 'cam' does not exist!");
    }
}
