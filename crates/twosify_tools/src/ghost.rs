// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pose ghosting.
//!
//! A ghost is a duplicate of a target object frozen at the frame it was made
//! on. Ghosts live under one group, share one semi-transparent material and
//! carry two identification attributes: the frame they were made on and the
//! name of the object they copy.

use crate::error::{Result, ToolError};
use crate::host::{AttrFlags, AttrValue, ObjectKind, SceneHost};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use twosify_timing::{next_frame, previous_frame};

/// Ghost attribute holding the frame
pub const FRAME_ATTR: &str = "frame";
/// Ghost attribute holding the copied object's name
pub const OBJECT_ATTR: &str = "objName";

/// Transparency of a freshly created ghost material
const INITIAL_TRANSPARENCY: f64 = 0.5;

/// Pose ghoster state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostSettings {
    /// Objects to ghost
    pub targets: Vec<String>,
    /// Opacity on a 0-10 scale
    pub opacity: f64,
}

impl GhostSettings {
    /// No targets, given opacity
    pub fn new(opacity: f64) -> Self {
        Self {
            targets: Vec::new(),
            opacity: opacity.clamp(0.0, 10.0),
        }
    }

    /// Material transparency for the current opacity
    pub fn transparency(&self) -> f64 {
        1.0 - self.opacity.clamp(0.0, 10.0) / 10.0
    }
}

impl Default for GhostSettings {
    fn default() -> Self {
        Self::new(5.0)
    }
}

/// Integer frame shown by the time slider
fn current_frame(host: &dyn SceneHost) -> i32 {
    host.current_time().trunc() as i32
}

/// Name of the ghost of `target` at `frame`
pub fn ghost_name(target: &str, frame: i32) -> String {
    format!("{target}_{frame}")
}

/// Frame and source object a ghost was made from
pub fn ghost_identification(host: &dyn SceneHost, ghost: &str) -> Option<(i32, String)> {
    let frame = host.attribute(ghost, FRAME_ATTR)?.as_i64()?;
    let source = host.attribute(ghost, OBJECT_ATTR)?.as_text()?.to_string();
    Some((i32::try_from(frame).ok()?, source))
}

/// Use the selection as ghost targets
pub fn assign_ghost_targets(host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    let selection = host.selection();
    if selection.is_empty() {
        return Err(ToolError::precondition("Please select the geometry to ghost."));
    }
    tracing::info!("Ghost targets: {}", selection.join(","));
    session.ghost.targets = selection;
    Ok(())
}

fn ensure_group(host: &mut dyn SceneHost, name: &str) -> Result<()> {
    if !host.object_exists(name) {
        host.create_object(name, ObjectKind::Group)?;
    }
    Ok(())
}

fn ensure_material(host: &mut dyn SceneHost, name: &str) -> Result<()> {
    if !host.object_exists(name) {
        host.create_object(name, ObjectKind::Material)?;
        host.set_attribute(name, "transparency", AttrValue::Double3([INITIAL_TRANSPARENCY; 3]))?;
    }
    Ok(())
}

/// Duplicate every ghost target at the current frame
pub fn make_ghost_pose(host: &mut dyn SceneHost, session: &mut Session) -> Result<Vec<String>> {
    let targets = session.ghost.targets.clone();
    if targets.is_empty() {
        return Err(ToolError::precondition("No geometry assigned to ghost. Use Add Geo first."));
    }
    if let Some(missing) = targets.iter().find(|t| !host.object_exists(t)) {
        return Err(ToolError::precondition(format!("Object {missing} does not exist.")));
    }

    if let Some(tagged) = targets
        .iter()
        .find(|t| host.has_attribute(t, FRAME_ATTR) || host.has_attribute(t, OBJECT_ATTR))
    {
        return Err(ToolError::precondition(format!(
            "{tagged} already carries ghost attributes and cannot be ghosted."
        )));
    }

    let frame = current_frame(host);
    if let Some(existing) = targets.iter().map(|t| ghost_name(t, frame)).find(|g| host.object_exists(g)) {
        return Err(ToolError::precondition(format!(
            "{existing} already exists. Use Update Ghost Pose to replace it."
        )));
    }

    let group = session.config.ghost_group.clone();
    let material = session.config.ghost_material.clone();
    ensure_group(host, &group)?;
    ensure_material(host, &material)?;

    let mut ghosts = Vec::with_capacity(targets.len());
    for target in &targets {
        let ghost = host.duplicate(target, &ghost_name(target, frame))?;
        host.add_attribute(&ghost, FRAME_ATTR, AttrValue::Int(i64::from(frame)), AttrFlags::KEYABLE)?;
        host.add_attribute(&ghost, OBJECT_ATTR, AttrValue::Text(target.clone()), AttrFlags::KEYABLE)?;
        host.assign_material(&ghost, &material)?;
        host.parent(&ghost, &group)?;
        ghosts.push(ghost);
    }

    tracing::info!("Ghosted {} objects at frame {}", ghosts.len(), frame);
    Ok(ghosts)
}

/// Delete the targets' ghosts at the current frame
pub fn delete_current_ghost(host: &mut dyn SceneHost, session: &mut Session) -> Result<usize> {
    let group = &session.config.ghost_group;
    if !host.object_exists(group) {
        return Ok(0);
    }

    let frame = current_frame(host);
    let doomed: Vec<String> = host
        .children(group)
        .into_iter()
        .filter(|ghost| {
            ghost_identification(host, ghost)
                .is_some_and(|(f, source)| f == frame && session.ghost.targets.contains(&source))
        })
        .collect();

    for ghost in &doomed {
        host.delete(ghost)?;
    }
    tracing::debug!("Deleted {} ghosts at frame {}", doomed.len(), frame);
    Ok(doomed.len())
}

/// Replace the current frame's ghosts with fresh ones
pub fn update_ghost_pose(host: &mut dyn SceneHost, session: &mut Session) -> Result<Vec<String>> {
    delete_current_ghost(host, session)?;
    make_ghost_pose(host, session)
}

/// Delete the ghost group and everything in it
pub fn delete_all_ghosts(host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    let group = &session.config.ghost_group;
    if host.object_exists(group) {
        host.delete(group)?;
    }
    Ok(())
}

/// Sorted unique frames that carry ghosts
pub fn ghosted_frames(host: &dyn SceneHost, session: &Session) -> Vec<i32> {
    let group = &session.config.ghost_group;
    if !host.object_exists(group) {
        return Vec::new();
    }
    let mut frames: Vec<i32> = host
        .children(group)
        .iter()
        .filter_map(|ghost| ghost_identification(host, ghost).map(|(frame, _)| frame))
        .collect();
    frames.sort_unstable();
    frames.dedup();
    frames
}

/// Jump to the closest ghosted frame before the current one
pub fn go_to_previous_ghost(host: &mut dyn SceneHost, session: &mut Session) -> Result<Option<i32>> {
    let target = previous_frame(&ghosted_frames(host, session), current_frame(host));
    if let Some(frame) = target {
        host.set_current_time(f64::from(frame));
    }
    Ok(target)
}

/// Jump to the closest ghosted frame after the current one
pub fn go_to_next_ghost(host: &mut dyn SceneHost, session: &mut Session) -> Result<Option<i32>> {
    let target = next_frame(&ghosted_frames(host, session), current_frame(host));
    if let Some(frame) = target {
        host.set_current_time(f64::from(frame));
    }
    Ok(target)
}

/// Apply the session's opacity to the ghost material, if it exists
pub fn apply_ghost_opacity(host: &mut dyn SceneHost, session: &mut Session) -> Result<()> {
    let material = &session.config.ghost_material;
    if host.object_exists(material) {
        let t = session.ghost.transparency();
        host.set_attribute(material, "transparency", AttrValue::Double3([t; 3]))?;
    }
    Ok(())
}

/// Set the ghost opacity (0-10) and apply it
pub fn set_ghost_opacity(host: &mut dyn SceneHost, session: &mut Session, opacity: f64) -> Result<()> {
    session.ghost.opacity = opacity.clamp(0.0, 10.0);
    apply_ghost_opacity(host, session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use twosify_timing::TimeRange;

    fn setup() -> (MemoryScene, Session) {
        let mut scene = MemoryScene::new(TimeRange::new(1, 48).unwrap());
        scene.create_object("body", ObjectKind::Transform).unwrap();
        scene.create_object("head", ObjectKind::Transform).unwrap();
        scene.select(&["body".to_string(), "head".to_string()]).unwrap();
        let mut session = Session::default();
        assign_ghost_targets(&mut scene, &mut session).unwrap();
        (scene, session)
    }

    #[test]
    fn test_make_ghost_pose() {
        let (mut scene, mut session) = setup();
        scene.set_current_time(12.0);
        let ghosts = make_ghost_pose(&mut scene, &mut session).unwrap();

        assert_eq!(ghosts, vec!["body_12".to_string(), "head_12".to_string()]);
        let ghost = scene.object("head_12").unwrap();
        assert_eq!(ghost.parent.as_deref(), Some("GhostGrp"));
        assert_eq!(ghost.material.as_deref(), Some("GhostMat"));
        assert_eq!(ghost_identification(&scene, "head_12"), Some((12, "head".to_string())));
        assert_eq!(
            scene.attribute("GhostMat", "transparency"),
            Some(AttrValue::Double3([0.5; 3]))
        );
    }

    #[test]
    fn test_make_twice_on_same_frame() {
        let (mut scene, mut session) = setup();
        make_ghost_pose(&mut scene, &mut session).unwrap();
        assert!(matches!(
            make_ghost_pose(&mut scene, &mut session),
            Err(ToolError::HostPreconditionFailed(_))
        ));
        // Update replaces instead
        let ghosts = update_ghost_pose(&mut scene, &mut session).unwrap();
        assert_eq!(ghosts.len(), 2);
        assert_eq!(scene.children("GhostGrp").len(), 2);
    }

    #[test]
    fn test_make_refuses_tagged_target() {
        let (mut scene, mut session) = setup();
        scene
            .add_attribute("head", FRAME_ATTR, AttrValue::Int(3), AttrFlags::KEYABLE)
            .unwrap();
        scene.set_current_time(7.0);
        assert!(matches!(
            make_ghost_pose(&mut scene, &mut session),
            Err(ToolError::HostPreconditionFailed(_))
        ));
        assert!(!scene.object_exists("body_7"));
        assert!(!scene.object_exists("GhostGrp"));
    }

    #[test]
    fn test_make_without_targets() {
        let mut scene = MemoryScene::new(TimeRange::new(1, 10).unwrap());
        let mut session = Session::default();
        assert!(make_ghost_pose(&mut scene, &mut session).is_err());
        assert!(!scene.object_exists("GhostGrp"));
    }

    #[test]
    fn test_navigation_between_ghosts() {
        let (mut scene, mut session) = setup();
        for frame in [5.0, 10.0, 20.0] {
            scene.set_current_time(frame);
            make_ghost_pose(&mut scene, &mut session).unwrap();
        }
        assert_eq!(ghosted_frames(&scene, &session), vec![5, 10, 20]);

        scene.set_current_time(12.0);
        assert_eq!(go_to_previous_ghost(&mut scene, &mut session).unwrap(), Some(10));
        assert_eq!(go_to_previous_ghost(&mut scene, &mut session).unwrap(), Some(5));
        assert_eq!(go_to_previous_ghost(&mut scene, &mut session).unwrap(), None);
        assert_eq!(scene.current_time(), 5.0);

        assert_eq!(go_to_next_ghost(&mut scene, &mut session).unwrap(), Some(10));
        scene.set_current_time(25.0);
        assert_eq!(go_to_next_ghost(&mut scene, &mut session).unwrap(), None);
    }

    #[test]
    fn test_delete_current_and_all() {
        let (mut scene, mut session) = setup();
        scene.set_current_time(3.0);
        make_ghost_pose(&mut scene, &mut session).unwrap();
        scene.set_current_time(8.0);
        make_ghost_pose(&mut scene, &mut session).unwrap();

        // Only ghosts of current targets are removed
        session.ghost.targets = vec!["head".to_string()];
        assert_eq!(delete_current_ghost(&mut scene, &mut session).unwrap(), 1);
        assert!(scene.object_exists("body_8"));
        assert!(!scene.object_exists("head_8"));

        delete_all_ghosts(&mut scene, &mut session).unwrap();
        assert!(!scene.object_exists("GhostGrp"));
        assert!(!scene.object_exists("body_3"));
        assert!(ghosted_frames(&scene, &session).is_empty());
    }

    #[test]
    fn test_opacity() {
        let (mut scene, mut session) = setup();
        make_ghost_pose(&mut scene, &mut session).unwrap();

        set_ghost_opacity(&mut scene, &mut session, 8.0).unwrap();
        let Some(AttrValue::Double3(t)) = scene.attribute("GhostMat", "transparency") else {
            panic!("transparency should be a color");
        };
        assert!((t[0] - 0.2).abs() < 1e-9);

        set_ghost_opacity(&mut scene, &mut session, 15.0).unwrap();
        assert_eq!(session.ghost.opacity, 10.0);
        assert_eq!(
            scene.attribute("GhostMat", "transparency"),
            Some(AttrValue::Double3([0.0; 3]))
        );
    }
}
