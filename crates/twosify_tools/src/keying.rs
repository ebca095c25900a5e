// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stepped keying.
//!
//! Retimes the selection onto a preset's frames inside the playback range.
//! Keys are inserted before anything is cut, so the new keys sample the
//! original curves.

use crate::error::{Result, ToolError};
use crate::host::{HostResult, KeyMode, SceneHost};
use twosify_timing::{plan_sync, StepPreset, SyncPlan, TimeRange};

/// Totals of a keying or paste pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Objects visited
    pub objects: usize,
    /// Keys inserted
    pub added: usize,
    /// Keys cut
    pub removed: usize,
}

impl SyncReport {
    fn record(&mut self, plan: &SyncPlan) {
        self.added += plan.to_add.len();
        self.removed += plan.to_remove.len();
    }
}

/// Bring one channel in line with `reference` inside `[min, max]`
pub fn sync_channel(
    host: &mut dyn SceneHost,
    object: &str,
    attribute: &str,
    reference: &[f64],
    (min, max): (f64, f64),
) -> HostResult<SyncPlan> {
    let actual = host.keyframe_times(object, Some(attribute), None);
    let plan = plan_sync(reference, &actual, min, max);

    // Inserting needs a curve to sample; unanimated channels key their value
    let mode = if actual.is_empty() { KeyMode::Capture } else { KeyMode::Insert };
    for &time in &plan.to_add {
        host.set_keyframe(object, Some(attribute), time, mode)?;
    }
    for &time in &plan.to_remove {
        host.cut_keys(object, Some(attribute), time, time)?;
    }
    Ok(plan)
}

/// Attributes of an object that carry keys
pub fn animated_attributes(host: &dyn SceneHost, object: &str) -> Vec<String> {
    host.attributes(object)
        .into_iter()
        .filter(|attr| !host.keyframe_times(object, Some(attr), None).is_empty())
        .collect()
}

/// Synchronize every animated channel of `objects` to `times`.
///
/// Objects without any keys first get a key on every keyable channel at
/// `seed_time`, so they have curves to retime.
pub fn sync_objects(
    host: &mut dyn SceneHost,
    objects: &[String],
    times: &[f64],
    seed_time: f64,
    bounds: (f64, f64),
) -> Result<SyncReport> {
    let mut report = SyncReport::default();
    for object in objects {
        if host.keyframe_times(object, None, None).is_empty() {
            host.set_keyframe(object, None, seed_time, KeyMode::Capture)?;
        }
        for attribute in animated_attributes(host, object) {
            let plan = sync_channel(host, object, &attribute, times, bounds)?;
            report.record(&plan);
        }
        report.objects += 1;
    }
    Ok(report)
}

/// Key the selection on a preset over the playback range
pub fn key_on_preset(host: &mut dyn SceneHost, preset: StepPreset) -> Result<SyncReport> {
    let selection = host.selection();
    if selection.is_empty() {
        return Err(ToolError::precondition("Please select something to key."));
    }
    if let Some(missing) = selection.iter().find(|obj| !host.object_exists(obj)) {
        return Err(ToolError::precondition(format!("Object {missing} does not exist.")));
    }

    let range: TimeRange = host.playback_range();
    let frames = preset.frames(range)?.to_times();
    tracing::debug!("{} over {}: {:?}", preset.label(), range, frames);

    let report = sync_objects(host, &selection, &frames, f64::from(range.start()), range.bounds())?;
    tracing::info!(
        "{}: {} objects, +{} keys, -{} keys",
        preset.label(),
        report.objects,
        report.added,
        report.removed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ObjectKind;
    use crate::scene::MemoryScene;

    fn scene() -> MemoryScene {
        let mut scene = MemoryScene::new(TimeRange::new(1, 10).unwrap());
        scene.create_object("ball", ObjectKind::Transform).unwrap();
        scene.select(&["ball".to_string()]).unwrap();
        scene
    }

    #[test]
    fn test_threes_fours_retime() {
        let mut scene = scene();
        scene.set_curve("ball", "translateY", &[(1.0, 0.0), (2.0, 1.0), (9.0, 8.0)]).unwrap();

        let report = key_on_preset(&mut scene, StepPreset::ThreesFours).unwrap();
        assert_eq!(scene.keyframe_times("ball", Some("translateY"), None), vec![1.0, 4.0, 8.0]);
        assert_eq!(report.added, 2);
        assert_eq!(report.removed, 2);
        // Inserted keys sample the original curve
        let keys = scene.curve("ball", "translateY").unwrap();
        assert_eq!(keys[1].value, 3.0);
        assert_eq!(keys[2].value, 7.0);
    }

    #[test]
    fn test_keys_outside_range_survive() {
        let mut scene = scene();
        scene.set_curve("ball", "translateX", &[(-5.0, 1.0), (3.0, 2.0), (20.0, 3.0)]).unwrap();

        key_on_preset(&mut scene, StepPreset::Threes).unwrap();
        assert_eq!(
            scene.keyframe_times("ball", Some("translateX"), None),
            vec![-5.0, 1.0, 4.0, 7.0, 10.0, 20.0]
        );
    }

    #[test]
    fn test_twos_uses_parity_of_start() {
        let mut scene = scene();
        scene.set_playback_range(TimeRange::new(2, 9).unwrap());
        scene.set_curve("ball", "rotateY", &[(2.0, 0.0), (9.0, 90.0)]).unwrap();

        key_on_preset(&mut scene, StepPreset::Twos).unwrap();
        assert_eq!(scene.keyframe_times("ball", Some("rotateY"), None), vec![2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_unkeyed_object_gets_seeded() {
        let mut scene = scene();
        key_on_preset(&mut scene, StepPreset::TwosThrees).unwrap();
        assert_eq!(scene.keyframe_times("ball", None, None), vec![1.0, 3.0, 6.0, 8.0]);
    }

    #[test]
    fn test_keying_twice_changes_nothing() {
        let mut scene = scene();
        scene.set_curve("ball", "translateZ", &[(1.0, 0.0), (10.0, 9.0)]).unwrap();
        key_on_preset(&mut scene, StepPreset::Ones).unwrap();
        let again = key_on_preset(&mut scene, StepPreset::Ones).unwrap();
        assert_eq!((again.added, again.removed), (0, 0));
    }

    #[test]
    fn test_empty_selection_rejected() {
        let mut scene = scene();
        scene.select(&[]).unwrap();
        assert!(matches!(
            key_on_preset(&mut scene, StepPreset::Ones),
            Err(ToolError::HostPreconditionFailed(_))
        ));
    }
}
