// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe-set synchronization.
//!
//! Given the times a channel should be keyed at and the times it is keyed
//! at now, [`plan_sync`] returns the smallest edit that makes the two agree
//! inside a bounding window. Keys outside the window are never touched.

use crate::key_times::{contains_time, normalize_times};
use serde::{Deserialize, Serialize};

/// Keys to insert and keys to cut, both ascending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Reference times missing from the channel
    pub to_add: Vec<f64>,
    /// Channel times absent from the reference
    pub to_remove: Vec<f64>,
}

impl SyncPlan {
    /// Whether the channel already matches
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Apply the plan to a list of times, as a host would
    pub fn apply_to(&self, actual: &[f64]) -> Vec<f64> {
        let removed = normalize_times(self.to_remove.iter().copied());
        normalize_times(
            actual
                .iter()
                .copied()
                .filter(|&time| !contains_time(&removed, time))
                .chain(self.to_add.iter().copied()),
        )
    }
}

/// Plan the edit that synchronizes `actual` to `reference` within
/// `[bound_min, bound_max]`.
///
/// - `to_add = reference ∩ bounds − actual`
/// - `to_remove = actual ∩ bounds − reference`
pub fn plan_sync(reference: &[f64], actual: &[f64], bound_min: f64, bound_max: f64) -> SyncPlan {
    let in_bounds = |time: &f64| bound_min <= *time && *time <= bound_max;

    let reference = normalize_times(reference.iter().copied().filter(in_bounds));
    let actual = normalize_times(actual.iter().copied().filter(in_bounds));

    let to_add = reference
        .iter()
        .copied()
        .filter(|&time| !contains_time(&actual, time))
        .collect();
    let to_remove = actual
        .iter()
        .copied()
        .filter(|&time| !contains_time(&reference, time))
        .collect();

    SyncPlan { to_add, to_remove }
}
