// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stepped frame patterns.
//!
//! A pattern maps a [`TimeRange`] to the frames where keys should exist
//! after retiming. "Twos" is the exception: it keeps the legacy parity
//! split of the range instead of stepping from the range start.

use crate::error::{Result, TimingError};
use crate::range::TimeRange;
use serde::{Deserialize, Serialize};

/// Sorted, deduplicated frame numbers
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<i32>", into = "Vec<i32>")]
pub struct FrameSet(Vec<i32>);

impl FrameSet {
    /// Create an empty frame set
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect frames in any order, sorting and deduplicating them
    pub fn from_frames(frames: impl IntoIterator<Item = i32>) -> Self {
        let mut frames: Vec<i32> = frames.into_iter().collect();
        frames.sort_unstable();
        frames.dedup();
        Self(frames)
    }

    /// Frames in ascending order
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    /// Iterate frames in ascending order
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    /// Whether a frame is in the set
    pub fn contains(&self, frame: i32) -> bool {
        self.0.binary_search(&frame).is_ok()
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no frames
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowest frame
    pub fn first(&self) -> Option<i32> {
        self.0.first().copied()
    }

    /// Frames as host key times
    pub fn to_times(&self) -> Vec<f64> {
        self.0.iter().map(|&frame| f64::from(frame)).collect()
    }
}

impl From<Vec<i32>> for FrameSet {
    fn from(frames: Vec<i32>) -> Self {
        Self::from_frames(frames)
    }
}

impl From<FrameSet> for Vec<i32> {
    fn from(set: FrameSet) -> Self {
        set.0
    }
}

impl FromIterator<i32> for FrameSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self::from_frames(iter)
    }
}

/// Frame stepping pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    /// Every frame
    Ones,
    /// Every `step` frames from the range start
    EveryN(i32),
    /// Cycle through the steps, e.g. `[2, 3]` for 2s-3s
    Alternating(Vec<i32>),
}

impl Pattern {
    /// Check that every step is positive
    pub fn validate(&self) -> Result<()> {
        match self {
            Pattern::Ones => Ok(()),
            Pattern::EveryN(step) => check_step(*step),
            Pattern::Alternating(steps) => {
                if steps.is_empty() {
                    return Err(TimingError::EmptyPattern);
                }
                steps.iter().try_for_each(|&step| check_step(step))
            }
        }
    }

    /// Generate the pattern's frames over a range
    pub fn frames(&self, range: TimeRange) -> Result<FrameSet> {
        generate_frames(range, self)
    }
}

fn check_step(step: i32) -> Result<()> {
    if step <= 0 {
        return Err(TimingError::InvalidStep(step));
    }
    Ok(())
}

/// Apply a pattern to a range.
///
/// The result always starts at `range.start()` and never passes
/// `range.end()`. Stepping past `i32::MAX` ends the sequence.
pub fn generate_frames(range: TimeRange, pattern: &Pattern) -> Result<FrameSet> {
    pattern.validate()?;

    let steps: &[i32] = match pattern {
        Pattern::Ones => &[1],
        Pattern::EveryN(step) => std::slice::from_ref(step),
        Pattern::Alternating(steps) => steps,
    };

    let mut frames = Vec::new();
    let mut position = range.start();
    for &step in steps.iter().cycle() {
        frames.push(position);
        match position.checked_add(step) {
            Some(next) if next <= range.end() => position = next,
            _ => break,
        }
    }

    // Steps are positive, so the frames are already strictly increasing
    Ok(FrameSet(frames))
}

/// Odd and even halves of a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParitySplit {
    /// Odd frame numbers
    pub odd: FrameSet,
    /// Even frame numbers
    pub even: FrameSet,
}

impl ParitySplit {
    /// Partition every frame of the range by parity
    pub fn of(range: TimeRange) -> Self {
        let (even, odd): (Vec<i32>, Vec<i32>) =
            range.frames().partition(|frame| frame.rem_euclid(2) == 0);
        Self {
            odd: FrameSet(odd),
            even: FrameSet(even),
        }
    }

    /// The half containing `frame`
    pub fn bucket_of(&self, frame: i32) -> &FrameSet {
        if frame.rem_euclid(2) == 0 {
            &self.even
        } else {
            &self.odd
        }
    }
}

/// Legacy "twos" frames: the parity bucket that contains the range start
pub fn parity_frames(range: TimeRange) -> FrameSet {
    ParitySplit::of(range).bucket_of(range.start()).clone()
}

/// How a keyer chooses its frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyingPolicy {
    /// Step through a pattern from the range start
    Pattern(Pattern),
    /// Keep the parity bucket of the range start
    Parity,
}

impl KeyingPolicy {
    /// Frames this policy keys over a range
    pub fn frames(&self, range: TimeRange) -> Result<FrameSet> {
        match self {
            KeyingPolicy::Pattern(pattern) => pattern.frames(range),
            KeyingPolicy::Parity => Ok(parity_frames(range)),
        }
    }
}

/// Preset keyers offered by the stepped tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepPreset {
    /// Keys on 1s
    Ones,
    /// Keys on 2s (parity based)
    Twos,
    /// Keys on 3s
    Threes,
    /// Keys alternating 2s and 3s
    TwosThrees,
    /// Keys alternating 3s and 4s
    ThreesFours,
}

impl StepPreset {
    /// Every preset, in menu order
    pub fn all() -> &'static [StepPreset] {
        &[
            StepPreset::Ones,
            StepPreset::Twos,
            StepPreset::Threes,
            StepPreset::TwosThrees,
            StepPreset::ThreesFours,
        ]
    }

    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            StepPreset::Ones => "Set Keys On 1s",
            StepPreset::Twos => "Set Keys On 2s",
            StepPreset::Threes => "Set Keys On 3s",
            StepPreset::TwosThrees => "Set Keys On 2s-3s",
            StepPreset::ThreesFours => "Set Keys On 3s-4s",
        }
    }

    /// Short name used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            StepPreset::Ones => "ones",
            StepPreset::Twos => "twos",
            StepPreset::Threes => "threes",
            StepPreset::TwosThrees => "twos-threes",
            StepPreset::ThreesFours => "threes-fours",
        }
    }

    /// Look up a preset by its short name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|preset| preset.name() == name)
    }

    /// The frame policy behind this preset
    pub fn policy(&self) -> KeyingPolicy {
        match self {
            StepPreset::Ones => KeyingPolicy::Pattern(Pattern::Ones),
            StepPreset::Twos => KeyingPolicy::Parity,
            StepPreset::Threes => KeyingPolicy::Pattern(Pattern::EveryN(3)),
            StepPreset::TwosThrees => KeyingPolicy::Pattern(Pattern::Alternating(vec![2, 3])),
            StepPreset::ThreesFours => KeyingPolicy::Pattern(Pattern::Alternating(vec![3, 4])),
        }
    }

    /// Frames this preset keys over a range
    pub fn frames(&self, range: TimeRange) -> Result<FrameSet> {
        self.policy().frames(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: i32, end: i32) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    #[test]
    fn test_ones_covers_every_frame() {
        let frames = generate_frames(range(3, 7), &Pattern::Ones).unwrap();
        assert_eq!(frames.as_slice(), &[3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_every_n_steps_from_start() {
        for (start, end, step) in [(1, 10, 3), (0, 0, 5), (-4, 9, 2), (7, 30, 7), (1, 100, 1)] {
            let frames = generate_frames(range(start, end), &Pattern::EveryN(step)).unwrap();
            assert_eq!(frames.first(), Some(start));
            assert!(frames.iter().all(|frame| frame <= end));
            for pair in frames.as_slice().windows(2) {
                assert_eq!(pair[1] - pair[0], step);
            }
            // The next step would leave the range
            let last = *frames.as_slice().last().unwrap();
            assert!(last + step > end);
        }
    }

    #[test]
    fn test_alternating_two_three_cycles() {
        let frames = generate_frames(range(1, 30), &Pattern::Alternating(vec![2, 3])).unwrap();
        let diffs: Vec<i32> = frames.as_slice().windows(2).map(|w| w[1] - w[0]).collect();
        for (i, diff) in diffs.iter().enumerate() {
            assert_eq!(*diff, if i % 2 == 0 { 2 } else { 3 });
        }
        assert_eq!(frames.as_slice()[..5], [1, 3, 6, 8, 11]);
    }

    #[test]
    fn test_three_four_scenario() {
        let frames = generate_frames(range(1, 10), &Pattern::Alternating(vec![3, 4])).unwrap();
        assert_eq!(frames.as_slice(), &[1, 4, 8]);
    }

    #[test]
    fn test_single_frame_range() {
        let single = range(5, 5);
        assert_eq!(generate_frames(single, &Pattern::Ones).unwrap().as_slice(), &[5]);
        assert_eq!(generate_frames(single, &Pattern::EveryN(3)).unwrap().as_slice(), &[5]);
        assert_eq!(
            generate_frames(single, &Pattern::Alternating(vec![3, 4])).unwrap().as_slice(),
            &[5]
        );
        assert_eq!(parity_frames(single).as_slice(), &[5]);
    }

    #[test]
    fn test_invalid_steps() {
        let r = range(1, 10);
        assert_eq!(generate_frames(r, &Pattern::EveryN(0)), Err(TimingError::InvalidStep(0)));
        assert_eq!(
            generate_frames(r, &Pattern::Alternating(vec![2, -1])),
            Err(TimingError::InvalidStep(-1))
        );
        assert_eq!(
            generate_frames(r, &Pattern::Alternating(Vec::new())),
            Err(TimingError::EmptyPattern)
        );
    }

    #[test]
    fn test_stepping_near_max_frame_stops() {
        let frames = generate_frames(range(i32::MAX - 3, i32::MAX), &Pattern::EveryN(2)).unwrap();
        assert_eq!(frames.as_slice(), &[i32::MAX - 3, i32::MAX - 1]);
    }

    #[test]
    fn test_parity_follows_range_start() {
        assert_eq!(parity_frames(range(1, 8)).as_slice(), &[1, 3, 5, 7]);
        assert_eq!(parity_frames(range(2, 9)).as_slice(), &[2, 4, 6, 8]);
        assert_eq!(parity_frames(range(-3, 2)).as_slice(), &[-3, -1, 1]);

        let split = ParitySplit::of(range(-2, 3));
        assert_eq!(split.even.as_slice(), &[-2, 0, 2]);
        assert_eq!(split.odd.as_slice(), &[-1, 1, 3]);
    }

    #[test]
    fn test_twos_preset_is_not_every_two() {
        assert_eq!(StepPreset::Twos.policy(), KeyingPolicy::Parity);
        assert_eq!(StepPreset::Twos.frames(range(2, 7)).unwrap().as_slice(), &[2, 4, 6]);
    }

    #[test]
    fn test_presets_follow_their_policy() {
        let span = range(1, 24);
        for preset in StepPreset::all() {
            assert_eq!(preset.frames(span), preset.policy().frames(span));
        }
        assert_eq!(
            StepPreset::ThreesFours.frames(range(1, 12)).unwrap().as_slice(),
            &[1, 4, 8, 11]
        );
        assert_eq!(
            KeyingPolicy::Pattern(Pattern::EveryN(0)).frames(span),
            Err(TimingError::InvalidStep(0))
        );
    }

    #[test]
    fn test_preset_names_round_trip() {
        for preset in StepPreset::all() {
            assert_eq!(StepPreset::from_name(preset.name()), Some(*preset));
        }
        assert_eq!(StepPreset::from_name("fives"), None);
    }

    #[test]
    fn test_frame_set_normalizes() {
        let set = FrameSet::from_frames([5, 1, 3, 1]);
        assert_eq!(set.as_slice(), &[1, 3, 5]);
        assert!(set.contains(3));
        assert!(!set.contains(2));
        assert_eq!(set.to_times(), vec![1.0, 3.0, 5.0]);
    }
}
