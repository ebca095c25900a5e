// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inclusive playback ranges.

use crate::error::{Result, TimingError};
use serde::{Deserialize, Serialize};

/// An inclusive frame range, `start <= end`
///
/// Serialized as a two element array, matching the `playback_range`
/// field of key time records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[i32; 2]")]
pub struct TimeRange {
    start: i32,
    end: i32,
}

impl TimeRange {
    /// Create a range, rejecting inverted bounds
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(TimingError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Single frame range
    pub fn single(frame: i32) -> Self {
        Self { start: frame, end: frame }
    }

    /// Build a range from host time values, truncating toward zero
    pub fn from_times(start: f64, end: f64) -> Result<Self> {
        Self::new(start as i32, end as i32)
    }

    /// First frame
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Last frame (inclusive)
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of frames covered
    pub fn len(&self) -> u64 {
        (i64::from(self.end) - i64::from(self.start) + 1) as u64
    }

    /// Always false; a valid range covers at least one frame
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether a frame lies within the range
    pub fn contains(&self, frame: i32) -> bool {
        (self.start..=self.end).contains(&frame)
    }

    /// Whether a key time lies within the range
    pub fn contains_time(&self, time: f64) -> bool {
        let (min, max) = self.bounds();
        min <= time && time <= max
    }

    /// Bounds as key times
    pub fn bounds(&self) -> (f64, f64) {
        (f64::from(self.start), f64::from(self.end))
    }

    /// Iterate every frame in the range
    pub fn frames(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

impl TryFrom<[f64; 2]> for TimeRange {
    type Error = TimingError;

    fn try_from(value: [f64; 2]) -> Result<Self> {
        Self::from_times(value[0], value[1])
    }
}

impl From<TimeRange> for [i32; 2] {
    fn from(range: TimeRange) -> Self {
        [range.start, range.end]
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_rejected() {
        assert_eq!(
            TimeRange::new(10, 1),
            Err(TimingError::InvalidRange { start: 10, end: 1 })
        );
    }

    #[test]
    fn test_range_queries() {
        let range = TimeRange::new(1, 10).unwrap();
        assert_eq!(range.len(), 10);
        assert!(range.contains(1));
        assert!(range.contains(10));
        assert!(!range.contains(11));
        assert!(range.contains_time(9.5));
        assert!(!range.contains_time(10.25));
        assert_eq!(TimeRange::single(5).len(), 1);
    }

    #[test]
    fn test_from_host_times() {
        let range = TimeRange::from_times(1.0, 24.0).unwrap();
        assert_eq!((range.start(), range.end()), (1, 24));
    }

    #[test]
    fn test_serializes_as_pair() {
        let range = TimeRange::new(-5, 12).unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, "[-5,12]");
        let back: TimeRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);
        assert!(serde_json::from_str::<TimeRange>("[12,-5]").is_err());

        let from_floats: TimeRange = serde_json::from_str("[1.0, 24.0]").unwrap();
        assert_eq!(from_floats, TimeRange::new(1, 24).unwrap());
    }
}
