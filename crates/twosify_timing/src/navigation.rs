// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stepping between ghosted frames.

/// Closest frame strictly before `current`
pub fn previous_frame(frames: &[i32], current: i32) -> Option<i32> {
    frames.iter().copied().filter(|&frame| frame < current).max()
}

/// Closest frame strictly after `current`
pub fn next_frame(frames: &[i32], current: i32) -> Option<i32> {
    frames.iter().copied().filter(|&frame| frame > current).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_frame() {
        let frames = [5, 10, 20];
        assert_eq!(previous_frame(&frames, 12), Some(10));
        assert_eq!(previous_frame(&frames, 10), Some(5));
        assert_eq!(previous_frame(&frames, 50), Some(20));
        assert_eq!(previous_frame(&frames, 5), None);
        assert_eq!(previous_frame(&[], 5), None);
    }

    #[test]
    fn test_next_frame() {
        let frames = [5, 10, 20];
        assert_eq!(next_frame(&frames, 0), Some(5));
        assert_eq!(next_frame(&frames, 10), Some(20));
        assert_eq!(next_frame(&frames, 20), None);
        assert_eq!(next_frame(&[], 5), None);
    }
}
