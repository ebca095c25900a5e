// SPDX-License-Identifier: MIT OR Apache-2.0
//! Key time normalization and the comma separated key list format.

use crate::error::{Result, TimingError};
use std::cmp::Ordering;

/// Sort and deduplicate key times.
///
/// NaN times are dropped and `-0.0` is folded into `0.0` so that equal
/// times compare equal under [`f64::total_cmp`].
pub fn normalize_times(times: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut times: Vec<f64> = times
        .into_iter()
        .filter(|time| !time.is_nan())
        .map(|time| if time == 0.0 { 0.0 } else { time })
        .collect();
    times.sort_by(f64::total_cmp);
    times.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
    times
}

/// Whether a normalized list contains `time`
pub fn contains_time(sorted: &[f64], time: f64) -> bool {
    sorted.binary_search_by(|probe| probe.total_cmp(&time)).is_ok()
}

/// Parse a key list such as `"1, 4, 8"`.
///
/// Blank entries are ignored. The times keep the order they were written in.
pub fn parse_key_list(text: &str) -> Result<Vec<f64>> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<f64>()
                .ok()
                .filter(|time| time.is_finite())
                .ok_or_else(|| TimingError::InvalidKeyList(entry.to_string()))
        })
        .collect()
}

/// Format key times as whole frames, e.g. `"1, 4, 8"`
pub fn format_key_list(times: &[f64]) -> String {
    times
        .iter()
        .map(|time| (time.trunc() as i64).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sorts_and_dedups() {
        assert_eq!(normalize_times([5.0, 1.0, 3.0, 1.0]), vec![1.0, 3.0, 5.0]);
        assert_eq!(normalize_times([f64::NAN, 2.0]), vec![2.0]);
        assert_eq!(normalize_times([-0.0, 0.0]), vec![0.0]);
        assert!(normalize_times(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_contains_time() {
        let times = normalize_times([1.0, 4.5, 8.0]);
        assert!(contains_time(&times, 4.5));
        assert!(!contains_time(&times, 4.0));
    }

    #[test]
    fn test_parse_key_list() {
        assert_eq!(parse_key_list("1, 4, 8").unwrap(), vec![1.0, 4.0, 8.0]);
        assert_eq!(parse_key_list(" 12 ,, 3.5,").unwrap(), vec![12.0, 3.5]);
        assert!(parse_key_list("").unwrap().is_empty());
        assert_eq!(
            parse_key_list("1, No keys found"),
            Err(TimingError::InvalidKeyList("No keys found".to_string()))
        );
    }

    #[test]
    fn test_format_key_list() {
        assert_eq!(format_key_list(&[1.0, 4.0, 8.6]), "1, 4, 8");
        assert_eq!(format_key_list(&[]), "");
    }
}
