// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised by frame pattern generation and key list parsing.

use thiserror::Error;

/// Precondition failures for timing operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    /// Range start lies after its end
    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidRange {
        /// Requested start frame
        start: i32,
        /// Requested end frame
        end: i32,
    },

    /// A pattern step is zero or negative
    #[error("Invalid pattern step: {0} (steps must be positive)")]
    InvalidStep(i32),

    /// An alternating pattern without any steps
    #[error("Alternating pattern needs at least one step")]
    EmptyPattern,

    /// A key list entry is not a number
    #[error("Invalid key list entry: {0:?}")]
    InvalidKeyList(String),
}

/// Result type for timing operations
pub type Result<T> = std::result::Result<T, TimingError>;
