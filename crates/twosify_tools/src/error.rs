// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool operation errors.

use crate::host::HostError;
use thiserror::Error;
use twosify_timing::{SnapshotError, TimingError};

/// Why a tool operation stopped
#[derive(Debug, Error)]
pub enum ToolError {
    /// Checked before touching the scene: nothing selected, missing object,
    /// missing attribute and the like
    #[error("{0}")]
    HostPreconditionFailed(String),

    /// Pattern or key list problem
    #[error(transparent)]
    Timing(#[from] TimingError),

    /// Snapshot could not be read or written
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// The host rejected a call
    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl ToolError {
    /// Precondition failure with a user-facing message
    pub fn precondition(message: impl Into<String>) -> Self {
        ToolError::HostPreconditionFailed(message.into())
    }
}

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;
