//! Error types for the navigation router.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from router operations.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Failed to initialize router: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot read location {path}: {reason}")]
    LocationRead { path: PathBuf, reason: String },

    #[error("Cannot write location {path}: {reason}")]
    LocationWrite { path: PathBuf, reason: String },

    #[error("Handler #{index} failed: {reason}")]
    HandlerFailed { index: usize, reason: String },

    #[error("Handler #{index} panicked: {reason}")]
    HandlerPanicked { index: usize, reason: String },

    #[error("No navigation link targets '{target}'")]
    UnknownTarget { target: String },

    #[error("Target '{target}' cannot name a content panel")]
    InvalidTarget { target: String },
}

impl From<notify::Error> for RouterError {
    fn from(e: notify::Error) -> Self {
        RouterError::InitFailed {
            reason: e.to_string(),
        }
    }
}
